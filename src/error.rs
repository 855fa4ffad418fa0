//! Canonical error types for the crate.
//!
//! Callers must be able to tell a rejected call apart from a dead connection
//! and from a misdeclared result shape, so each concern has its own type and
//! [`RpcError`] keeps them disjoint.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tokio_tungstenite::tungstenite;

/// Failure of the persistent connection.
///
/// Always fatal to the whole session: every pending call completes with a
/// transport error once one is observed.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The WebSocket handshake could not be completed.
    #[error("failed to connect to {url}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },
    /// The underlying WebSocket failed while in use.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    /// The session was closed, locally or by the peer.
    #[error("connection closed")]
    Closed,
}

/// Error payload returned by the server for a specific call.
///
/// Code and message are preserved exactly as received.
#[derive(Clone, Debug, PartialEq, Deserialize, thiserror::Error)]
#[error("remote error {code}: {message}")]
pub struct RemoteError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// A response payload did not match the shape the caller declared.
#[derive(Debug, thiserror::Error)]
#[error("failed to decode result of `{method}`")]
pub struct DecodeError {
    pub method: String,
    #[source]
    pub source: serde_json::Error,
}

/// Errors surfaced by [`crate::Session`] calls.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// No response arrived before the caller's deadline.
    #[error("call to `{method}` timed out after {elapsed:?}")]
    Timeout { method: String, elapsed: Duration },
    /// The call arguments could not be serialized.
    #[error("failed to encode parameters for `{method}`")]
    Encode {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

impl RpcError {
    /// Returns true if the error means the session is no longer usable.
    #[must_use]
    pub fn is_session_fatal(&self) -> bool { matches!(self, Self::Transport(_)) }

    /// Short label used for logging and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Remote(_) => "remote",
            Self::Decode(_) => "decode",
            Self::Timeout { .. } => "timeout",
            Self::Encode { .. } => "encode",
        }
    }
}

/// Errors surfaced by the HTTP file transfer sidecar.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// The request could not be sent or its body could not be read.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    /// Reading the upload source or writing the download sink failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// A URL could not be built from the base address and file name.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// Errors raised while assembling a [`crate::MoonrakerClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

/// Result alias used by session APIs.
pub type Result<T, E = RpcError> = std::result::Result<T, E>;
