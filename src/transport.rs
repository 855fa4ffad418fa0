//! WebSocket transport backing a session.
//!
//! [`Transport`] owns the write half of the connection and serialises
//! outbound frames behind an async mutex so one message is never split by
//! another. [`FrameReader`] owns the read half and yields classified inbound
//! frames in wire order until the connection terminates or the transport is
//! closed.

use std::{
    pin::Pin,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::Mutex,
};
use tokio_tungstenite::{
    WebSocketStream,
    tungstenite::{self, Message},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::{
    error::{RpcError, TransportError},
    frame::{FrameError, InboundFrame, OutboundFrame},
    metrics::{self, Direction},
};

/// Upper bound on the close handshake so `close` cannot hang on a stuck peer.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

type WsSink = Pin<Box<dyn Sink<Message, Error = tungstenite::Error> + Send>>;
type WsSource = Pin<Box<dyn Stream<Item = Result<Message, tungstenite::Error>> + Send>>;

/// Write half of a session's connection.
pub struct Transport {
    writer: Mutex<WsSink>,
    shutdown: CancellationToken,
    close_sent: AtomicBool,
    peer: String,
}

/// Read half of a session's connection.
pub struct FrameReader {
    source: WsSource,
    shutdown: CancellationToken,
    finished: bool,
}

/// Outcome of reading a frame that did not yield an [`InboundFrame`].
#[derive(Debug)]
pub enum ReadError {
    /// The frame was rejected; the connection stays usable.
    Malformed(FrameError),
    /// The connection failed; no further frames will be produced.
    Fatal(TransportError),
}

/// Open a WebSocket connection to `url` and split it into its halves.
///
/// # Errors
///
/// Returns [`TransportError::Connect`] if the handshake fails.
pub async fn connect(url: &str) -> Result<(Transport, FrameReader), TransportError> {
    let (stream, _response) =
        tokio_tungstenite::connect_async(url)
            .await
            .map_err(|source| TransportError::Connect {
                url: url.to_owned(),
                source,
            })?;
    Ok(Transport::new(stream, url))
}

impl Transport {
    /// Wrap an established WebSocket stream.
    pub fn new<S>(stream: WebSocketStream<S>, peer: impl Into<String>) -> (Self, FrameReader)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (sink, source) = stream.split();
        let shutdown = CancellationToken::new();
        let transport = Self {
            writer: Mutex::new(Box::pin(sink)),
            shutdown: shutdown.clone(),
            close_sent: AtomicBool::new(false),
            peer: peer.into(),
        };
        let reader = FrameReader {
            source: Box::pin(source),
            shutdown,
            finished: false,
        };
        (transport, reader)
    }

    /// Address or URL of the remote end.
    #[must_use]
    pub fn peer(&self) -> &str { &self.peer }

    /// Returns true once the transport has been closed or has failed.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.shutdown.is_cancelled() }

    /// Serialize and write one complete frame.
    ///
    /// A failed write is unrecoverable: the transport is shut down so the
    /// reader observes termination. A write still waiting on the lock or on
    /// the peer when the transport closes fails with
    /// [`TransportError::Closed`].
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Transport`] if the transport is closed or the write
    /// fails, and [`RpcError::Encode`] if the frame cannot be serialized.
    pub async fn send(&self, frame: &OutboundFrame) -> Result<(), RpcError> {
        if self.is_closed() {
            return Err(TransportError::Closed.into());
        }
        let text = frame.to_text().map_err(|source| RpcError::Encode {
            method: frame.method().to_owned(),
            source,
        })?;
        // A peer that stops reading stalls the write; shutdown must still
        // release the caller.
        let write = async {
            let mut writer = self.writer.lock().await;
            writer.send(Message::text(text)).await
        };
        let written = tokio::select! {
            biased;
            () = self.shutdown.cancelled() => {
                debug!(method = frame.method(), "send abandoned by shutdown");
                return Err(TransportError::Closed.into());
            }
            written = write => written,
        };
        if let Err(e) = written {
            self.shutdown.cancel();
            return Err(map_ws_error(e).into());
        }
        metrics::inc_frames(Direction::Outbound);
        trace!(method = frame.method(), id = ?frame.id(), "frame sent");
        Ok(())
    }

    /// Release the connection.
    ///
    /// Idempotent and safe to call from any task; the reader stops yielding
    /// frames as soon as this is called.
    pub async fn close(&self) {
        self.shutdown.cancel();
        if self.close_sent.swap(true, Ordering::AcqRel) {
            return;
        }
        let handshake = async {
            let mut writer = self.writer.lock().await;
            let _ = writer.send(Message::Close(None)).await;
            let _ = writer.close().await;
        };
        if tokio::time::timeout(CLOSE_GRACE, handshake).await.is_err() {
            debug!(peer = %self.peer, "close handshake timed out");
        }
    }

    pub(crate) fn shutdown_token(&self) -> CancellationToken { self.shutdown.clone() }
}

impl FrameReader {
    /// Read the next inbound frame.
    ///
    /// Returns `None` once the connection has terminated. A
    /// [`ReadError::Malformed`] item does not end the sequence; a
    /// [`ReadError::Fatal`] item is always the last one.
    pub async fn next_frame(&mut self) -> Option<Result<InboundFrame, ReadError>> {
        if self.finished {
            return None;
        }
        loop {
            let message = tokio::select! {
                biased;
                () = self.shutdown.cancelled() => None,
                message = self.source.next() => message,
            };
            let parsed = match message {
                None => {
                    self.finished = true;
                    return None;
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return match map_ws_error(e) {
                        TransportError::Closed => None,
                        fatal => Some(Err(ReadError::Fatal(fatal))),
                    };
                }
                Some(Ok(Message::Text(text))) => InboundFrame::parse(text.as_str()),
                Some(Ok(Message::Binary(bytes))) => InboundFrame::parse_bytes(&bytes),
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "peer sent close frame");
                    self.finished = true;
                    return None;
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
            };
            metrics::inc_frames(Direction::Inbound);
            return Some(parsed.map_err(ReadError::Malformed));
        }
    }
}

fn map_ws_error(error: tungstenite::Error) -> TransportError {
    match error {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            TransportError::Closed
        }
        other => TransportError::WebSocket(other),
    }
}
