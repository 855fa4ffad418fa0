//! Connection registration.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::MoonrakerClient;
use crate::error::Result;

/// Identifier the server assigns to a registered connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(u64);

impl ConnectionId {
    #[must_use]
    pub const fn new(id: u64) -> Self { Self(id) }

    #[must_use]
    pub const fn as_u64(self) -> u64 { self.0 }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl From<u64> for ConnectionId {
    fn from(value: u64) -> Self { Self(value) }
}

/// How this client describes itself to the server.
///
/// `client_type` is one of Moonraker's connection types such as `web`,
/// `mobile`, `desktop`, `display`, `bot`, `agent` or `other`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClientIdentity {
    pub client_name: String,
    pub version: String,
    #[serde(rename = "type")]
    pub client_type: String,
    pub url: String,
}

impl ClientIdentity {
    #[must_use]
    pub fn new(
        client_name: impl Into<String>,
        version: impl Into<String>,
        client_type: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            client_name: client_name.into(),
            version: version.into(),
            client_type: client_type.into(),
            url: url.into(),
        }
    }
}

#[derive(Deserialize)]
struct IdentifyResponse {
    connection_id: ConnectionId,
}

impl MoonrakerClient {
    /// Register this connection with the server (`server.connection.identify`).
    ///
    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn identify(&self, identity: &ClientIdentity) -> Result<ConnectionId> {
        let response: IdentifyResponse = self
            .session()
            .call("server.connection.identify", identity)
            .await?;
        Ok(response.connection_id)
    }
}
