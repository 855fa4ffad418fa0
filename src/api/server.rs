//! Moonraker server information and stores.

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;

use super::MoonrakerClient;
use crate::error::Result;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerInfo {
    pub klippy_connected: bool,
    pub klippy_state: String,
    pub components: Vec<String>,
    pub failed_components: Vec<String>,
    pub registered_directories: Vec<String>,
    pub warnings: Vec<String>,
    pub websocket_count: u32,
    pub moonraker_version: String,
    pub api_version: Vec<u32>,
    pub api_version_string: String,
}

/// Recent G-code commands and responses cached by the server.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GcodeStore {
    pub gcode_store: Vec<GcodeStoreEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GcodeStoreEntry {
    pub message: String,
    pub time: f64,
    /// `command` or `response`.
    #[serde(rename = "type")]
    pub kind: String,
}

impl MoonrakerClient {
    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn server_info(&self) -> Result<ServerInfo> {
        self.session().call("server.info", ()).await
    }

    /// Cached temperature history, keyed by sensor. The shape depends on
    /// the configured sensors, so the caller chooses it.
    ///
    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn temperature_store<T: DeserializeOwned>(&self) -> Result<T> {
        self.session().call("server.temperature_store", ()).await
    }

    /// The last `count` entries of the G-code store.
    ///
    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn gcode_store(&self, count: u32) -> Result<GcodeStore> {
        self.session()
            .call("server.gcode_store", json!({ "count": count }))
            .await
    }

    /// Restart the Moonraker service. The connection drops shortly after.
    ///
    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn restart_server(&self) -> Result<()> {
        self.session().call_discard("server.restart", ()).await
    }
}
