//! Client configuration.
//!
//! [`ClientConfig`] describes where a Moonraker instance lives and how long
//! to wait for it. Both URL forms used by the client are derived from the
//! same host so the WebSocket session and the HTTP sidecar always talk to
//! the same server.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::session::SessionBuilder;

/// Default path of the Moonraker WebSocket endpoint.
pub const DEFAULT_WEBSOCKET_PATH: &str = "/websocket";

/// Connection settings for a Moonraker server.
///
/// Timeouts are expressed in (possibly fractional) seconds when
/// deserialized.
///
/// ```
/// use moonraker_rpc::ClientConfig;
///
/// let config: ClientConfig =
///     serde_json::from_str(r#"{"host": "printer.local:7125", "request_timeout": 2.5}"#)
///         .expect("valid config");
/// assert_eq!(config.websocket_url(), "ws://printer.local:7125/websocket");
/// assert_eq!(config.http_base_url(), "http://printer.local:7125");
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Host name or address, optionally with a port.
    pub host: String,
    pub websocket_path: String,
    /// Default deadline for calls; `None` waits indefinitely.
    #[serde(deserialize_with = "de_seconds")]
    pub request_timeout: Option<Duration>,
    /// Overall timeout for sidecar HTTP requests.
    #[serde(deserialize_with = "de_seconds")]
    pub http_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost:7125".to_owned(),
            websocket_path: DEFAULT_WEBSOCKET_PATH.to_owned(),
            request_timeout: None,
            http_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Configuration for `host` with every other setting at its default.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_websocket_path(mut self, path: impl Into<String>) -> Self {
        self.websocket_path = path.into();
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// `ws://{host}{websocket_path}`, inserting a leading `/` if missing.
    #[must_use]
    pub fn websocket_url(&self) -> String {
        let path = self.websocket_path.trim_start_matches('/');
        format!("ws://{}/{path}", self.host_part())
    }

    /// `http://{host}` without a trailing slash.
    #[must_use]
    pub fn http_base_url(&self) -> String { format!("http://{}", self.host_part()) }

    /// A session builder carrying this configuration's request timeout.
    #[must_use]
    pub fn session_builder(&self) -> SessionBuilder {
        SessionBuilder::new().request_timeout(self.request_timeout)
    }

    fn host_part(&self) -> &str { self.host.trim_end_matches('/') }
}

fn de_seconds<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(secs) = Option::<f64>::deserialize(deserializer)? else {
        return Ok(None);
    };
    Duration::try_from_secs_f64(secs)
        .map(Some)
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("/websocket", "ws://printer:7125/websocket")]
    #[case("websocket", "ws://printer:7125/websocket")]
    #[case("/custom/ws", "ws://printer:7125/custom/ws")]
    fn websocket_path_is_normalized(#[case] path: &str, #[case] expected: &str) {
        let config = ClientConfig::new("printer:7125").with_websocket_path(path);
        assert_eq!(config.websocket_url(), expected);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: ClientConfig = serde_json::from_str("{}").expect("empty config");
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.websocket_url(), "ws://localhost:7125/websocket");
    }

    #[test]
    fn timeouts_deserialize_from_seconds() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"request_timeout": 0.5, "http_timeout": null}"#)
                .expect("config");
        assert_eq!(config.request_timeout, Some(Duration::from_millis(500)));
        assert_eq!(config.http_timeout, None);
    }

    #[test]
    fn negative_timeout_is_rejected() {
        let result = serde_json::from_str::<ClientConfig>(r#"{"request_timeout": -1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn trailing_slash_in_host_is_ignored() {
        let config = ClientConfig::new("printer.local/");
        assert_eq!(config.http_base_url(), "http://printer.local");
    }
}
