//! Command line interface for the `moonraker-rpc` demo binary.

use std::time::Duration;

use clap::Parser;

use moonraker_rpc::ClientConfig;

/// Command line arguments for the `moonraker-rpc` binary.
#[derive(Debug, Parser)]
#[command(
    name = "moonraker-rpc",
    version,
    about = "Connect to a Moonraker server, print its state and follow its notifications"
)]
pub struct Cli {
    /// Server address as host[:port].
    #[arg(long, default_value = "localhost:7125")]
    pub host: String,
    /// Path of the WebSocket endpoint.
    #[arg(long, default_value = moonraker_rpc::config::DEFAULT_WEBSOCKET_PATH)]
    pub path: String,
    /// Seconds to wait for each call before giving up.
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,
    /// Seconds to log notifications before disconnecting.
    #[arg(long, default_value_t = 30)]
    pub follow: u64,
    /// Client name reported to the server.
    #[arg(long, default_value = "moonraker-rpc")]
    pub name: String,
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.host.clone())
            .with_websocket_path(self.path.clone())
            .with_request_timeout(Some(Duration::from_secs(self.timeout)))
    }

    pub fn follow(&self) -> Duration { Duration::from_secs(self.follow) }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Cli;

    #[test]
    fn parses_host_and_durations() {
        let cli = Cli::parse_from(["moonraker-rpc", "--host", "printer:7125", "--follow", "5"]);
        let config = cli.client_config();
        assert_eq!(config.websocket_url(), "ws://printer:7125/websocket");
        assert_eq!(cli.follow().as_secs(), 5);
        assert_eq!(config.request_timeout.map(|t| t.as_secs()), Some(10));
    }
}
