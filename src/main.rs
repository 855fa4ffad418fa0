//! Demo binary for `moonraker_rpc`.
//!
//! Connects, identifies, prints printer and server state, then logs
//! notifications until the follow period ends or the server disconnects.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use moonraker_rpc::{MoonrakerClient, api::ClientIdentity};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();
    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "moonraker-rpc failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &cli::Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.client_config();
    let builder = config
        .session_builder()
        .on_notification(|notification| async move {
            info!(
                method = notification.method(),
                params = %notification.params(),
                "notification"
            );
        });
    let client = MoonrakerClient::connect(&config, builder).await?;

    let identity = ClientIdentity::new(
        cli.name.clone(),
        env!("CARGO_PKG_VERSION"),
        "other",
        "https://github.com/Arksine/moonraker",
    );
    let connection_id = client.identify(&identity).await?;
    info!(%connection_id, "identified");

    let server = client.server_info().await?;
    println!(
        "moonraker {} (api {}), klippy {}",
        server.moonraker_version, server.api_version_string, server.klippy_state
    );
    match client.printer_info().await {
        Ok(printer) => println!("printer {}: {}", printer.hostname, printer.state_message),
        Err(e) => println!("printer unavailable: {e}"),
    }

    tokio::select! {
        () = tokio::time::sleep(cli.follow()) => {}
        () = client.session().closed() => info!("server closed the connection"),
    }
    client.close().await;
    Ok(())
}
