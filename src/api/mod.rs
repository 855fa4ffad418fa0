//! Typed façade over the Moonraker API.
//!
//! [`MoonrakerClient`] pairs a [`Session`] with a [`FileTransfer`] sidecar
//! and exposes one method per remote operation. Each method names its
//! procedure, shapes its parameters with the names Moonraker expects, and
//! decodes the result into a concrete type. Nothing here touches the wire
//! directly; every call goes through [`Session::call`].

mod connection;
mod files;
mod history;
mod job_queue;
mod machine;
mod objects;
mod printer;
mod server;

pub use connection::{ClientIdentity, ConnectionId};
pub use files::{
    DirectoryEntry,
    DirectoryInfo,
    DiskUsage,
    FileEntry,
    GcodeMetadata,
    RootInfo,
    Thumbnail,
};
pub use history::{HistoryOrder, HistoryQuery, HistoryTotals, Job, JobHistory};
pub use job_queue::{JobQueueStatus, QueuedJob};
pub use machine::{
    CpuInfo,
    Distribution,
    IpAddress,
    MachineInfo,
    MoonrakerStats,
    NetworkInterface,
    ProcStats,
    PythonInfo,
    SdInfo,
    ServiceState,
    ThrottledState,
    VersionParts,
    Virtualization,
};
pub use objects::{
    BedMesh,
    ConfigFile,
    DisplayStatus,
    Extruder,
    Fan,
    GcodeMove,
    HeaterBed,
    IdleTimeout,
    ObjectQuery,
    ObjectStatus,
    PrintStats,
    PrinterObjects,
    Toolhead,
    VirtualSdcard,
    Webhooks,
};
pub use printer::{Endstops, PrinterInfo};
pub use server::{GcodeStore, GcodeStoreEntry, ServerInfo};

use crate::{
    config::ClientConfig,
    error::ClientError,
    session::{Session, SessionBuilder},
    transfer::FileTransfer,
};

/// High-level client for one Moonraker server.
///
/// # Examples
///
/// ```no_run
/// use moonraker_rpc::{ClientConfig, MoonrakerClient, SessionBuilder};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::new("printer.local:7125");
/// let client = MoonrakerClient::connect(&config, config.session_builder()).await?;
/// let info = client.printer_info().await?;
/// println!("klipper is {}", info.state);
/// client.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct MoonrakerClient {
    session: Session,
    files: FileTransfer,
}

impl MoonrakerClient {
    /// Connect the session described by `config` using `builder`'s hooks.
    ///
    /// The builder's request timeout is used as given; use
    /// [`ClientConfig::session_builder`] to start from the configured one.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the WebSocket cannot be opened
    /// and [`ClientError::Transfer`] if the HTTP client cannot be built.
    pub async fn connect(config: &ClientConfig, builder: SessionBuilder) -> Result<Self, ClientError> {
        let files = FileTransfer::from_config(config)?;
        let session = builder.connect(&config.websocket_url()).await?;
        Ok(Self { session, files })
    }

    /// Assemble a client from an existing session and sidecar.
    #[must_use]
    pub fn from_parts(session: Session, files: FileTransfer) -> Self { Self { session, files } }

    #[must_use]
    pub fn session(&self) -> &Session { &self.session }

    #[must_use]
    pub fn files(&self) -> &FileTransfer { &self.files }

    /// Close the underlying session. Pending calls fail with a transport
    /// error.
    pub async fn close(&self) { self.session.close().await; }
}
