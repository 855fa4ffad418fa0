#![doc(html_root_url = "https://docs.rs/moonraker_rpc/latest")]
//! Public API for the `moonraker_rpc` library.
//!
//! This crate talks to a Moonraker 3D-printer server over one persistent
//! WebSocket carrying JSON-RPC 2.0. A [`Session`] multiplexes many
//! concurrent calls over that connection and routes server-pushed
//! notifications to a handler; [`MoonrakerClient`] layers typed methods on
//! top, and [`FileTransfer`] moves file contents over plain HTTP.

pub mod api;
pub mod config;
pub mod error;
pub mod frame;
pub mod metrics;
pub mod notification;
pub mod prelude;
pub mod session;
pub mod transfer;
pub mod transport;

pub use api::MoonrakerClient;
pub use config::ClientConfig;
pub use error::{
    ClientError,
    DecodeError,
    RemoteError,
    Result,
    RpcError,
    TransferError,
    TransportError,
};
pub use frame::RequestId;
pub use metrics::{
    CALLS_TOTAL,
    Direction,
    ERRORS_TOTAL,
    FRAMES_TOTAL,
    NOTIFICATIONS_TOTAL,
    PENDING_CALLS,
};
pub use notification::{Notification, NotificationHandler};
pub use session::{Session, SessionBuilder, SessionState, TracingConfig};
pub use transfer::{FileTransfer, UploadResult};
