//! Optional convenience imports for common client workflows.
//!
//! Only the high-frequency types live here. Import response shapes from
//! [`crate::api`] directly.
//!
//! # Examples
//!
//! ```rust,no_run
//! use moonraker_rpc::prelude::*;
//!
//! async fn version(client: &MoonrakerClient) -> Result<String> {
//!     Ok(client.server_info().await?.moonraker_version)
//! }
//! ```

pub use crate::{
    api::MoonrakerClient,
    config::ClientConfig,
    error::{Result, RpcError},
    notification::Notification,
    session::{Session, SessionBuilder},
    transfer::FileTransfer,
};
