//! File management over RPC plus bulk transfer through the HTTP sidecar.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::io::{AsyncRead, AsyncWrite};

use super::MoonrakerClient;
use crate::{
    error::{Result, TransferError},
    transfer::UploadResult,
};

/// A file below one of the registered roots.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileEntry {
    /// Path relative to the root. `server.files.get_directory` reports the
    /// bare name as `filename` instead.
    #[serde(alias = "filename")]
    pub path: String,
    pub modified: f64,
    pub size: u64,
    pub permissions: String,
}

/// Metadata the server extracted from a G-code file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GcodeMetadata {
    pub filename: String,
    pub size: u64,
    pub modified: f64,
    pub print_start_time: Option<f64>,
    pub job_id: Option<String>,
    pub slicer: String,
    pub slicer_version: String,
    pub layer_height: Option<f64>,
    pub first_layer_height: Option<f64>,
    pub object_height: Option<f64>,
    pub filament_total: Option<f64>,
    pub estimated_time: Option<f64>,
    pub thumbnails: Vec<Thumbnail>,
    pub first_layer_bed_temp: Option<f64>,
    pub first_layer_extr_temp: Option<f64>,
    pub gcode_start_byte: Option<u64>,
    pub gcode_end_byte: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub size: u64,
    pub relative_path: String,
}

/// Listing of one directory.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DirectoryInfo {
    pub dirs: Vec<DirectoryEntry>,
    pub files: Vec<FileEntry>,
    pub disk_usage: DiskUsage,
    pub root_info: RootInfo,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DirectoryEntry {
    pub dirname: String,
    pub modified: f64,
    pub size: u64,
    pub permissions: String,
}

/// Disk usage in bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiskUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RootInfo {
    pub name: String,
    pub permissions: String,
}

#[derive(Serialize)]
struct Relocation<'a> {
    source: &'a str,
    dest: &'a str,
}

impl MoonrakerClient {
    /// Every file below `root` (`gcodes`, `config`, ...).
    ///
    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn list_files(&self, root: &str) -> Result<Vec<FileEntry>> {
        self.session()
            .call("server.files.list", json!({ "root": root }))
            .await
    }

    /// # Errors
    ///
    /// Returns [`crate::RpcError::Remote`] if the file has no metadata.
    pub async fn gcode_metadata(&self, filename: &str) -> Result<GcodeMetadata> {
        self.session()
            .call("server.files.metadata", json!({ "filename": filename }))
            .await
    }

    /// List `path`; `extended` adds G-code metadata to each file.
    ///
    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn directory_info(&self, path: &str, extended: bool) -> Result<DirectoryInfo> {
        self.session()
            .call(
                "server.files.get_directory",
                json!({ "path": path, "extended": extended }),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn create_directory(&self, path: &str) -> Result<()> {
        self.session()
            .call_discard("server.files.post_directory", json!({ "path": path }))
            .await
    }

    /// Delete `path`; a non-empty directory requires `force`.
    ///
    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn delete_directory(&self, path: &str, force: bool) -> Result<()> {
        self.session()
            .call_discard(
                "server.files.delete_directory",
                json!({ "path": path, "force": force }),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn move_file(&self, source: &str, dest: &str) -> Result<()> {
        self.session()
            .call_discard("server.files.move", Relocation { source, dest })
            .await
    }

    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn copy_file(&self, source: &str, dest: &str) -> Result<()> {
        self.session()
            .call_discard("server.files.copy", Relocation { source, dest })
            .await
    }

    /// Delete a file; `path` starts with its root, as in `gcodes/part.gcode`.
    ///
    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn delete_file(&self, path: &str) -> Result<()> {
        self.session()
            .call_discard("server.files.delete_file", json!({ "path": path }))
            .await
    }

    /// Download a file through the HTTP sidecar into `sink`.
    ///
    /// # Errors
    ///
    /// See [`crate::FileTransfer::download`].
    pub async fn download_file<W>(&self, filename: &str, sink: &mut W) -> Result<u64, TransferError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        self.files().download(filename, sink).await
    }

    /// Upload `reader` through the HTTP sidecar.
    ///
    /// # Errors
    ///
    /// See [`crate::FileTransfer::upload_reader`].
    pub async fn upload_file<R>(
        &self,
        filename: &str,
        reader: R,
        start_print: bool,
    ) -> Result<UploadResult, TransferError>
    where
        R: AsyncRead + Send + Sync + 'static,
    {
        self.files()
            .upload_reader(filename, reader, start_print)
            .await
    }
}
