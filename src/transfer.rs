//! HTTP sidecar for bulk file transfer.
//!
//! Moonraker moves file contents over plain HTTP rather than the RPC
//! channel. [`FileTransfer`] shares nothing with a [`crate::Session`] except
//! the server address, so transfers never block calls.

use futures::StreamExt;
use reqwest::{
    Body,
    Client,
    Response,
    Url,
    multipart::{Form, Part},
};
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::{config::ClientConfig, error::TransferError};

const FILES_PATH: &str = "server/files";
const UPLOAD_PATH: &str = "server/files/upload";

/// File entry reported by the server after an upload.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UploadedItem {
    pub path: String,
    pub root: String,
    pub modified: Option<f64>,
    pub size: Option<u64>,
    pub permissions: Option<String>,
}

/// Body of a successful upload response.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UploadResult {
    pub item: UploadedItem,
    pub print_started: bool,
    pub print_queued: bool,
    pub action: Option<String>,
}

/// Client for the upload and download endpoints.
#[derive(Clone, Debug)]
pub struct FileTransfer {
    client: Client,
    base: Url,
}

impl FileTransfer {
    /// Use `client` against the server at `base_url`, e.g.
    /// `http://printer.local:7125`.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidUrl`] if `base_url` cannot be parsed
    /// or cannot carry a path.
    pub fn new(client: Client, base_url: &str) -> Result<Self, TransferError> {
        let base = Url::parse(base_url)
            .map_err(|e| TransferError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(TransferError::InvalidUrl(base_url.to_owned()));
        }
        Ok(Self { client, base })
    }

    /// Build a client from `config`, applying its HTTP timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Http`] if the HTTP client cannot be built and
    /// [`TransferError::InvalidUrl`] if the host is not a valid authority.
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransferError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        Self::new(builder.build()?, &config.http_base_url())
    }

    #[must_use]
    pub fn base_url(&self) -> &Url { &self.base }

    /// Stream `filename` from the server into `sink`.
    ///
    /// `filename` is relative to the files endpoint and normally starts with
    /// its root, as in `gcodes/part.gcode`. Each segment is escaped
    /// separately. Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Status`] for a non-success response,
    /// [`TransferError::Http`] if the body stream fails and
    /// [`TransferError::Io`] if writing to `sink` fails.
    pub async fn download<W>(&self, filename: &str, sink: &mut W) -> Result<u64, TransferError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let url = self.file_url(filename)?;
        debug!(%url, "downloading file");
        let response = check_status(self.client.get(url).send().await?).await?;
        let mut body = response.bytes_stream();
        let mut written = 0_u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        sink.flush().await?;
        info!(filename, bytes = written, "download finished");
        Ok(written)
    }

    /// Upload `body` as `filename`, optionally starting a print of it.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Status`] for a non-success response and
    /// [`TransferError::Http`] if the request fails or the response cannot
    /// be decoded.
    pub async fn upload(
        &self,
        filename: &str,
        body: impl Into<Body>,
        start_print: bool,
    ) -> Result<UploadResult, TransferError> {
        let part = Part::stream(body).file_name(filename.to_owned());
        self.send_upload(filename, part, start_print).await
    }

    /// Upload the contents of `reader` as `filename` without buffering it.
    ///
    /// # Errors
    ///
    /// As [`FileTransfer::upload`]; a read failure surfaces as
    /// [`TransferError::Http`] once the request body stream fails.
    pub async fn upload_reader<R>(
        &self,
        filename: &str,
        reader: R,
        start_print: bool,
    ) -> Result<UploadResult, TransferError>
    where
        R: AsyncRead + Send + Sync + 'static,
    {
        let body = Body::wrap_stream(ReaderStream::new(reader));
        self.upload(filename, body, start_print).await
    }

    async fn send_upload(
        &self,
        filename: &str,
        part: Part,
        start_print: bool,
    ) -> Result<UploadResult, TransferError> {
        let url = self.endpoint(UPLOAD_PATH.split('/'))?;
        let form = Form::new()
            .part("file", part)
            .text("print", if start_print { "true" } else { "false" });
        debug!(%url, filename, start_print, "uploading file");
        let response = check_status(self.client.post(url).multipart(form).send().await?).await?;
        let result: UploadResult = response.json().await?;
        info!(
            filename,
            print_started = result.print_started,
            "upload finished"
        );
        Ok(result)
    }

    fn file_url(&self, filename: &str) -> Result<Url, TransferError> {
        let segments = filename.split('/').filter(|s| !s.is_empty());
        self.endpoint(FILES_PATH.split('/').chain(segments))
    }

    fn endpoint<'a>(&self, segments: impl Iterator<Item = &'a str>) -> Result<Url, TransferError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| TransferError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn check_status(response: Response) -> Result<Response, TransferError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransferError::Status { status, body })
}
