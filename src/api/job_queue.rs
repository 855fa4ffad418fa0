//! Job queue management.
//!
//! Every operation answers with the resulting queue, so callers never need
//! a follow-up status call.

use serde::Deserialize;
use serde_json::json;

use super::MoonrakerClient;
use crate::error::Result;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct JobQueueStatus {
    pub queued_jobs: Vec<QueuedJob>,
    /// `ready`, `loading`, `starting` or `paused`.
    pub queue_state: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct QueuedJob {
    pub filename: String,
    pub job_id: String,
    pub time_added: f64,
    pub time_in_queue: f64,
}

impl MoonrakerClient {
    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn job_queue_status(&self) -> Result<JobQueueStatus> {
        self.session().call("server.job_queue.status", ()).await
    }

    /// Append `filenames` to the queue.
    ///
    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn queue_jobs<S: AsRef<str>>(&self, filenames: &[S]) -> Result<JobQueueStatus> {
        let filenames: Vec<&str> = filenames.iter().map(AsRef::as_ref).collect();
        self.session()
            .call(
                "server.job_queue.post_job",
                json!({ "filenames": filenames }),
            )
            .await
    }

    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn delete_queued_jobs<S: AsRef<str>>(&self, job_ids: &[S]) -> Result<JobQueueStatus> {
        let job_ids: Vec<&str> = job_ids.iter().map(AsRef::as_ref).collect();
        self.session()
            .call("server.job_queue.delete_job", json!({ "job_ids": job_ids }))
            .await
    }

    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn pause_job_queue(&self) -> Result<JobQueueStatus> {
        self.session().call("server.job_queue.pause", ()).await
    }

    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn start_job_queue(&self) -> Result<JobQueueStatus> {
        self.session().call("server.job_queue.start", ()).await
    }
}
