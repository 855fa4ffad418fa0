//! Print job history.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{GcodeMetadata, MoonrakerClient};
use crate::error::Result;

/// Sort order for history listings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryOrder {
    Asc,
    #[default]
    Desc,
}

/// Filter for `server.history.list`. Unset fields use the server's
/// defaults.
///
/// ```
/// use moonraker_rpc::api::{HistoryOrder, HistoryQuery};
///
/// let query = HistoryQuery::default().limit(10).order(HistoryOrder::Asc);
/// assert_eq!(
///     serde_json::to_string(&query).expect("serialize"),
///     r#"{"limit":10,"order":"asc"}"#
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HistoryQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    since: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    before: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<HistoryOrder>,
}

impl HistoryQuery {
    /// Maximum number of jobs to return.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Number of jobs to skip.
    #[must_use]
    pub fn start(mut self, start: u32) -> Self {
        self.start = Some(start);
        self
    }

    /// Only jobs started after this Unix timestamp.
    #[must_use]
    pub fn since(mut self, timestamp: f64) -> Self {
        self.since = Some(timestamp);
        self
    }

    /// Only jobs started before this Unix timestamp.
    #[must_use]
    pub fn before(mut self, timestamp: f64) -> Self {
        self.before = Some(timestamp);
        self
    }

    #[must_use]
    pub fn order(mut self, order: HistoryOrder) -> Self {
        self.order = Some(order);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct JobHistory {
    pub count: u32,
    pub jobs: Vec<Job>,
}

/// One recorded print job.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Job {
    pub job_id: String,
    /// False once the G-code file has been deleted.
    pub exists: bool,
    pub end_time: Option<f64>,
    pub filament_used: f64,
    pub filename: String,
    pub metadata: GcodeMetadata,
    pub print_duration: f64,
    pub status: String,
    pub start_time: f64,
    pub total_duration: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HistoryTotals {
    pub total_jobs: u32,
    pub total_time: f64,
    pub total_print_time: f64,
    pub total_filament_used: f64,
    pub longest_job: f64,
    pub longest_print: f64,
}

#[derive(Deserialize)]
struct TotalsResponse {
    job_totals: HistoryTotals,
}

#[derive(Deserialize)]
struct SingleJob {
    job: Job,
}

#[derive(Deserialize)]
struct DeletedJobs {
    deleted_jobs: Vec<String>,
}

impl MoonrakerClient {
    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn job_history(&self, query: &HistoryQuery) -> Result<JobHistory> {
        self.session().call("server.history.list", query).await
    }

    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn job_history_totals(&self) -> Result<HistoryTotals> {
        let response: TotalsResponse = self.session().call("server.history.totals", ()).await?;
        Ok(response.job_totals)
    }

    /// # Errors
    ///
    /// Returns any [`crate::RpcError`] raised by the call.
    pub async fn reset_job_history_totals(&self) -> Result<()> {
        self.session()
            .call_discard("server.history.reset_totals", ())
            .await
    }

    /// # Errors
    ///
    /// Returns [`crate::RpcError::Remote`] if no job has this id.
    pub async fn job_history_get(&self, uid: &str) -> Result<Job> {
        let response: SingleJob = self
            .session()
            .call("server.history.get_job", json!({ "uid": uid }))
            .await?;
        Ok(response.job)
    }

    /// Remove a job from the history; returns the ids actually deleted.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RpcError::Remote`] if no job has this id.
    pub async fn job_history_delete(&self, uid: &str) -> Result<Vec<String>> {
        let response: DeletedJobs = self
            .session()
            .call("server.history.delete_job", json!({ "uid": uid }))
            .await?;
        Ok(response.deleted_jobs)
    }
}
