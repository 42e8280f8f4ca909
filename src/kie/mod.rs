pub mod client;
pub mod mock;

pub use client::KieClient;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

use crate::error::SliceError;

/// Lifecycle state reported by the task status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TaskState {
    Waiting,
    Queuing,
    Generating,
    Success,
    Fail,
    /// Anything the API adds later. Treated as still running.
    Other(String),
}

impl From<String> for TaskState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "waiting" => Self::Waiting,
            "queuing" => Self::Queuing,
            "generating" => Self::Generating,
            "success" => Self::Success,
            "fail" => Self::Fail,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for TaskState {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl Default for TaskState {
    fn default() -> Self {
        Self::Other("unknown".to_string())
    }
}

/// The `data` object of a status response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default, deserialize_with = "state_or_unknown")]
    pub state: TaskState,
    /// JSON-encoded string: `{"resultUrls": [...]}`.
    #[serde(default)]
    pub result_json: Option<String>,
    #[serde(default)]
    pub fail_msg: Option<String>,
    #[serde(default)]
    pub cost_time: Option<u64>,
}

// `"state": null` reads the same as a missing state.
fn state_or_unknown<'de, D>(deserializer: D) -> Result<TaskState, D::Error>
where
    D: Deserializer<'de>,
{
    let state: Option<String> = Option::deserialize(deserializer)?;
    Ok(state.map(TaskState::from).unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultPayload {
    #[serde(default)]
    result_urls: Vec<String>,
}

impl TaskRecord {
    /// Decode the output URLs from the embedded `resultJson` string.
    pub fn result_urls(&self) -> Result<Vec<String>, SliceError> {
        let raw = match self.result_json.as_deref() {
            Some(s) if !s.trim().is_empty() => s,
            _ => return Ok(Vec::new()),
        };
        let payload: ResultPayload = serde_json::from_str(raw)?;
        Ok(payload.result_urls)
    }
}

/// The watermark-removal service. [`KieClient`] talks HTTP,
/// [`mock::MockApi`] replays a script for tests.
#[async_trait]
pub trait WatermarkApi: Send + Sync {
    /// Submit a video, returning the task id.
    async fn create_task(&self, video_url: &str) -> Result<String, SliceError>;

    /// Fetch the current status of a task.
    async fn query_task(&self, task_id: &str) -> Result<TaskRecord, SliceError>;

    /// Download a result into memory.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SliceError>;

    /// Download a result to `path`, creating parent directories.
    /// Returns the number of bytes written.
    async fn fetch_to(&self, url: &str, path: &Path) -> Result<u64, SliceError>;
}
