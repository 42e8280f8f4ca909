use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{TaskRecord, TaskState, WatermarkApi};
use crate::error::SliceError;

/// A scripted API for tests. Returns pre-defined statuses in order and
/// serves a fixed payload for downloads.
pub struct MockApi {
    task_id: String,
    create_error: Mutex<Option<SliceError>>,
    statuses: Vec<TaskRecord>,
    index: AtomicUsize,
    payload: Vec<u8>,
}

impl MockApi {
    pub fn new(statuses: Vec<TaskRecord>) -> Self {
        Self {
            task_id: "task-0123456789".to_string(),
            create_error: Mutex::new(None),
            statuses,
            index: AtomicUsize::new(0),
            payload: b"clean video".to_vec(),
        }
    }

    /// Make `create_task` fail once with `error`.
    pub fn failing_create(error: SliceError) -> Self {
        let mock = Self::new(Vec::new());
        *mock.create_error.lock().unwrap() = Some(error);
        mock
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    /// How many status checks were made.
    pub fn queries(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }

    /// Status record in the given state.
    pub fn status(state: &str) -> TaskRecord {
        TaskRecord {
            state: TaskState::from(state),
            ..TaskRecord::default()
        }
    }

    /// A finished record pointing at `url`.
    pub fn success(url: &str, cost_time: Option<u64>) -> TaskRecord {
        TaskRecord {
            state: TaskState::Success,
            result_json: Some(serde_json::json!({ "resultUrls": [url] }).to_string()),
            cost_time,
            ..TaskRecord::default()
        }
    }

    /// A failed record with an optional reason.
    pub fn failure(msg: Option<&str>) -> TaskRecord {
        TaskRecord {
            state: TaskState::Fail,
            fail_msg: msg.map(str::to_string),
            ..TaskRecord::default()
        }
    }
}

#[async_trait]
impl WatermarkApi for MockApi {
    async fn create_task(&self, _video_url: &str) -> Result<String, SliceError> {
        if let Some(err) = self.create_error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self.task_id.clone())
    }

    async fn query_task(&self, _task_id: &str) -> Result<TaskRecord, SliceError> {
        let i = self.index.fetch_add(1, Ordering::SeqCst);
        // Past the end of the script the task just keeps running.
        Ok(self
            .statuses
            .get(i)
            .cloned()
            .unwrap_or_else(|| Self::status("generating")))
    }

    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, SliceError> {
        Ok(self.payload.clone())
    }

    async fn fetch_to(&self, _url: &str, path: &Path) -> Result<u64, SliceError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &self.payload).await?;
        Ok(self.payload.len() as u64)
    }
}
