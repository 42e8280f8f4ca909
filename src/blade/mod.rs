//! The poll-until-complete loop around a [`WatermarkApi`].
//!
//! One call to [`Blade::slice`] submits one video, polls its task on a fixed
//! interval and ends in exactly one of three ways: a result URL, a failure
//! reported by the service, or a timeout once the attempt budget is spent.

pub mod progress;

pub use progress::{Progress, Recorder, Silent, SliceState};

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::consts::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use crate::detect::truncate_chars;
use crate::error::SliceError;
use crate::kie::{TaskState, WatermarkApi};

#[derive(Debug, Clone, Copy)]
pub struct SliceOptions {
    pub max_attempts: u32,
    pub poll_interval: Duration,
}

impl Default for SliceOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// A finished slice.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceOutput {
    pub task_id: String,
    pub output_url: String,
    /// Set when the result was saved locally.
    pub output_path: Option<PathBuf>,
    pub cost_time_ms: Option<u64>,
}

/// A finished slice with the video held in memory.
#[derive(Debug, Clone)]
pub struct SlicedVideo {
    pub output: SliceOutput,
    pub bytes: Vec<u8>,
}

/// Watermark slicing engine.
pub struct Blade {
    api: Box<dyn WatermarkApi>,
    options: SliceOptions,
}

impl Blade {
    pub fn new(api: Box<dyn WatermarkApi>, options: SliceOptions) -> Self {
        Self { api, options }
    }

    pub fn options(&self) -> SliceOptions {
        self.options
    }

    /// Remove the watermark from `video_url`. With `output_path`, the clean
    /// video is streamed to disk; otherwise only its URL is returned.
    pub async fn slice(
        &self,
        video_url: &str,
        output_path: Option<&Path>,
        progress: &dyn Progress,
    ) -> Result<SliceOutput, SliceError> {
        let result = async {
            let mut output = self.cut(video_url, progress).await?;
            match output_path {
                Some(path) => {
                    progress
                        .update(SliceState::Downloading, "Retrieving the clean cut...")
                        .await;
                    self.api.fetch_to(&output.output_url, path).await?;
                    let saved = format!("Saved to {}", path.display());
                    progress.update(SliceState::Complete, &saved).await;
                    output.output_path = Some(path.to_path_buf());
                }
                None => {
                    progress.update(SliceState::Complete, "Slice complete.").await;
                }
            }
            Ok::<_, SliceError>(output)
        }
        .await;

        report_failure(result, progress).await
    }

    /// Remove the watermark and hand back the video bytes (for chat uploads).
    pub async fn slice_to_bytes(
        &self,
        video_url: &str,
        progress: &dyn Progress,
    ) -> Result<SlicedVideo, SliceError> {
        let result = async {
            let output = self.cut(video_url, progress).await?;
            progress
                .update(SliceState::Downloading, "Retrieving the clean cut...")
                .await;
            let bytes = self.api.fetch(&output.output_url).await?;
            progress.update(SliceState::Complete, "Slice complete.").await;
            Ok::<_, SliceError>(SlicedVideo { output, bytes })
        }
        .await;

        report_failure(result, progress).await
    }

    /// Submit and poll until the task reaches a terminal state.
    async fn cut(
        &self,
        video_url: &str,
        progress: &dyn Progress,
    ) -> Result<SliceOutput, SliceError> {
        progress
            .update(SliceState::Initializing, "Unsheathing the blade...")
            .await;
        let task_id = self.api.create_task(video_url).await?;
        progress
            .update(
                SliceState::Queued,
                &format!("Task locked: {}...", truncate_chars(&task_id, 8)),
            )
            .await;

        let max = self.options.max_attempts;
        for attempt in 1..=max {
            tokio::time::sleep(self.options.poll_interval).await;

            let record = self.api.query_task(&task_id).await?;
            debug!(task_id = %task_id, attempt, state = ?record.state, "polled task");

            match record.state {
                TaskState::Success => {
                    let output_url = record
                        .result_urls()?
                        .into_iter()
                        .next()
                        .ok_or(SliceError::NoOutput)?;
                    progress.update(SliceState::Slicing, "Watermark severed.").await;
                    return Ok(SliceOutput {
                        task_id,
                        output_url,
                        output_path: None,
                        cost_time_ms: record.cost_time,
                    });
                }
                TaskState::Fail => {
                    let msg = record
                        .fail_msg
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| "Unknown failure".to_string());
                    return Err(SliceError::Failed(msg));
                }
                TaskState::Waiting | TaskState::Queuing => {
                    progress
                        .update(
                            SliceState::Queued,
                            &format!("In queue... [{attempt}/{max}]"),
                        )
                        .await;
                }
                TaskState::Generating => {
                    progress
                        .update(
                            SliceState::Slicing,
                            &format!("Slicing... [{attempt}/{max}]"),
                        )
                        .await;
                }
                TaskState::Other(_) => {
                    progress
                        .update(
                            SliceState::Slicing,
                            &format!("Processing... [{attempt}/{max}]"),
                        )
                        .await;
                }
            }
        }

        Err(SliceError::Timeout { attempts: max })
    }
}

async fn report_failure<T>(
    result: Result<T, SliceError>,
    progress: &dyn Progress,
) -> Result<T, SliceError> {
    if let Err(e) = &result {
        warn!(error = %e, "slice failed");
        progress.update(SliceState::Failed, &e.to_string()).await;
    }
    result
}
