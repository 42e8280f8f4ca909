use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::{TaskRecord, WatermarkApi};
use crate::consts::{DEFAULT_KIE_BASE_URL, WATERMARK_MODEL};
use crate::detect::truncate_chars;
use crate::error::SliceError;

/// HTTP client for the Kie.ai jobs API.
pub struct KieClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl KieClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_KIE_BASE_URL)
    }

    /// Point the client at a different API root (e.g. a mock server).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn create_endpoint(&self) -> String {
        format!("{}/jobs/createTask", self.base_url)
    }

    fn query_endpoint(&self, task_id: &str) -> Result<Url, SliceError> {
        let mut url = Url::parse(&format!("{}/jobs/recordInfo", self.base_url))
            .map_err(|e| SliceError::Protocol(format!("invalid base URL: {e}")))?;
        url.query_pairs_mut().append_pair("taskId", task_id);
        Ok(url)
    }

    async fn get_ok(&self, url: &str) -> Result<reqwest::Response, SliceError> {
        let resp = self.http.get(url).send().await?;
        if resp.status() != StatusCode::OK {
            return Err(SliceError::Download(resp.status().as_u16()));
        }
        Ok(resp)
    }
}

#[async_trait]
impl WatermarkApi for KieClient {
    async fn create_task(&self, video_url: &str) -> Result<String, SliceError> {
        let body = CreateRequest {
            model: WATERMARK_MODEL,
            input: CreateInput { video_url },
        };

        let resp = self
            .http
            .post(self.create_endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let (status, envelope) = decode::<CreateData>(resp).await?;
        if envelope.code != Some(200) {
            return Err(SliceError::Api {
                code: envelope.code.unwrap_or_else(|| i64::from(status.as_u16())),
                message: envelope.message(),
            });
        }

        let task_id = envelope
            .data
            .and_then(|d| d.task_id)
            .ok_or_else(|| SliceError::Protocol("createTask returned no taskId".to_string()))?;

        info!(task_id = %task_id, "watermark task created");
        Ok(task_id)
    }

    async fn query_task(&self, task_id: &str) -> Result<TaskRecord, SliceError> {
        let url = self.query_endpoint(task_id)?;
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let (status, envelope) = decode::<TaskRecord>(resp).await?;
        // A missing code on a 2xx reply still counts as accepted.
        let code = envelope
            .code
            .or_else(|| (!status.is_success()).then_some(i64::from(status.as_u16())));
        if let Some(code) = code
            && code != 200
        {
            return Err(SliceError::Api {
                code,
                message: envelope.message(),
            });
        }
        Ok(envelope.data.unwrap_or_default())
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SliceError> {
        let resp = self.get_ok(url).await?;
        let bytes = resp.bytes().await?;
        debug!(bytes = bytes.len(), "fetched result");
        Ok(bytes.to_vec())
    }

    async fn fetch_to(&self, url: &str, path: &Path) -> Result<u64, SliceError> {
        let resp = self.get_ok(url).await?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(path).await?;
        let mut stream = resp.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(bytes = written, path = %path.display(), "saved result");
        Ok(written)
    }
}

/// Read a JSON envelope, mapping 429 and non-JSON error bodies to API errors.
async fn decode<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<(StatusCode, Envelope<T>), SliceError> {
    let status = resp.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(SliceError::RateLimited);
    }

    let text = resp.text().await?;
    match serde_json::from_str(&text) {
        Ok(envelope) => Ok((status, envelope)),
        Err(_) if !status.is_success() => Err(SliceError::Api {
            code: i64::from(status.as_u16()),
            message: truncate_chars(text.trim(), 200).to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

// --- API types ---

#[derive(Serialize)]
struct CreateRequest<'a> {
    model: &'a str,
    input: CreateInput<'a>,
}

#[derive(Serialize)]
struct CreateInput<'a> {
    video_url: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateData {
    task_id: Option<String>,
}

/// Every Kie.ai response is wrapped in `{code, msg, data}`.
#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn message(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.msg.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}
