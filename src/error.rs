//! Errors surfaced by the slicing pipeline.

/// Everything that can go wrong between submitting a URL and holding the
/// clean video.
#[derive(Debug, thiserror::Error)]
pub enum SliceError {
    #[error("rate limited, the blade needs rest")]
    RateLimited,
    #[error("API error ({code}): {message}")]
    Api { code: i64, message: String },
    #[error("unexpected API response: {0}")]
    Protocol(String),
    #[error("processing failed: {0}")]
    Failed(String),
    #[error("no output URL in response")]
    NoOutput,
    #[error("timed out after {attempts} status checks")]
    Timeout { attempts: u32 },
    #[error("download failed: HTTP {0}")]
    Download(u16),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_carries_code_and_message() {
        let err = SliceError::Api {
            code: 401,
            message: "invalid key".to_string(),
        };
        assert_eq!(err.to_string(), "API error (401): invalid key");
    }

    #[test]
    fn timeout_mentions_attempts() {
        let err = SliceError::Timeout { attempts: 60 };
        assert!(err.to_string().contains("60"));
    }

    #[test]
    fn io_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err: SliceError = io.into();
        assert!(matches!(err, SliceError::Io(_)));
    }
}
