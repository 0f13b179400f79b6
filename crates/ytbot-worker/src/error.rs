//! Worker error types.

use std::time::Duration;

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Production failed: {0}")]
    ProductionFailed(String),

    #[error("Publish failed: {message}")]
    PublishFailed {
        message: String,
        /// HTTP status when the failure came from the upload API
        status: Option<u16>,
    },

    #[error("Topic timed out after {0:?}")]
    Timeout(Duration),

    #[error("Queue error: {0}")]
    Queue(#[from] ytbot_queue::QueueError),

    #[error("Script generation error: {0}")]
    Llm(#[from] ytbot_llm::LlmError),

    #[error("Media error: {0}")]
    Media(#[from] ytbot_media::MediaError),

    #[error("Stock footage error: {0}")]
    Stock(#[from] ytbot_stock::StockError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn production_failed(msg: impl Into<String>) -> Self {
        Self::ProductionFailed(msg.into())
    }

    pub fn publish_failed(msg: impl Into<String>, status: Option<u16>) -> Self {
        Self::PublishFailed {
            message: msg.into(),
            status,
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Llm(e) => e.is_retryable(),
            WorkerError::Media(e) => e.is_retryable(),
            WorkerError::Stock(e) => e.is_retryable(),
            WorkerError::PublishFailed { status, .. } => {
                status.map_or(true, |s| s == 429 || s >= 500)
            }
            WorkerError::Http(_) | WorkerError::Io(_) | WorkerError::Timeout(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(WorkerError::publish_failed("reset", None).is_retryable());
        assert!(WorkerError::publish_failed("busy", Some(503)).is_retryable());
        assert!(!WorkerError::publish_failed("forbidden", Some(403)).is_retryable());
        assert!(!WorkerError::config_error("bad").is_retryable());
        assert!(WorkerError::Timeout(Duration::from_secs(60)).is_retryable());
        assert!(
            WorkerError::from(ytbot_stock::StockError::download("eof")).is_retryable()
        );
        assert!(
            !WorkerError::from(ytbot_llm::LlmError::MissingApiKey("OPENROUTER_API_KEY"))
                .is_retryable()
        );
    }
}
