//! Stock footage error types.

use thiserror::Error;

pub type StockResult<T> = Result<T, StockError>;

#[derive(Debug, Error)]
pub enum StockError {
    #[error("Missing API key: {0} not set")]
    MissingApiKey(&'static str),

    #[error("Stock API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("No footage found for \"{0}\"")]
    NoResults(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StockError {
    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            StockError::Network(_) | StockError::Download(_) | StockError::Io(_) => true,
            StockError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(StockError::Api { status: 429, body: String::new() }.is_retryable());
        assert!(StockError::download("connection reset").is_retryable());
        assert!(!StockError::Api { status: 403, body: String::new() }.is_retryable());
        assert!(!StockError::NoResults("cats".to_string()).is_retryable());
        assert!(!StockError::MissingApiKey("PEXELS_API_KEY").is_retryable());
    }
}
