//! LLM client error types.

use thiserror::Error;

use ytbot_models::script::ScriptError;

pub type LlmResult<T> = Result<T, LlmError>;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: {0} not set")]
    MissingApiKey(&'static str),

    #[error("LLM API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unusable script: {0}")]
    InvalidScript(#[from] ScriptError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl LlmError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Transient failures worth retrying against the same model.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Network(_) => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(LlmError::Api { status: 503, body: String::new() }.is_retryable());
        assert!(LlmError::Api { status: 429, body: String::new() }.is_retryable());
        assert!(!LlmError::Api { status: 401, body: String::new() }.is_retryable());
        assert!(!LlmError::invalid_response("x").is_retryable());
        assert!(!LlmError::InvalidScript(ScriptError::NoScenes).is_retryable());
    }
}
