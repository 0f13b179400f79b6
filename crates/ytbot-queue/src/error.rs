//! Queue error types.

use std::path::PathBuf;

use thiserror::Error;

use ytbot_models::TopicId;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue file is corrupt: {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Topic not found: {0}")]
    TopicNotFound(TopicId),

    #[error("Invalid topic: {0}")]
    InvalidTopic(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QueueError {
    pub fn invalid_topic(msg: impl Into<String>) -> Self {
        Self::InvalidTopic(msg.into())
    }
}
