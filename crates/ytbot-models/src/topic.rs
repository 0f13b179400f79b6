//! Queue topic and completion history models.

use chrono::{DateTime, Local, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format of `completion_timestamp` in the history log.
pub const COMPLETION_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Identifier of a topic in the queue file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct TopicId(pub u64);

impl TopicId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TopicId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Topic state in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TopicStatus {
    /// Waiting to be produced
    #[default]
    Pending,
    /// Claimed by a running worker
    Processing,
    /// Produced and published
    Completed,
    /// Gave up after too many attempts
    Failed,
}

impl TopicStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicStatus::Pending => "pending",
            TopicStatus::Processing => "processing",
            TopicStatus::Completed => "completed",
            TopicStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TopicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A topic record in `queue.json`.
///
/// Only `id`, `content` and `status` are required so hand-written queue
/// files load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Topic {
    pub id: TopicId,

    /// Free-text subject of the video
    pub content: String,

    #[serde(default)]
    pub status: TopicStatus,

    /// Failed production attempts so far
    #[serde(default)]
    pub attempts: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Topic {
    /// Create a new pending topic.
    pub fn new(id: impl Into<TopicId>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            status: TopicStatus::Pending,
            attempts: 0,
            last_error: None,
            updated_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TopicStatus::Pending
    }

    /// Move to a new status and stamp `updated_at`.
    pub fn transition(&mut self, status: TopicStatus) {
        self.status = status;
        self.updated_at = Some(Utc::now());
    }
}

/// An entry in `completed.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CompletionRecord {
    pub topic_id: TopicId,
    /// Local time, `%Y-%m-%d %H:%M:%S`
    pub completion_timestamp: String,
    pub youtube_url: String,
    pub status: String,
}

impl CompletionRecord {
    /// Create a successful completion record stamped with the current local time.
    pub fn success(topic_id: TopicId, video_url: impl Into<String>) -> Self {
        Self {
            topic_id,
            completion_timestamp: Local::now().format(COMPLETION_TIMESTAMP_FORMAT).to_string(),
            youtube_url: video_url.into(),
            status: "success".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_topic_deserializes() {
        let topic: Topic =
            serde_json::from_str(r#"{"id": 7, "content": "Black holes", "status": "pending"}"#)
                .unwrap();
        assert_eq!(topic.id, TopicId(7));
        assert!(topic.is_pending());
        assert_eq!(topic.attempts, 0);
        assert!(topic.last_error.is_none());
    }

    #[test]
    fn test_topic_serialization_skips_empty_fields() {
        let json = serde_json::to_value(Topic::new(TopicId(1), "Tides")).unwrap();
        assert_eq!(json["status"], "pending");
        assert!(json.get("last_error").is_none());
        assert!(json.get("updated_at").is_none());
    }

    #[test]
    fn test_transition_stamps_time() {
        let mut topic = Topic::new(TopicId(3), "Volcanoes");
        topic.transition(TopicStatus::Processing);
        assert_eq!(topic.status, TopicStatus::Processing);
        assert!(topic.updated_at.is_some());
    }

    #[test]
    fn test_completion_record_format() {
        let record = CompletionRecord::success(TopicId(4), "https://youtube.com/watch?v=abc");
        assert_eq!(record.status, "success");
        assert!(
            chrono::NaiveDateTime::parse_from_str(
                &record.completion_timestamp,
                COMPLETION_TIMESTAMP_FORMAT
            )
            .is_ok()
        );
    }
}
