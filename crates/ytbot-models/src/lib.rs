//! Shared data models for the YT_BOT pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Queue topics and completion history records
//! - LLM scene scripts
//! - Caption cues and SRT timestamps
//! - Encoding and render settings

pub mod caption;
pub mod encoding;
pub mod render;
pub mod script;
pub mod timestamp;
pub mod topic;
pub mod video;

// Re-export common types
pub use caption::CaptionCue;
pub use encoding::EncodingConfig;
pub use render::{CaptionStyle, RenderSettings};
pub use script::{Scene, Script};
pub use timestamp::TimestampError;
pub use topic::{CompletionRecord, Topic, TopicId, TopicStatus};
pub use video::{ProducedVideo, VideoMetadata};
