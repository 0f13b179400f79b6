//! Produced video models handed to the publisher.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{Script, TopicId};

/// Publishing metadata for a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl From<&Script> for VideoMetadata {
    fn from(script: &Script) -> Self {
        Self {
            title: script.title.clone(),
            description: script.description.clone(),
            tags: script.tags.clone(),
        }
    }
}

/// A rendered video ready for publishing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducedVideo {
    pub topic_id: TopicId,
    pub video_path: PathBuf,
    pub metadata: VideoMetadata,
    /// Final duration in seconds (the voiceover length)
    pub duration_secs: f64,
    pub scene_count: usize,
}
