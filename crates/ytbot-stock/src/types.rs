//! Pexels video API response types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct VideoSearchResponse {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_results: u32,
    #[serde(default)]
    pub videos: Vec<Video>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Video {
    pub id: u64,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Whole seconds
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub url: String,
    pub user: Option<VideoUser>,
    #[serde(default)]
    pub video_files: Vec<VideoFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoUser {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoFile {
    pub id: u64,
    pub quality: Option<String>,
    pub file_type: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub link: String,
}

impl VideoFile {
    pub fn is_mp4(&self) -> bool {
        self.file_type.eq_ignore_ascii_case("video/mp4")
    }

    pub fn is_portrait(&self) -> bool {
        matches!((self.width, self.height), (Some(w), Some(h)) if h > w)
    }

    fn pixels(&self) -> u64 {
        self.width.unwrap_or(0) as u64 * self.height.unwrap_or(0) as u64
    }
}

/// A downloaded stock clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockClip {
    /// Provider video id
    pub video_id: u64,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub duration_secs: f64,
    /// Search term that found it
    pub query: String,
    /// Credit line for the description
    pub author: Option<String>,
    pub source_url: String,
}

/// Pick the file to download from a video's renditions.
///
/// Only mp4 files qualify. Portrait files win over landscape. Among the
/// candidates the height closest to `target_height` not above `max_height`
/// is chosen; if every candidate is above the cap the largest is taken.
pub fn select_file(files: &[VideoFile], target_height: u32, max_height: u32) -> Option<&VideoFile> {
    let mp4: Vec<&VideoFile> = files.iter().filter(|f| f.is_mp4()).collect();
    let portrait: Vec<&VideoFile> = mp4.iter().copied().filter(|f| f.is_portrait()).collect();
    let candidates = if portrait.is_empty() { mp4 } else { portrait };

    let within_cap = candidates
        .iter()
        .copied()
        .filter(|f| f.height.is_some_and(|h| h <= max_height))
        .min_by_key(|f| f.height.unwrap_or(0).abs_diff(target_height));

    within_cap.or_else(|| candidates.iter().copied().max_by_key(|f| f.pixels()))
}
