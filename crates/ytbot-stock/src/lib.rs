//! Stock footage for scene backgrounds.
//!
//! Clips come from the Pexels video API. [`fetch_for_terms`] walks a scene's
//! search terms (then the topic) until one yields footage that has not been
//! used yet in the current video.

pub mod error;
pub mod pexels;
pub mod types;

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use tracing::warn;

pub use error::{StockError, StockResult};
pub use pexels::{PexelsClient, PexelsConfig};
pub use types::{select_file, StockClip};

/// A searchable source of downloadable video clips.
#[async_trait]
pub trait ClipSource: Send + Sync {
    /// Download the best clip for `query` into `dest_dir`, skipping
    /// videos in `exclude_ids`.
    async fn fetch(
        &self,
        query: &str,
        dest_dir: &Path,
        exclude_ids: &HashSet<u64>,
    ) -> StockResult<StockClip>;
}

/// Try each search term in order, then `topic`, and record the chosen video
/// in `used`.
pub async fn fetch_for_terms(
    source: &dyn ClipSource,
    terms: &[String],
    topic: &str,
    dest_dir: &Path,
    used: &mut HashSet<u64>,
) -> StockResult<StockClip> {
    let mut queries: Vec<&str> = terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    let topic = topic.trim();
    if !topic.is_empty() && !queries.contains(&topic) {
        queries.push(topic);
    }

    let mut last_error = None;
    for query in queries {
        match source.fetch(query, dest_dir, used).await {
            Ok(clip) => {
                used.insert(clip.video_id);
                return Ok(clip);
            }
            Err(e) => {
                warn!(query, error = %e, "No usable stock clip, trying next term");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| StockError::NoResults(topic.to_string())))
}
