//! Pexels video search and download.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{StockError, StockResult};
use crate::types::{select_file, StockClip, Video, VideoSearchResponse};
use crate::ClipSource;

pub const DEFAULT_BASE_URL: &str = "https://api.pexels.com";

#[derive(Debug, Clone)]
pub struct PexelsConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Results requested per search
    pub per_page: u32,
    pub target_height: u32,
    pub max_height: u32,
    pub timeout: Duration,
}

impl Default for PexelsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            per_page: 15,
            target_height: 1920,
            max_height: 2160,
            timeout: Duration::from_secs(300),
        }
    }
}

impl PexelsConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("PEXELS_BASE_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("PEXELS_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            per_page: std::env::var("PEXELS_PER_PAGE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.per_page),
            ..defaults
        }
    }
}

/// Pexels client.
pub struct PexelsClient {
    http: Client,
    api_key: String,
    config: PexelsConfig,
}

impl PexelsClient {
    pub fn new(config: PexelsConfig) -> StockResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(StockError::MissingApiKey("PEXELS_API_KEY"))?;

        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            api_key,
            config,
        })
    }

    pub fn from_env() -> StockResult<Self> {
        Self::new(PexelsConfig::from_env())
    }

    /// Search portrait videos.
    pub async fn search(&self, query: &str) -> StockResult<Vec<Video>> {
        let url = format!("{}/videos/search", self.config.base_url.trim_end_matches('/'));
        let per_page = self.config.per_page.to_string();

        let response = self
            .http
            .get(&url)
            .header("Authorization", &self.api_key)
            .query(&[
                ("query", query),
                ("orientation", "portrait"),
                ("size", "medium"),
                ("per_page", per_page.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StockError::Api { status, body });
        }

        let results: VideoSearchResponse = response.json().await?;
        debug!(
            query,
            total = results.total_results,
            returned = results.videos.len(),
            "Pexels search"
        );
        Ok(results.videos)
    }

    /// Stream `link` to `dest`. Writes to a `.part` file first.
    pub async fn download(&self, link: &str, dest: &Path) -> StockResult<u64> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self.http.get(link).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StockError::Api { status, body });
        }

        let partial = dest.with_extension("mp4.part");
        let mut file = tokio::fs::File::create(&partial).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| StockError::download(e.to_string()))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        if written == 0 {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(StockError::download(format!("empty body from {}", link)));
        }

        tokio::fs::rename(&partial, dest).await?;
        Ok(written)
    }

    fn clip_path(dest_dir: &Path, video_id: u64) -> PathBuf {
        dest_dir.join(format!("{}.mp4", video_id))
    }
}

#[async_trait]
impl ClipSource for PexelsClient {
    async fn fetch(
        &self,
        query: &str,
        dest_dir: &Path,
        exclude_ids: &HashSet<u64>,
    ) -> StockResult<StockClip> {
        let videos = self.search(query).await?;

        let (video, file) = videos
            .iter()
            .filter(|v| !exclude_ids.contains(&v.id))
            .find_map(|v| {
                select_file(&v.video_files, self.config.target_height, self.config.max_height)
                    .map(|f| (v, f))
            })
            .ok_or_else(|| StockError::NoResults(query.to_string()))?;

        let dest = Self::clip_path(dest_dir, video.id);
        let bytes = self.download(&file.link, &dest).await?;

        info!(
            query,
            video_id = video.id,
            width = file.width.unwrap_or(video.width),
            height = file.height.unwrap_or(video.height),
            bytes,
            "Downloaded stock clip"
        );

        Ok(StockClip {
            video_id: video.id,
            path: dest,
            width: file.width.unwrap_or(video.width),
            height: file.height.unwrap_or(video.height),
            duration_secs: video.duration as f64,
            query: query.to_string(),
            author: video.user.as_ref().map(|u| u.name.clone()),
            source_url: video.url.clone(),
        })
    }
}
