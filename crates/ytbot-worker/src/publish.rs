//! Publishing finished videos.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE, LOCATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use ytbot_models::{ProducedVideo, VideoMetadata};

use crate::error::{WorkerError, WorkerResult};

/// YouTube limits.
const MAX_TITLE_CHARS: usize = 100;
const MAX_DESCRIPTION_CHARS: usize = 5000;

/// Makes a produced video available and returns its public URL.
#[async_trait]
pub trait Publisher: Send + Sync {
    fn name(&self) -> &'static str;

    async fn publish(&self, video: &ProducedVideo) -> WorkerResult<String>;
}

/// Leaves the file in the library and reports a `file://` URL.
#[derive(Debug, Clone, Default)]
pub struct LocalPublisher;

#[async_trait]
impl Publisher for LocalPublisher {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn publish(&self, video: &ProducedVideo) -> WorkerResult<String> {
        let path = tokio::fs::canonicalize(&video.video_path).await.map_err(|e| {
            WorkerError::publish_failed(
                format!("{}: {}", video.video_path.display(), e),
                None,
            )
        })?;
        let url = file_url(&path)?;
        info!(topic_id = %video.topic_id, %url, "Video kept in library");
        Ok(url)
    }
}

fn file_url(path: &Path) -> WorkerResult<String> {
    Url::from_file_path(path)
        .map(String::from)
        .map_err(|_| WorkerError::publish_failed(format!("not an absolute path: {}", path.display()), None))
}

pub const DEFAULT_YOUTUBE_BASE_URL: &str = "https://www.googleapis.com";

#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    pub base_url: String,
    /// OAuth 2.0 access token with the `youtube.upload` scope
    pub access_token: Option<String>,
    /// `private`, `unlisted` or `public`
    pub privacy_status: String,
    /// Science & Technology
    pub category_id: String,
    pub timeout: Duration,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_YOUTUBE_BASE_URL.to_string(),
            access_token: None,
            privacy_status: "private".to_string(),
            category_id: "28".to_string(),
            timeout: Duration::from_secs(600),
        }
    }
}

impl YouTubeConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("YOUTUBE_BASE_URL").unwrap_or(defaults.base_url),
            access_token: std::env::var("YOUTUBE_ACCESS_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            privacy_status: std::env::var("YOUTUBE_PRIVACY")
                .ok()
                .filter(|p| matches!(p.as_str(), "private" | "unlisted" | "public"))
                .unwrap_or(defaults.privacy_status),
            ..defaults
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoResource<'a> {
    snippet: Snippet<'a>,
    status: Status<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Snippet<'a> {
    title: String,
    description: String,
    tags: &'a [String],
    category_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Status<'a> {
    privacy_status: &'a str,
    self_declared_made_for_kids: bool,
}

#[derive(Debug, Deserialize)]
struct UploadedVideo {
    id: String,
}

/// Resumable uploads to the YouTube Data API v3.
pub struct YouTubePublisher {
    http: Client,
    access_token: String,
    config: YouTubeConfig,
}

impl YouTubePublisher {
    pub fn new(config: YouTubeConfig) -> WorkerResult<Self> {
        let access_token = config
            .access_token
            .clone()
            .ok_or_else(|| WorkerError::config_error("YOUTUBE_ACCESS_TOKEN not set"))?;
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            access_token,
            config,
        })
    }

    pub fn from_env() -> WorkerResult<Self> {
        Self::new(YouTubeConfig::from_env())
    }

    fn resource<'a>(&'a self, metadata: &'a VideoMetadata) -> VideoResource<'a> {
        VideoResource {
            snippet: Snippet {
                title: truncate_chars(&metadata.title, MAX_TITLE_CHARS),
                description: truncate_chars(&metadata.description, MAX_DESCRIPTION_CHARS),
                tags: &metadata.tags,
                category_id: &self.config.category_id,
            },
            status: Status {
                privacy_status: &self.config.privacy_status,
                self_declared_made_for_kids: false,
            },
        }
    }

    /// Open an upload session and return its URL.
    async fn start_session(&self, metadata: &VideoMetadata, size: u64) -> WorkerResult<String> {
        let url = format!(
            "{}/upload/youtube/v3/videos",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .http
            .post(&url)
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(&self.access_token)
            .header("X-Upload-Content-Type", "video/mp4")
            .header("X-Upload-Content-Length", size.to_string())
            .json(&self.resource(metadata))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WorkerError::publish_failed(
                format!("upload session rejected: {}", body),
                Some(status.as_u16()),
            ));
        }

        response
            .headers()
            .get(LOCATION)
            .and_then(|v: &HeaderValue| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                WorkerError::publish_failed("upload session has no Location header", None)
            })
    }

    async fn upload_bytes(&self, session_url: &str, bytes: Vec<u8>) -> WorkerResult<String> {
        let response = self
            .http
            .put(session_url)
            .bearer_auth(&self.access_token)
            .header(CONTENT_TYPE, "video/mp4")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WorkerError::publish_failed(
                format!("upload failed: {}", body),
                Some(status.as_u16()),
            ));
        }

        let uploaded: UploadedVideo = response.json().await?;
        Ok(uploaded.id)
    }
}

#[async_trait]
impl Publisher for YouTubePublisher {
    fn name(&self) -> &'static str {
        "youtube"
    }

    async fn publish(&self, video: &ProducedVideo) -> WorkerResult<String> {
        let bytes = tokio::fs::read(&video.video_path).await?;
        info!(
            topic_id = %video.topic_id,
            title = %video.metadata.title,
            bytes = bytes.len(),
            privacy = %self.config.privacy_status,
            "Uploading to YouTube"
        );

        let session = self.start_session(&video.metadata, bytes.len() as u64).await?;
        debug!("Resumable session opened");

        let id = self.upload_bytes(&session, bytes).await?;
        let url = format!("https://youtube.com/watch?v={}", id);
        info!(topic_id = %video.topic_id, %url, "Upload complete");
        Ok(url)
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
