//! Worker configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{WorkerError, WorkerResult};

/// Where finished videos go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublisherKind {
    /// Keep the file in the library directory
    #[default]
    Local,
    YouTube,
}

impl FromStr for PublisherKind {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "" => Ok(Self::Local),
            "youtube" => Ok(Self::YouTube),
            other => Err(WorkerError::config_error(format!(
                "unknown publisher '{}' (expected local or youtube)",
                other
            ))),
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Per-topic scratch directories live under here
    pub work_dir: PathBuf,
    /// Finished videos
    pub library_dir: PathBuf,
    /// Sleep after finding the queue empty
    pub poll_interval: Duration,
    /// Sleep after a failed topic
    pub error_backoff: Duration,
    /// Upper bound for producing and publishing one topic
    pub job_timeout: Duration,
    /// Keep intermediate files for debugging
    pub keep_work_dir: bool,
    /// Optional music bed mixed under the voiceover
    pub background_music: Option<PathBuf>,
    pub publisher: PublisherKind,
    /// Prometheus listener address
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("temp"),
            library_dir: PathBuf::from("library"),
            poll_interval: Duration::from_secs(60),
            error_backoff: Duration::from_secs(30),
            job_timeout: Duration::from_secs(1800),
            keep_work_dir: false,
            background_music: None,
            publisher: PublisherKind::Local,
            metrics_addr: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        let defaults = Self::default();

        let metrics_addr = match std::env::var("METRICS_ADDR") {
            Ok(addr) if !addr.trim().is_empty() => Some(addr.trim().parse().map_err(|_| {
                WorkerError::config_error(format!("invalid METRICS_ADDR '{}'", addr))
            })?),
            _ => None,
        };

        Ok(Self {
            work_dir: std::env::var("YTBOT_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            library_dir: std::env::var("YTBOT_LIBRARY_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.library_dir),
            poll_interval: Duration::from_secs(
                std::env::var("YTBOT_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            error_backoff: Duration::from_secs(
                std::env::var("YTBOT_ERROR_BACKOFF_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            job_timeout: Duration::from_secs(
                std::env::var("YTBOT_JOB_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1800),
            ),
            keep_work_dir: std::env::var("YTBOT_KEEP_WORK_DIR")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            background_music: std::env::var("YTBOT_BACKGROUND_MUSIC")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            publisher: std::env::var("YTBOT_PUBLISHER")
                .map(|s| s.parse())
                .unwrap_or(Ok(PublisherKind::Local))?,
            metrics_addr,
        })
    }

    /// Scratch directory for one topic.
    pub fn topic_work_dir(&self, topic_id: impl std::fmt::Display) -> PathBuf {
        self.work_dir.join(format!("topic_{}", topic_id))
    }

    /// Final output path for one topic.
    pub fn output_path(&self, topic_id: impl std::fmt::Display) -> PathBuf {
        self.library_dir.join(format!("final_{}.mp4", topic_id))
    }

    /// Same settings with scratch and output under `trial/`, apart from
    /// anything the queue produces.
    pub fn for_trial(&self) -> Self {
        Self {
            work_dir: self.work_dir.join("trial"),
            library_dir: self.library_dir.join("trial"),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publisher_kind_parse() {
        assert_eq!("local".parse::<PublisherKind>().unwrap(), PublisherKind::Local);
        assert_eq!(" YouTube ".parse::<PublisherKind>().unwrap(), PublisherKind::YouTube);
        assert!("vimeo".parse::<PublisherKind>().is_err());
    }

    #[test]
    fn test_paths() {
        let config = WorkerConfig::default();
        assert_eq!(config.topic_work_dir(7), PathBuf::from("temp/topic_7"));
        assert_eq!(config.output_path(7), PathBuf::from("library/final_7.mp4"));
    }

    #[test]
    fn test_trial_paths_are_separate() {
        let config = WorkerConfig::default();
        let trial = config.for_trial();
        assert_eq!(trial.output_path(1001), PathBuf::from("library/trial/final_1001.mp4"));
        assert_ne!(trial.output_path(1001), config.output_path(1001));
        assert_ne!(trial.topic_work_dir(1001), config.topic_work_dir(1001));
        assert_eq!(trial.job_timeout, config.job_timeout);
    }
}
