//! Voiceover synthesis through the `edge-tts` CLI.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};
use crate::process::run_tool;

pub const DEFAULT_VOICE: &str = "en-US-ChristopherNeural";
pub const DEFAULT_RATE: &str = "+0%";

/// Turns narration text into an audio file.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, out_path: &Path) -> MediaResult<()>;
}

/// edge-tts settings.
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub binary: String,
    pub voice: String,
    /// Signed percentage, e.g. `+10%`
    pub rate: String,
    pub timeout: Duration,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            binary: "edge-tts".to_string(),
            voice: DEFAULT_VOICE.to_string(),
            rate: DEFAULT_RATE.to_string(),
            timeout: Duration::from_secs(180),
        }
    }
}

impl TtsConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            binary: std::env::var("TTS_BINARY").unwrap_or(defaults.binary),
            voice: std::env::var("TTS_VOICE").unwrap_or(defaults.voice),
            rate: std::env::var("TTS_RATE")
                .ok()
                .map(|r| normalize_rate(&r))
                .unwrap_or(defaults.rate),
            timeout: defaults.timeout,
        }
    }
}

/// edge-tts requires an explicit sign on the rate.
fn normalize_rate(rate: &str) -> String {
    let rate = rate.trim();
    let rate = if rate.ends_with('%') {
        rate.to_string()
    } else {
        format!("{}%", rate)
    };
    if rate.starts_with('+') || rate.starts_with('-') {
        rate
    } else {
        format!("+{}", rate)
    }
}

/// Microsoft Edge neural voices via the `edge-tts` command.
#[derive(Debug, Clone, Default)]
pub struct EdgeTts {
    config: TtsConfig,
}

impl EdgeTts {
    pub fn new(config: TtsConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(TtsConfig::from_env())
    }

    fn build_args(&self, text_file: &Path, out_path: &Path) -> Vec<String> {
        vec![
            "--voice".to_string(),
            self.config.voice.clone(),
            format!("--rate={}", self.config.rate),
            "--file".to_string(),
            text_file.to_string_lossy().to_string(),
            "--write-media".to_string(),
            out_path.to_string_lossy().to_string(),
        ]
    }
}

#[async_trait]
impl SpeechSynthesizer for EdgeTts {
    async fn synthesize(&self, text: &str, out_path: &Path) -> MediaResult<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(MediaError::invalid_input("narration is empty"));
        }

        if let Some(parent) = out_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Long narrations go through a file rather than argv
        let text_file = out_path.with_extension("txt");
        tokio::fs::write(&text_file, text).await?;

        info!(
            voice = %self.config.voice,
            rate = %self.config.rate,
            chars = text.len(),
            "Synthesizing voiceover"
        );

        let args = self.build_args(&text_file, out_path);
        run_tool(&self.config.binary, &args, self.config.timeout).await?;

        let size = tokio::fs::metadata(out_path).await.map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(MediaError::tool_failed(
                &self.config.binary,
                "no audio written",
                None,
            ));
        }

        debug!(path = %out_path.display(), bytes = size, "Voiceover written");
        Ok(())
    }
}
