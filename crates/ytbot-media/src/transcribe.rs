//! Word-level transcription through the `whisper` CLI.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use ytbot_models::CaptionCue;

use crate::error::{MediaError, MediaResult};
use crate::process::run_tool;
use crate::subtitles::{group_words, split_segment, WordTiming};

pub const DEFAULT_WHISPER_MODEL: &str = "base";
pub const DEFAULT_MAX_WORDS: usize = 3;

/// Produces caption cues from a voiceover.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path, work_dir: &Path) -> MediaResult<Vec<CaptionCue>>;
}

#[derive(Debug, Clone)]
pub struct WhisperConfig {
    pub binary: String,
    pub model: String,
    /// Skip language detection when set
    pub language: Option<String>,
    pub max_words_per_cue: usize,
    pub timeout: Duration,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            binary: "whisper".to_string(),
            model: DEFAULT_WHISPER_MODEL.to_string(),
            language: None,
            max_words_per_cue: DEFAULT_MAX_WORDS,
            timeout: Duration::from_secs(900),
        }
    }
}

impl WhisperConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            binary: std::env::var("WHISPER_BINARY").unwrap_or(defaults.binary),
            model: std::env::var("WHISPER_MODEL").unwrap_or(defaults.model),
            language: std::env::var("WHISPER_LANGUAGE")
                .ok()
                .filter(|l| !l.trim().is_empty()),
            max_words_per_cue: defaults.max_words_per_cue,
            timeout: defaults.timeout,
        }
    }

    pub fn with_max_words(mut self, max_words: usize) -> Self {
        self.max_words_per_cue = max_words.max(1);
        self
    }
}

#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    #[serde(default)]
    text: String,
    #[serde(default)]
    words: Vec<WhisperWord>,
}

#[derive(Debug, Deserialize)]
struct WhisperWord {
    word: String,
    start: f64,
    end: f64,
}

/// OpenAI Whisper command-line transcriber.
#[derive(Debug, Clone, Default)]
pub struct WhisperCli {
    config: WhisperConfig,
}

impl WhisperCli {
    pub fn new(config: WhisperConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(WhisperConfig::from_env())
    }

    fn build_args(&self, audio: &Path, output_dir: &Path) -> Vec<String> {
        let mut args = vec![
            audio.to_string_lossy().to_string(),
            "--model".to_string(),
            self.config.model.clone(),
            "--output_format".to_string(),
            "json".to_string(),
            "--output_dir".to_string(),
            output_dir.to_string_lossy().to_string(),
            "--word_timestamps".to_string(),
            "True".to_string(),
            "--verbose".to_string(),
            "False".to_string(),
        ];
        if let Some(language) = &self.config.language {
            args.push("--language".to_string());
            args.push(language.clone());
        }
        args
    }

    /// Whisper names its output after the input stem.
    fn output_path(audio: &Path, output_dir: &Path) -> PathBuf {
        let stem = audio
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());
        output_dir.join(format!("{}.json", stem))
    }
}

/// Convert whisper JSON into display cues.
pub fn cues_from_whisper_json(json: &str, max_words: usize) -> MediaResult<Vec<CaptionCue>> {
    let output: WhisperOutput = serde_json::from_str(json)?;

    let mut cues = Vec::new();
    for segment in &output.segments {
        if segment.words.is_empty() {
            cues.extend(split_segment(
                &segment.text,
                segment.start,
                segment.end,
                max_words,
            ));
        } else {
            let words: Vec<WordTiming> = segment
                .words
                .iter()
                .map(|w| WordTiming::new(w.word.clone(), w.start, w.end))
                .collect();
            cues.extend(group_words(&words, max_words));
        }
    }

    Ok(cues)
}

#[async_trait]
impl Transcriber for WhisperCli {
    async fn transcribe(&self, audio: &Path, work_dir: &Path) -> MediaResult<Vec<CaptionCue>> {
        if !audio.exists() {
            return Err(MediaError::FileNotFound(audio.to_path_buf()));
        }

        let output_dir = work_dir.join("whisper");
        tokio::fs::create_dir_all(&output_dir).await?;

        info!(model = %self.config.model, audio = %audio.display(), "Transcribing voiceover");

        let args = self.build_args(audio, &output_dir);
        run_tool(&self.config.binary, &args, self.config.timeout).await?;

        let json_path = Self::output_path(audio, &output_dir);
        let json = tokio::fs::read_to_string(&json_path).await.map_err(|e| {
            MediaError::transcription(format!(
                "missing whisper output {}: {}",
                json_path.display(),
                e
            ))
        })?;

        let cues = cues_from_whisper_json(&json, self.config.max_words_per_cue)?;
        if cues.is_empty() {
            warn!(audio = %audio.display(), "Whisper returned no speech");
            return Err(MediaError::transcription("no speech recognized"));
        }

        info!(cues = cues.len(), "Transcription complete");
        Ok(cues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
        "text": " AI is changing everything we do.",
        "language": "en",
        "segments": [
            {
                "id": 0, "start": 0.0, "end": 2.0,
                "text": " AI is changing everything",
                "words": [
                    {"word": " AI", "start": 0.0, "end": 0.4, "probability": 0.9},
                    {"word": " is", "start": 0.4, "end": 0.6, "probability": 0.9},
                    {"word": " changing", "start": 0.6, "end": 1.2, "probability": 0.9},
                    {"word": " everything", "start": 1.2, "end": 2.0, "probability": 0.9}
                ]
            },
            {"id": 1, "start": 2.0, "end": 3.0, "text": " we do."}
        ]
    }"#;

    #[test]
    fn test_cues_from_whisper_json() {
        let cues = cues_from_whisper_json(SAMPLE, 3).unwrap();
        let texts: Vec<&str> = cues.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["AI is changing", "everything", "we do."]);
        assert_eq!(cues[0].end, 1.2);
        assert_eq!(cues[2].start, 2.0);
        assert_eq!(cues[2].end, 3.0);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            cues_from_whisper_json("not json", 3),
            Err(MediaError::JsonParse(_))
        ));
    }

    #[test]
    fn test_build_args_with_language() {
        let whisper = WhisperCli::new(WhisperConfig {
            language: Some("en".to_string()),
            ..Default::default()
        });
        let args = whisper.build_args(Path::new("/w/voice.mp3"), Path::new("/w/whisper"));
        assert_eq!(args[0], "/w/voice.mp3");
        let joined = args.join(" ");
        assert!(joined.contains("--output_format json"));
        assert!(joined.contains("--word_timestamps True"));
        assert!(joined.ends_with("--language en"));
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            WhisperCli::output_path(Path::new("/w/voice.mp3"), Path::new("/out")),
            PathBuf::from("/out/voice.json")
        );
    }

    #[tokio::test]
    async fn test_missing_audio() {
        let dir = TempDir::new().unwrap();
        let result = WhisperCli::default()
            .transcribe(&dir.path().join("none.mp3"), dir.path())
            .await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
