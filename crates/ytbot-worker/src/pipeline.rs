//! Topic-to-video production.
//!
//! One production runs in `<work_dir>/topic_<id>`:
//! script -> voiceover -> captions -> stock footage -> render.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::Instrument;

use ytbot_llm::{OpenRouterClient, ScriptGenerator};
use ytbot_media::{
    EdgeTts, MediaError, RenderRequest, Renderer, SceneClip, SpeechSynthesizer, Transcriber,
    VideoRenderer, WhisperCli, WhisperConfig,
};
use ytbot_models::{CaptionCue, ProducedVideo, RenderSettings, Script, Topic, VideoMetadata};
use ytbot_stock::{fetch_for_terms, ClipSource, PexelsClient, StockClip, StockError, StockResult};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics::{stages, StageTimer};
use crate::retry::{retry_async_when, RetryConfig};

const VOICEOVER_FILE: &str = "voiceover.mp3";
const CLIPS_DIR: &str = "clips";

/// The external services a production depends on.
#[derive(Clone)]
pub struct Backends {
    pub script: Arc<dyn ScriptGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub transcriber: Arc<dyn Transcriber>,
    pub clips: Arc<dyn ClipSource>,
    pub renderer: Arc<dyn VideoRenderer>,
}

impl Backends {
    /// OpenRouter, edge-tts, whisper, Pexels and FFmpeg, configured from the
    /// environment. FFmpeg passes are killed when `cancel_rx` turns true or
    /// after `job_timeout`.
    pub fn from_env(
        config: &WorkerConfig,
        settings: &RenderSettings,
        cancel_rx: watch::Receiver<bool>,
    ) -> WorkerResult<Self> {
        let renderer = Renderer::new(settings.clone())
            .with_cancel(cancel_rx)
            .with_pass_timeout(config.job_timeout);
        let whisper = WhisperConfig::from_env().with_max_words(settings.max_words_per_caption);
        Ok(Self {
            script: Arc::new(OpenRouterClient::from_env()?),
            speech: Arc::new(EdgeTts::from_env()),
            transcriber: Arc::new(WhisperCli::new(whisper)),
            clips: Arc::new(PexelsClient::from_env()?),
            renderer: Arc::new(renderer),
        })
    }
}

/// Retries transient clip fetch failures.
struct RetryingClipSource<'a> {
    inner: &'a dyn ClipSource,
    retry: &'a RetryConfig,
}

#[async_trait]
impl ClipSource for RetryingClipSource<'_> {
    async fn fetch(
        &self,
        query: &str,
        dest_dir: &Path,
        exclude_ids: &HashSet<u64>,
    ) -> StockResult<StockClip> {
        retry_async_when(
            self.retry,
            || self.inner.fetch(query, dest_dir, exclude_ids),
            StockError::is_retryable,
        )
        .await
        .into_result()
    }
}

/// Produces a finished video for a topic.
pub struct ProductionPipeline {
    config: WorkerConfig,
    backends: Backends,
    retry: RetryConfig,
}

impl ProductionPipeline {
    pub fn new(config: WorkerConfig, backends: Backends) -> Self {
        Self {
            config,
            backends,
            retry: RetryConfig::new("external_call").with_max_retries(2),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Produce the video for `topic` within `job_timeout`. The work
    /// directory is removed afterwards, on failure and timeout too, unless
    /// `keep_work_dir` is set.
    pub async fn produce(&self, topic: &Topic) -> WorkerResult<ProducedVideo> {
        let logger = JobLogger::new(topic.id, "produce_video");
        let work_dir = self.config.topic_work_dir(topic.id);
        let limit = self.config.job_timeout;

        let production = self
            .produce_in(topic, &work_dir, &logger)
            .instrument(logger.create_span());
        let result = match tokio::time::timeout(limit, production).await {
            Ok(result) => result,
            Err(_) => {
                logger.log_error(&format!("timed out after {:?}", limit));
                Err(WorkerError::Timeout(limit))
            }
        };

        if !self.config.keep_work_dir {
            if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    logger.log_warning(&format!("could not remove {}: {}", work_dir.display(), e));
                }
            }
        }

        result
    }

    async fn produce_in(
        &self,
        topic: &Topic,
        work_dir: &Path,
        logger: &JobLogger,
    ) -> WorkerResult<ProducedVideo> {
        logger.log_start(&topic.content);
        tokio::fs::create_dir_all(work_dir).await?;

        let script = self.write_script(&topic.content).await?;
        logger.log_progress(&format!(
            "script \"{}\" with {} scenes",
            script.title,
            script.scenes.len()
        ));

        let voiceover = work_dir.join(VOICEOVER_FILE);
        {
            let _timer = StageTimer::start(stages::VOICEOVER);
            self.backends
                .speech
                .synthesize(&script.full_narration(), &voiceover)
                .await?;
        }
        logger.log_progress("voiceover ready");

        let captions = self.caption(&voiceover, work_dir, logger).await;

        let clips = {
            let _timer = StageTimer::start(stages::FOOTAGE);
            self.gather_footage(&script, &topic.content, &work_dir.join(CLIPS_DIR))
                .await?
        };
        logger.log_progress(&format!("{} clips downloaded", clips.len()));

        let request = RenderRequest {
            scenes: script
                .scenes
                .iter()
                .zip(&clips)
                .map(|(scene, clip)| SceneClip::new(clip.path.clone(), scene.char_count()))
                .collect(),
            voiceover,
            captions,
            background_music: self.config.background_music.clone(),
            work_dir: work_dir.to_path_buf(),
            output: self.config.output_path(topic.id),
        };

        let rendered = {
            let _timer = StageTimer::start(stages::RENDER);
            self.backends.renderer.render(&request).await?
        };

        logger.log_completion(&format!(
            "{} ({:.1}s)",
            rendered.path.display(),
            rendered.duration_secs
        ));

        Ok(ProducedVideo {
            topic_id: topic.id,
            video_path: rendered.path,
            metadata: VideoMetadata::from(&script),
            duration_secs: rendered.duration_secs,
            scene_count: script.scenes.len(),
        })
    }

    async fn write_script(&self, topic: &str) -> WorkerResult<Script> {
        let _timer = StageTimer::start(stages::SCRIPT);
        let script = retry_async_when(
            &self.retry,
            || self.backends.script.generate_script(topic),
            ytbot_llm::LlmError::is_retryable,
        )
        .await
        .into_result()?;
        Ok(script)
    }

    /// Captions are best effort: a failed transcription yields a video
    /// without burned-in text rather than a failed topic.
    async fn caption(&self, voiceover: &Path, work_dir: &Path, logger: &JobLogger) -> Vec<CaptionCue> {
        let _timer = StageTimer::start(stages::CAPTIONS);
        match self.backends.transcriber.transcribe(voiceover, work_dir).await {
            Ok(cues) => {
                logger.log_progress(&format!("{} caption cues", cues.len()));
                cues
            }
            Err(MediaError::ToolNotFound(tool)) => {
                logger.log_warning(&format!("{} not installed, rendering without captions", tool));
                Vec::new()
            }
            Err(e) => {
                logger.log_warning(&format!("transcription failed, rendering without captions: {}", e));
                Vec::new()
            }
        }
    }

    /// One distinct clip per scene.
    async fn gather_footage(
        &self,
        script: &Script,
        topic: &str,
        dest_dir: &Path,
    ) -> WorkerResult<Vec<StockClip>> {
        tokio::fs::create_dir_all(dest_dir).await?;

        let source = RetryingClipSource {
            inner: self.backends.clips.as_ref(),
            retry: &self.retry,
        };
        let mut used = HashSet::new();
        let mut clips = Vec::with_capacity(script.scenes.len());

        for (index, scene) in script.scenes.iter().enumerate() {
            let clip = fetch_for_terms(&source, &scene.search_terms, topic, dest_dir, &mut used)
                .await
                .map_err(|e| {
                    WorkerError::production_failed(format!("no footage for scene {}: {}", index + 1, e))
                })?;
            clips.push(clip);
        }

        Ok(clips)
    }
}
