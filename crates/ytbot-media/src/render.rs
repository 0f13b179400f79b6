//! Final video assembly.
//!
//! Rendering runs in three FFmpeg passes:
//! 1. each stock clip is looped or trimmed to its slot and normalized to the
//!    output geometry with a Ken-Burns zoom;
//! 2. normalized scenes are joined with crossfades;
//! 3. the voiceover (and optional music) is muxed and captions are burned in.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info};

use ytbot_models::{CaptionCue, EncodingConfig, RenderSettings};

use crate::command::{FfmpegCommand, FfmpegInput, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters;
use crate::probe::get_duration;
use crate::subtitles::write_srt_file;
use crate::timeline::{fit_clip, ClipFit, SceneSlot, Timeline};

/// A downloaded clip and the narration weight of its scene.
#[derive(Debug, Clone)]
pub struct SceneClip {
    pub path: PathBuf,
    /// Narration length in characters
    pub weight: usize,
}

impl SceneClip {
    pub fn new(path: impl Into<PathBuf>, weight: usize) -> Self {
        Self {
            path: path.into(),
            weight,
        }
    }
}

/// Inputs for one render.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub scenes: Vec<SceneClip>,
    pub voiceover: PathBuf,
    pub captions: Vec<CaptionCue>,
    pub background_music: Option<PathBuf>,
    /// Scratch directory for intermediate files
    pub work_dir: PathBuf,
    pub output: PathBuf,
}

/// Result of a finished render.
#[derive(Debug, Clone)]
pub struct RenderedVideo {
    pub path: PathBuf,
    pub duration_secs: f64,
    pub timeline: Timeline,
}

/// Turns a render request into a finished video file.
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    async fn render(&self, request: &RenderRequest) -> MediaResult<RenderedVideo>;
}

/// Assembles scenes, voiceover and captions into the final short.
#[derive(Clone)]
pub struct Renderer {
    settings: RenderSettings,
    encoding: EncodingConfig,
    cancel_rx: Option<watch::Receiver<bool>>,
    /// Upper bound for each FFmpeg pass
    pass_timeout: Option<Duration>,
}

impl Renderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            encoding: EncodingConfig::default(),
            cancel_rx: None,
            pass_timeout: None,
        }
    }

    /// Kill the running FFmpeg pass once `cancel_rx` turns true.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    pub fn with_pass_timeout(mut self, timeout: Duration) -> Self {
        self.pass_timeout = Some(timeout);
        self
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    fn runner(&self) -> FfmpegRunner {
        let mut runner = FfmpegRunner::new();
        if let Some(rx) = &self.cancel_rx {
            runner = runner.with_cancel(rx.clone());
        }
        if let Some(timeout) = self.pass_timeout {
            runner = runner.with_timeout(timeout);
        }
        runner
    }

    /// Run one pass, logging progress against the expected output length.
    async fn run_pass(
        &self,
        pass: &'static str,
        cmd: &FfmpegCommand,
        expected_secs: f64,
    ) -> MediaResult<()> {
        let total_ms = (expected_secs * 1000.0) as i64;
        self.runner()
            .run_with_progress(cmd, move |p| {
                debug!(
                    pass,
                    percent = p.percentage(total_ms) as u32,
                    speed = p.speed,
                    "FFmpeg progress"
                );
            })
            .await
    }

    /// Render a complete video.
    pub async fn render(&self, request: &RenderRequest) -> MediaResult<RenderedVideo> {
        if request.scenes.is_empty() {
            return Err(MediaError::invalid_input("no scenes to render"));
        }

        let started = Instant::now();
        tokio::fs::create_dir_all(&request.work_dir).await?;
        if let Some(parent) = request.output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let voice_duration = get_duration(&request.voiceover).await?;
        let weights: Vec<usize> = request.scenes.iter().map(|s| s.weight).collect();
        let timeline = Timeline::plan(&weights, voice_duration, &self.settings)?;

        info!(
            scenes = timeline.slots.len(),
            duration = voice_duration,
            crossfade = timeline.crossfade,
            "Rendering video"
        );

        let mut normalized = Vec::with_capacity(timeline.slots.len());
        for (scene, slot) in request.scenes.iter().zip(&timeline.slots) {
            let out = request
                .work_dir
                .join(format!("scene_{:02}.mp4", slot.index));
            let clip_duration = get_duration(&scene.path).await?;
            self.normalize_scene(&scene.path, clip_duration, slot, &out)
                .await?;
            normalized.push(out);
        }

        let joined = request.work_dir.join("joined.mp4");
        self.join_scenes(&normalized, &timeline, &joined).await?;

        let srt = request.work_dir.join("captions.srt");
        let srt = if request.captions.iter().any(CaptionCue::is_valid) {
            write_srt_file(&srt, &request.captions).await?;
            Some(srt)
        } else {
            None
        };

        self.finalize(
            &joined,
            &request.voiceover,
            request.background_music.as_deref(),
            srt.as_deref(),
            &request.output,
        )
        .await?;

        info!(
            output = %request.output.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Render complete"
        );

        Ok(RenderedVideo {
            path: request.output.clone(),
            duration_secs: voice_duration,
            timeline,
        })
    }

    /// Loop or trim `clip` to its slot and normalize geometry, fps and zoom.
    pub async fn normalize_scene(
        &self,
        clip: &Path,
        clip_duration: f64,
        slot: &SceneSlot,
        output: &Path,
    ) -> MediaResult<()> {
        let cmd = self.normalize_command(clip, clip_duration, slot, output)?;
        debug!(scene = slot.index, clip = %clip.display(), "Normalizing scene");
        self.run_pass("normalize", &cmd, slot.clip_duration).await
    }

    fn normalize_command(
        &self,
        clip: &Path,
        clip_duration: f64,
        slot: &SceneSlot,
        output: &Path,
    ) -> MediaResult<FfmpegCommand> {
        let input = match fit_clip(clip_duration, slot.clip_duration)? {
            ClipFit::Loop { count } => FfmpegInput::new(clip).stream_loop(count as i32),
            ClipFit::Trim { start } => FfmpegInput::new(clip)
                .seek(start)
                .duration(slot.clip_duration),
        };

        Ok(FfmpegCommand::new(output)
            .input(input)
            .video_filter(filters::scene_filter(
                &slot.ken_burns,
                slot.clip_duration,
                &self.settings,
            ))
            .output_duration(slot.clip_duration)
            .no_audio()
            .video_encoding(&EncodingConfig::for_intermediate()))
    }

    /// Join normalized scenes with crossfades.
    pub async fn join_scenes(
        &self,
        scenes: &[PathBuf],
        timeline: &Timeline,
        output: &Path,
    ) -> MediaResult<()> {
        let cmd = self.join_command(scenes, timeline, output)?;
        self.run_pass("join", &cmd, timeline.rendered_duration()).await
    }

    fn join_command(
        &self,
        scenes: &[PathBuf],
        timeline: &Timeline,
        output: &Path,
    ) -> MediaResult<FfmpegCommand> {
        if scenes.len() != timeline.slots.len() {
            return Err(MediaError::invalid_input(format!(
                "{} scene files for {} timeline slots",
                scenes.len(),
                timeline.slots.len()
            )));
        }

        let mut cmd = scenes
            .iter()
            .fold(FfmpegCommand::new(output), |cmd, scene| {
                cmd.input(FfmpegInput::new(scene))
            });

        cmd = match filters::xfade_chain(&timeline.xfade_offsets(), timeline.crossfade) {
            Some(graph) => cmd.filter_complex(graph).map("[vout]"),
            // Single scene, nothing to blend
            None => cmd.map("0:v"),
        };

        Ok(cmd
            .no_audio()
            .video_encoding(&EncodingConfig::for_intermediate()))
    }

    /// Mux audio and burn captions into the final output.
    pub async fn finalize(
        &self,
        video: &Path,
        voiceover: &Path,
        music: Option<&Path>,
        captions: Option<&Path>,
        output: &Path,
    ) -> MediaResult<()> {
        let cmd = self.finalize_command(video, voiceover, music, captions, output);
        let duration = get_duration(voiceover).await?;
        self.run_pass("finalize", &cmd, duration).await
    }

    fn finalize_command(
        &self,
        video: &Path,
        voiceover: &Path,
        music: Option<&Path>,
        captions: Option<&Path>,
        output: &Path,
    ) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::new(output)
            .input(FfmpegInput::new(video))
            .input(FfmpegInput::new(voiceover));
        if let Some(music) = music {
            cmd = cmd.input(FfmpegInput::new(music).stream_loop(-1));
        }

        let mut graph = Vec::new();
        let video_label = match captions {
            Some(srt) => {
                graph.push(format!(
                    "[0:v]{}[vout]",
                    filters::subtitles(srt, &self.settings.caption_style)
                ));
                "[vout]"
            }
            None => "0:v",
        };
        let audio_label = if music.is_some() {
            graph.push(filters::voice_with_music(
                "1:a",
                "2:a",
                self.settings.music_volume,
            ));
            "[aout]"
        } else {
            "1:a"
        };

        if !graph.is_empty() {
            cmd = cmd.filter_complex(graph.join(";"));
        }

        cmd.map(video_label)
            .map(audio_label)
            .frame_rate(self.settings.fps)
            .encoding(&self.encoding)
            .shortest()
            .faststart()
    }
}

#[async_trait]
impl VideoRenderer for Renderer {
    async fn render(&self, request: &RenderRequest) -> MediaResult<RenderedVideo> {
        Renderer::render(self, request).await
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RenderSettings::default())
    }
}
