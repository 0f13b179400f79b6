#![deny(unreachable_patterns)]
//! Media tooling for short-video production.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with progress, cancellation and timeouts
//! - FFprobe media inspection
//! - Voiceover synthesis through `edge-tts`
//! - Word-timed captions through `whisper` and SRT files
//! - Scene timeline math (duration split, crossfades, clip fitting, Ken-Burns)
//! - The three-pass renderer producing the final vertical video

pub mod command;
pub mod error;
pub mod filters;
pub mod probe;
pub mod process;
pub mod progress;
pub mod render;
pub mod subtitles;
pub mod timeline;
pub mod transcribe;
pub mod tts;

pub use command::{check_ffmpeg, check_ffprobe, check_tool, FfmpegCommand, FfmpegInput, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use probe::{get_duration, probe_media, MediaInfo, VideoStreamInfo};
pub use progress::FfmpegProgress;
pub use render::{RenderRequest, RenderedVideo, Renderer, SceneClip, VideoRenderer};
pub use subtitles::{group_words, parse_srt, to_srt, write_srt_file, WordTiming};
pub use timeline::{ClipFit, KenBurns, SceneSlot, Timeline, ZoomDirection};
pub use transcribe::{Transcriber, WhisperCli, WhisperConfig};
pub use tts::{EdgeTts, SpeechSynthesizer, TtsConfig};
