//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use ytbot_models::EncodingConfig;

use crate::error::{MediaError, MediaResult};
use crate::progress::FfmpegProgress;

/// Stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// One `-i` input with its own input options.
#[derive(Debug, Clone)]
pub struct FfmpegInput {
    path: PathBuf,
    args: Vec<String>,
}

impl FfmpegInput {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Seek before decoding.
    pub fn seek(self, seconds: f64) -> Self {
        self.arg("-ss").arg(format!("{:.3}", seconds))
    }

    /// Limit the amount of input read.
    pub fn duration(self, seconds: f64) -> Self {
        self.arg("-t").arg(format!("{:.3}", seconds))
    }

    /// Loop the input `count` extra times (`-1` = forever).
    pub fn stream_loop(self, count: i32) -> Self {
        self.arg("-stream_loop").arg(count.to_string())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    inputs: Vec<FfmpegInput>,
    output: PathBuf,
    /// Output arguments (after all inputs)
    output_args: Vec<String>,
    overwrite: bool,
}

impl FfmpegCommand {
    /// Create a command writing to `output`. Add inputs with [`Self::input`].
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
        }
    }

    pub fn input(mut self, input: FfmpegInput) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn inputs(&self) -> &[FfmpegInput] {
        &self.inputs
    }

    /// Add an output argument.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set filter complex.
    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    /// Map a stream or filter label into the output.
    pub fn map(self, spec: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(spec)
    }

    /// Limit output duration.
    pub fn output_duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{:.3}", seconds))
    }

    pub fn frame_rate(self, fps: u32) -> Self {
        self.output_arg("-r").output_arg(fps.to_string())
    }

    /// Drop audio streams.
    pub fn no_audio(self) -> Self {
        self.output_arg("-an")
    }

    /// Stop at the shortest mapped stream.
    pub fn shortest(self) -> Self {
        self.output_arg("-shortest")
    }

    /// Apply video encoding settings only.
    pub fn video_encoding(self, encoding: &EncodingConfig) -> Self {
        self.output_args(encoding.video_args())
    }

    /// Apply video + audio encoding settings.
    pub fn encoding(self, encoding: &EncodingConfig) -> Self {
        self.output_args(encoding.to_ffmpeg_args())
    }

    /// Move the moov atom to the front for streaming playback.
    pub fn faststart(self) -> Self {
        self.output_arg("-movflags").output_arg("+faststart")
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-hide_banner".to_string());
        args.push("-nostdin".to_string());
        args.push("-v".to_string());
        args.push("error".to_string());

        // Progress on stdout keeps stderr free for diagnostics
        args.push("-progress".to_string());
        args.push("pipe:1".to_string());

        for input in &self.inputs {
            args.extend(input.args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.path.to_string_lossy().to_string());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with progress tracking and cancellation.
#[derive(Default)]
pub struct FfmpegRunner {
    cancel_rx: Option<watch::Receiver<bool>>,
    timeout: Option<Duration>,
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run an FFmpeg command with progress callback.
    pub async fn run_with_progress<F>(
        &self,
        cmd: &FfmpegCommand,
        progress_callback: F,
    ) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        check_ffmpeg()?;

        for input in cmd.inputs() {
            if !input.path().exists() {
                return Err(MediaError::FileNotFound(input.path().to_path_buf()));
            }
        }

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::ffmpeg_failed("stdout not captured", None, None))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::ffmpeg_failed("stderr not captured", None, None))?;

        let progress_handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            let mut current = FfmpegProgress::default();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(snapshot) = current.update(&line) {
                    progress_callback(snapshot);
                }
            }
        });

        let stderr_handle = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let result = self.wait_for_completion(&mut child).await;

        let _ = progress_handle.await;
        let stderr = stderr_handle.await.unwrap_or_default();

        match result {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(stderr_tail(&stderr)),
                status.code(),
            )),
            Err(e) => Err(e),
        }
    }

    /// Wait for child process with cancellation and timeout.
    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<std::process::ExitStatus> {
        let mut cancel_rx = self.cancel_rx.clone();
        let timeout = self.timeout;

        let cancelled = async {
            match cancel_rx.as_mut() {
                Some(rx) => loop {
                    if *rx.borrow() {
                        return;
                    }
                    if rx.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                },
                None => std::future::pending::<()>().await,
            }
        };

        let deadline = async {
            match timeout {
                Some(t) => tokio::time::sleep(t).await,
                None => std::future::pending::<()>().await,
            }
        };

        let outcome = tokio::select! {
            status = child.wait() => WaitOutcome::Exited(status),
            _ = cancelled => WaitOutcome::Cancelled,
            _ = deadline => WaitOutcome::TimedOut,
        };

        match outcome {
            WaitOutcome::Exited(status) => Ok(status?),
            WaitOutcome::Cancelled => {
                info!("FFmpeg cancelled, killing process");
                let _ = child.kill().await;
                Err(MediaError::Cancelled)
            }
            WaitOutcome::TimedOut => {
                let limit = timeout.unwrap_or_default();
                warn!("FFmpeg timed out after {:?}, killing process", limit);
                let _ = child.kill().await;
                Err(MediaError::Timeout(limit))
            }
        }
    }
}

enum WaitOutcome {
    Exited(std::io::Result<std::process::ExitStatus>),
    Cancelled,
    TimedOut,
}

/// Last lines of stderr, for error messages.
fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Locate a required external binary.
pub fn check_tool(name: &str) -> MediaResult<PathBuf> {
    which::which(name).map_err(|_| MediaError::tool_not_found(name))
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    check_tool("ffmpeg")
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    check_tool("ffprobe")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("out.mp4")
            .input(FfmpegInput::new("clip.mp4").stream_loop(2).seek(1.5))
            .input(FfmpegInput::new("voice.mp3"))
            .filter_complex("[0:v]null[v]")
            .map("[v]")
            .map("1:a")
            .shortest();

        let args = cmd.build_args();
        let joined = args.join(" ");
        assert!(joined.contains("-stream_loop 2 -ss 1.500 -i clip.mp4 -i voice.mp3"));
        assert!(joined.contains("-map [v] -map 1:a -shortest"));
        assert_eq!(args.last().unwrap(), "out.mp4");
        assert_eq!(args[0], "-y");
    }

    #[test]
    fn test_encoding_args() {
        let cmd = FfmpegCommand::new("out.mp4")
            .input(FfmpegInput::new("in.mp4"))
            .video_encoding(&EncodingConfig::for_intermediate())
            .no_audio();
        let args = cmd.build_args();
        assert!(args.contains(&"veryfast".to_string()));
        assert!(args.contains(&"-an".to_string()));
        assert!(!args.contains(&"-c:a".to_string()));
    }

    #[test]
    fn test_progress_goes_to_stdout() {
        let args = FfmpegCommand::new("b")
            .input(FfmpegInput::new("a"))
            .build_args();
        let idx = args.iter().position(|a| a == "-progress").unwrap();
        assert_eq!(args[idx + 1], "pipe:1");
        let level = args.iter().position(|a| a == "-v").unwrap();
        assert_eq!(args[level + 1], "error");
    }

    #[test]
    fn test_stderr_tail() {
        let stderr = (0..30).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
        let tail = stderr_tail(&stderr);
        assert!(tail.starts_with("line 10"));
        assert!(tail.ends_with("line 29"));
    }

    #[tokio::test]
    async fn test_missing_input_is_reported() {
        if check_ffmpeg().is_err() {
            return;
        }
        let cmd = FfmpegCommand::new("/tmp/out.mp4")
            .input(FfmpegInput::new("/definitely/not/here.mp4"));
        let result = FfmpegRunner::new().run_with_progress(&cmd, |_| {}).await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
