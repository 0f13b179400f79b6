//! Running external CLI tools (edge-tts, whisper).

use std::ffi::OsStr;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::command::check_tool;
use crate::error::{MediaError, MediaResult};

/// Run `program` to completion, failing on a non-zero exit.
pub async fn run_tool<I, S>(program: &str, args: I, timeout: Duration) -> MediaResult<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    check_tool(program)?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("Running {}: {:?}", program, cmd.as_std());

    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| MediaError::Timeout(timeout))??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(MediaError::tool_failed(
            program,
            format!("exited with {}", output.status),
            Some(stderr),
        ));
    }

    Ok(output)
}
