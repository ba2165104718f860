//! External tool abstractions: the video downloader and the media trimmer.
//!
//! Both tools are separate processes. Each invocation is bounded by a timeout
//! and a non-zero exit status is reported as [`ToolError::Exit`].

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

pub mod ffmpeg;
pub mod ytdlp;

pub use ffmpeg::Ffmpeg;
pub use ytdlp::YtDlp;

/// How much stderr is kept in an error message.
const STDERR_TAIL: usize = 2048;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {}: {stderr}", .code.map(|c| c.to_string()).unwrap_or_else(|| "signal".into()))]
    Exit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("{program} timed out after {}s", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },
    #[error("{program} reported success but produced no output at {path}")]
    MissingOutput { program: String, path: String },
}

#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    /// Fetches the best video+audio for `url` into a single MP4 at `dest`.
    async fn download(&self, url: &str, dest: &Path) -> Result<(), ToolError>;
}

#[async_trait::async_trait]
pub trait Trimmer: Send + Sync {
    /// Cuts `[start, end]` out of `source` into `dest` without re-encoding.
    /// Timestamps are `HH:MM:SS.mmm`.
    async fn trim(&self, source: &Path, start: &str, end: &str, dest: &Path)
        -> Result<(), ToolError>;
}

/// Runs `program args..` to completion, killing it if `timeout` elapses.
pub async fn run_tool(program: &str, args: &[String], timeout: Duration) -> Result<(), ToolError> {
    debug!(program, ?args, "running external tool");
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(res) => res.map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        })?,
        Err(_) => {
            return Err(ToolError::Timeout {
                program: program.to_string(),
                timeout,
            })
        }
    };

    if output.status.success() {
        return Ok(());
    }
    Err(ToolError::Exit {
        program: program.to_string(),
        code: output.status.code(),
        stderr: stderr_tail(&output.stderr),
    })
}

fn stderr_tail(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim();
    if trimmed.len() <= STDERR_TAIL {
        return trimmed.to_string();
    }
    let mut cut = trimmed.len() - STDERR_TAIL;
    while !trimmed.is_char_boundary(cut) {
        cut += 1;
    }
    format!("...{}", &trimmed[cut..])
}
