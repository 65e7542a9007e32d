//! Bounded execution of external tools (ffmpeg, ffprobe, yt-dlp).

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::metrics;

/// Captured output of a successful run.
#[derive(Debug)]
pub(crate) struct ToolOutput {
    pub stdout: String,
}

/// Why a tool run did not succeed.
#[derive(Debug, Error)]
pub(crate) enum ToolFailure {
    #[error("tool not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("timed out after {0} seconds")]
    Timeout(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("exit code {code:?}: {stderr}")]
    Exit { code: Option<i32>, stderr: String },
}

/// Run `program` with `args`, killing it if it outlives `timeout_secs`.
pub(crate) async fn run_tool<I, S>(
    program: &Path,
    args: I,
    timeout_secs: u64,
) -> Result<ToolOutput, ToolFailure>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let tool = program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string());
    let start = Instant::now();

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolFailure::NotFound(program.to_path_buf())
            } else {
                ToolFailure::Io(e)
            }
        })?;

    // Dropping the wait future on timeout drops the child, which kills it.
    let result = timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await;
    let elapsed = start.elapsed().as_secs_f64();

    let outcome = match result {
        Ok(Ok(output)) if output.status.success() => Ok(ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        }),
        Ok(Ok(output)) => Err(ToolFailure::Exit {
            code: output.status.code(),
            stderr: stderr_tail(&String::from_utf8_lossy(&output.stderr)),
        }),
        Ok(Err(e)) => Err(ToolFailure::Io(e)),
        Err(_) => Err(ToolFailure::Timeout(timeout_secs)),
    };

    debug!(tool = %tool, elapsed_secs = elapsed, ok = outcome.is_ok(), "Tool finished");
    metrics::record_external_call(&tool, "run", outcome.is_ok(), elapsed);
    outcome
}

/// Last few lines of stderr, enough to explain a failure.
fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim_end().lines().collect();
    let start = lines.len().saturating_sub(8);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let stderr = (1..=20)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("\n");
        let tail = stderr_tail(&stderr);
        assert!(tail.starts_with("line 13"));
        assert!(tail.ends_with("line 20"));
    }

    #[test]
    fn test_failure_display() {
        let failure = ToolFailure::Exit {
            code: Some(1),
            stderr: "boom".to_string(),
        };
        assert_eq!(failure.to_string(), "exit code Some(1): boom");
        assert_eq!(ToolFailure::Timeout(30).to_string(), "timed out after 30 seconds");
    }

    #[tokio::test]
    async fn test_missing_tool_is_not_found() {
        let result = run_tool(Path::new("/nonexistent/tool-xyz"), ["-version"], 5).await;
        assert!(matches!(result, Err(ToolFailure::NotFound(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_tool_success_and_exit_code() {
        let ok = run_tool(Path::new("sh"), ["-c", "echo hello"], 5).await.unwrap();
        assert_eq!(ok.stdout.trim(), "hello");

        let failed = run_tool(Path::new("sh"), ["-c", "echo bad >&2; exit 3"], 5).await;
        match failed {
            Err(ToolFailure::Exit { code, stderr }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "bad");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_tool_timeout() {
        let result = run_tool(Path::new("sleep"), ["5"], 1).await;
        assert!(matches!(result, Err(ToolFailure::Timeout(1))));
    }
}
