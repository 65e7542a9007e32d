//! Error types for the media module.

use std::path::PathBuf;
use thiserror::Error;

use crate::process::ToolFailure;

/// Errors that can occur during enhancement or composition.
#[derive(Debug, Error)]
pub enum MediaError {
    /// A required binary was not found.
    #[error("Tool not found at path: {path}")]
    ToolNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// The tool did not finish in time.
    #[error("{operation} timed out after {timeout_secs} seconds")]
    Timeout {
        operation: String,
        timeout_secs: u64,
    },

    /// The tool exited with an error.
    #[error("{operation} failed: {reason}")]
    ToolFailed { operation: String, reason: String },

    /// Could not read the audio duration.
    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// Composition was asked to run without any footage.
    #[error("No footage clips to compose")]
    NoFootage,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    pub(crate) fn from_tool(operation: &str, failure: ToolFailure) -> Self {
        match failure {
            ToolFailure::NotFound(path) => MediaError::ToolNotFound { path },
            ToolFailure::Timeout(timeout_secs) => MediaError::Timeout {
                operation: operation.to_string(),
                timeout_secs,
            },
            ToolFailure::Io(e) => MediaError::Io(e),
            ToolFailure::Exit { code, stderr } => MediaError::ToolFailed {
                operation: operation.to_string(),
                reason: format!("exit code {:?}: {}", code, stderr),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_operation() {
        let err = MediaError::from_tool("Video concat", ToolFailure::Timeout(1800));
        assert_eq!(err.to_string(), "Video concat timed out after 1800 seconds");
    }

    #[test]
    fn test_exit_failure_carries_stderr() {
        let err = MediaError::from_tool(
            "Audio enhancement",
            ToolFailure::Exit {
                code: Some(1),
                stderr: "Invalid data found".to_string(),
            },
        );
        assert!(err.to_string().contains("Invalid data found"));
    }
}
