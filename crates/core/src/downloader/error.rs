//! Error types for audio acquisition.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while acquiring source audio.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The reference is empty or unusable.
    #[error("Invalid audio reference: {0}")]
    InvalidReference(String),

    /// The download did not finish in time.
    #[error("Audio download timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// HTTP transfer failed.
    #[error("Audio download failed: {0}")]
    Http(String),

    /// yt-dlp binary not found.
    #[error("yt-dlp not found at path: {path}")]
    ToolNotFound { path: PathBuf },

    /// yt-dlp exited with an error.
    #[error("yt-dlp failed: {reason}")]
    ToolFailed { reason: String },

    /// The tool reported success but produced no file.
    #[error("Downloaded audio file not found for job {job_id}")]
    OutputMissing { job_id: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
