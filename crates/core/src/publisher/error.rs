//! Error types for publication channels.

use std::path::PathBuf;
use thiserror::Error;

use super::traits::Channel;

/// Errors that can occur while publishing to a channel.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Credentials for the channel are missing.
    #[error("{channel} not configured: {reason}")]
    NotConfigured { channel: Channel, reason: String },

    /// The channel has not been authorized for this account.
    #[error("{channel} not authorized: {reason}")]
    NotAuthorized { channel: Channel, reason: String },

    /// The video or thumbnail to upload does not exist.
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The channel rejected the file because of its size.
    #[error("File too large for {channel}: {message}")]
    TooLarge { channel: Channel, message: String },

    /// The channel API returned an error.
    #[error("{channel} upload failed (HTTP {status}): {message}")]
    Upload {
        channel: Channel,
        status: u16,
        message: String,
    },

    /// The upload did not finish in time.
    #[error("{channel} upload timed out after {timeout_secs} seconds")]
    Timeout { channel: Channel, timeout_secs: u64 },

    /// Network failure or an unusable response.
    #[error("{channel} request failed: {message}")]
    Request { channel: Channel, message: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
