//! Error types for thumbnail generation.

use thiserror::Error;

/// Errors that can occur while generating a thumbnail.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    /// The image provider has no credentials.
    #[error("Thumbnail generator not configured: {0}")]
    NotConfigured(String),

    /// The provider rejected the request.
    #[error("Image API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request did not finish in time.
    #[error("Image generation timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The provider's response could not be used.
    #[error("Invalid image API response: {0}")]
    InvalidResponse(String),

    /// The generated image could not be downloaded.
    #[error("Failed to download generated image: {0}")]
    Download(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
