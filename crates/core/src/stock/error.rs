//! Error types for stock footage sourcing.

use thiserror::Error;

/// Errors that can occur while sourcing stock footage.
#[derive(Debug, Error)]
pub enum StockError {
    /// The provider has no credentials.
    #[error("Stock footage provider not configured: {0}")]
    NotConfigured(String),

    /// Nothing usable could be downloaded.
    #[error("No stock footage found: {0}")]
    NoFootage(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
