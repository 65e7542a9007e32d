//! Trait definitions for audio acquisition.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::job::JobContext;

use super::error::DownloadError;

/// Fetches the source audio of a talk into a local file.
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Returns the name of this implementation.
    fn name(&self) -> &str;

    /// Acquire the audio behind `reference` and return the local path.
    async fn acquire(&self, ctx: &JobContext, reference: &str) -> Result<PathBuf, DownloadError>;
}
