//! Trait definitions for thumbnail generation.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::job::JobContext;

use super::error::ThumbnailError;

/// Produces a cover image for a talk.
#[async_trait]
pub trait ThumbnailGenerator: Send + Sync {
    /// Returns the name of this implementation.
    fn name(&self) -> &str;

    /// Generate an image for `title`. A non-empty `prompt` replaces the
    /// default prompt.
    async fn generate(
        &self,
        ctx: &JobContext,
        title: &str,
        prompt: Option<&str>,
    ) -> Result<PathBuf, ThumbnailError>;
}
