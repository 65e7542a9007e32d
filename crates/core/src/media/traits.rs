//! Trait definitions for the media module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::job::JobContext;

use super::error::MediaError;

/// Turns a raw recording into clean, loudness-normalized speech audio.
#[async_trait]
pub trait AudioEnhancer: Send + Sync {
    /// Returns the name of this implementation.
    fn name(&self) -> &str;

    /// Enhance `input` and return the path of the enhanced audio.
    async fn enhance(&self, ctx: &JobContext, input: &Path) -> Result<PathBuf, MediaError>;
}

/// Builds the final video from enhanced audio and stock footage.
#[async_trait]
pub trait VideoComposer: Send + Sync {
    /// Returns the name of this implementation.
    fn name(&self) -> &str;

    /// Compose a video covering the whole of `audio`, looping `clips` as
    /// needed, with `title` overlaid at the start.
    async fn compose(
        &self,
        ctx: &JobContext,
        audio: &Path,
        clips: &[PathBuf],
        title: &str,
    ) -> Result<PathBuf, MediaError>;
}
