//! Mock enhancer and composer for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::job::JobContext;
use crate::media::{AudioEnhancer, MediaError, VideoComposer};

use super::artifact_path;

/// Mock implementation of the AudioEnhancer trait.
#[derive(Debug, Default)]
pub struct MockEnhancer {
    inputs: Arc<RwLock<Vec<PathBuf>>>,
    next_error: Arc<RwLock<Option<MediaError>>>,
    delay_ms: Arc<RwLock<u64>>,
    output_dir: Option<PathBuf>,
}

impl MockEnhancer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Inputs passed to `enhance`, in call order.
    pub async fn recorded_inputs(&self) -> Vec<PathBuf> {
        self.inputs.read().await.clone()
    }

    pub async fn set_next_error(&self, error: MediaError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn set_delay(&self, duration: Duration) {
        *self.delay_ms.write().await = duration.as_millis() as u64;
    }
}

#[async_trait]
impl AudioEnhancer for MockEnhancer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn enhance(&self, ctx: &JobContext, input: &Path) -> Result<PathBuf, MediaError> {
        self.inputs.write().await.push(input.to_path_buf());

        let delay_ms = *self.delay_ms.read().await;
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        Ok(artifact_path(&self.output_dir, ctx, "enhanced.wav").await)
    }
}

/// A recorded composition for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedComposition {
    pub job_id: String,
    pub audio: PathBuf,
    pub clips: Vec<PathBuf>,
    pub title: String,
}

/// Mock implementation of the VideoComposer trait.
#[derive(Debug, Default)]
pub struct MockComposer {
    compositions: Arc<RwLock<Vec<RecordedComposition>>>,
    next_error: Arc<RwLock<Option<MediaError>>>,
    delay_ms: Arc<RwLock<u64>>,
    output_dir: Option<PathBuf>,
}

impl MockComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub async fn recorded_compositions(&self) -> Vec<RecordedComposition> {
        self.compositions.read().await.clone()
    }

    pub async fn set_next_error(&self, error: MediaError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn set_delay(&self, duration: Duration) {
        *self.delay_ms.write().await = duration.as_millis() as u64;
    }
}

#[async_trait]
impl VideoComposer for MockComposer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn compose(
        &self,
        ctx: &JobContext,
        audio: &Path,
        clips: &[PathBuf],
        title: &str,
    ) -> Result<PathBuf, MediaError> {
        self.compositions.write().await.push(RecordedComposition {
            job_id: ctx.job_id.clone(),
            audio: audio.to_path_buf(),
            clips: clips.to_vec(),
            title: title.to_string(),
        });

        let delay_ms = *self.delay_ms.read().await;
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        Ok(artifact_path(&self.output_dir, ctx, "talk.mp4").await)
    }
}
