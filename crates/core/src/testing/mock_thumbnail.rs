//! Mock thumbnail generator for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::job::JobContext;
use crate::thumbnail::{ThumbnailError, ThumbnailGenerator};

use super::artifact_path;

/// A recorded generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedThumbnail {
    pub job_id: String,
    pub title: String,
    pub prompt: Option<String>,
}

/// Mock implementation of the ThumbnailGenerator trait.
#[derive(Debug, Default)]
pub struct MockThumbnailGenerator {
    requests: Arc<RwLock<Vec<RecordedThumbnail>>>,
    next_error: Arc<RwLock<Option<ThumbnailError>>>,
    delay_ms: Arc<RwLock<u64>>,
    output_dir: Option<PathBuf>,
}

impl MockThumbnailGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub async fn recorded_requests(&self) -> Vec<RecordedThumbnail> {
        self.requests.read().await.clone()
    }

    pub async fn set_next_error(&self, error: ThumbnailError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn set_delay(&self, duration: Duration) {
        *self.delay_ms.write().await = duration.as_millis() as u64;
    }
}

#[async_trait]
impl ThumbnailGenerator for MockThumbnailGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        ctx: &JobContext,
        title: &str,
        prompt: Option<&str>,
    ) -> Result<PathBuf, ThumbnailError> {
        self.requests.write().await.push(RecordedThumbnail {
            job_id: ctx.job_id.clone(),
            title: title.to_string(),
            prompt: prompt.map(str::to_string),
        });

        let delay_ms = *self.delay_ms.read().await;
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        Ok(artifact_path(&self.output_dir, ctx, "thumbnail.png").await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_prompt() {
        let generator = MockThumbnailGenerator::new();
        generator
            .generate(&JobContext::new("j"), "Talk", Some("lotus"))
            .await
            .unwrap();
        let requests = generator.recorded_requests().await;
        assert_eq!(requests[0].prompt.as_deref(), Some("lotus"));
    }

    #[tokio::test]
    async fn test_error_injection() {
        let generator = MockThumbnailGenerator::new();
        generator
            .set_next_error(ThumbnailError::NotConfigured("no key".to_string()))
            .await;
        assert!(generator
            .generate(&JobContext::new("j"), "Talk", None)
            .await
            .is_err());
    }
}
