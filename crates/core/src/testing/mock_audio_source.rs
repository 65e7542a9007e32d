//! Mock audio source for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::downloader::{AudioSource, DownloadError};
use crate::job::JobContext;

use super::artifact_path;

/// A recorded acquisition for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAcquisition {
    pub job_id: String,
    pub reference: String,
}

/// Mock implementation of the AudioSource trait.
///
/// Provides controllable behavior for testing:
/// - Track acquisitions for assertions
/// - Simulate failure or a panicking task
/// - Simulate download latency
/// - Write placeholder files so cleanup can be observed
///
/// # Example
///
/// ```rust,ignore
/// use talkreel_core::testing::MockAudioSource;
///
/// let source = MockAudioSource::new().with_output_dir(dir.path());
/// source.set_next_error(DownloadError::Timeout { timeout_secs: 600 }).await;
/// ```
#[derive(Debug, Default)]
pub struct MockAudioSource {
    acquisitions: Arc<RwLock<Vec<RecordedAcquisition>>>,
    next_error: Arc<RwLock<Option<DownloadError>>>,
    delay_ms: Arc<RwLock<u64>>,
    panic_next: AtomicBool,
    output_dir: Option<PathBuf>,
}

impl MockAudioSource {
    /// Create a new mock audio source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a placeholder file per acquisition into `dir`.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Get all recorded acquisitions.
    pub async fn recorded_acquisitions(&self) -> Vec<RecordedAcquisition> {
        self.acquisitions.read().await.clone()
    }

    /// Get the number of acquisitions performed.
    pub async fn acquisition_count(&self) -> usize {
        self.acquisitions.read().await.len()
    }

    /// Configure the next acquisition to fail with the given error.
    pub async fn set_next_error(&self, error: DownloadError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the simulated download duration.
    pub async fn set_delay(&self, duration: Duration) {
        *self.delay_ms.write().await = duration.as_millis() as u64;
    }

    /// Make the next acquisition panic.
    pub fn panic_next(&self) {
        self.panic_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AudioSource for MockAudioSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn acquire(&self, ctx: &JobContext, reference: &str) -> Result<PathBuf, DownloadError> {
        self.acquisitions.write().await.push(RecordedAcquisition {
            job_id: ctx.job_id.clone(),
            reference: reference.to_string(),
        });

        let delay_ms = *self.delay_ms.read().await;
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        if self.panic_next.swap(false, Ordering::SeqCst) {
            panic!("mock audio source panicked");
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let ext = reference.rsplit_once('.').map(|(_, e)| e).unwrap_or("wav");
        Ok(artifact_path(&self.output_dir, ctx, &format!("raw.{}", ext)).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_and_returns_job_scoped_path() {
        let source = MockAudioSource::new();
        let path = source
            .acquire(&JobContext::new("abc"), "a.wav")
            .await
            .unwrap();
        assert!(path.ends_with("abc_raw.wav"));
        assert_eq!(source.acquisition_count().await, 1);
        assert_eq!(source.recorded_acquisitions().await[0].reference, "a.wav");
    }

    #[tokio::test]
    async fn test_error_injection_is_one_shot() {
        let source = MockAudioSource::new();
        source
            .set_next_error(DownloadError::Timeout { timeout_secs: 600 })
            .await;

        let ctx = JobContext::new("abc");
        assert!(source.acquire(&ctx, "a.wav").await.is_err());
        assert!(source.acquire(&ctx, "a.wav").await.is_ok());
    }

    #[tokio::test]
    async fn test_writes_placeholder_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = MockAudioSource::new().with_output_dir(dir.path());
        let path = source
            .acquire(&JobContext::new("abc"), "talk.mp3")
            .await
            .unwrap();
        assert!(path.exists());
        assert!(path.ends_with("abc_raw.mp3"));
    }
}
