//! Mock publisher for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::job::JobContext;
use crate::publisher::{Channel, PublishError, PublishRequest, Publisher};

/// A recorded publication for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedPublication {
    pub job_id: String,
    pub request: PublishRequest,
    pub success: bool,
}

/// Mock implementation of the Publisher trait for one channel.
///
/// On success returns the same kind of descriptor the real channel would:
/// a message confirmation for Telegram, a watch URL for YouTube.
#[derive(Debug)]
pub struct MockPublisher {
    channel: Channel,
    publications: Arc<RwLock<Vec<RecordedPublication>>>,
    next_error: Arc<RwLock<Option<PublishError>>>,
    delay_ms: Arc<RwLock<u64>>,
    panic_next: AtomicBool,
}

impl MockPublisher {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            publications: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            delay_ms: Arc::new(RwLock::new(0)),
            panic_next: AtomicBool::new(false),
        }
    }

    pub async fn recorded_publications(&self) -> Vec<RecordedPublication> {
        self.publications.read().await.clone()
    }

    pub async fn publication_count(&self) -> usize {
        self.publications.read().await.len()
    }

    pub async fn set_next_error(&self, error: PublishError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn set_delay(&self, duration: Duration) {
        *self.delay_ms.write().await = duration.as_millis() as u64;
    }

    /// Make the next publish panic.
    pub fn panic_next(&self) {
        self.panic_next.store(true, Ordering::SeqCst);
    }

    fn descriptor(&self, ctx: &JobContext) -> String {
        match self.channel {
            Channel::Telegram => format!("Telegram message sent: {}", ctx.job_id.len()),
            Channel::YouTube => format!("https://www.youtube.com/watch?v=mock{}", ctx.job_id),
        }
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn publish(
        &self,
        ctx: &JobContext,
        request: &PublishRequest,
    ) -> Result<String, PublishError> {
        let delay_ms = *self.delay_ms.read().await;
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        if self.panic_next.swap(false, Ordering::SeqCst) {
            panic!("mock {} publisher panicked", self.channel);
        }

        let error = self.next_error.write().await.take();
        self.publications.write().await.push(RecordedPublication {
            job_id: ctx.job_id.clone(),
            request: request.clone(),
            success: error.is_none(),
        });

        match error {
            Some(err) => Err(err),
            None => Ok(self.descriptor(ctx)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn request() -> PublishRequest {
        PublishRequest {
            video_path: PathBuf::from("/out/j_talk.mp4"),
            title: "Talk".to_string(),
            description: None,
            thumbnail: None,
        }
    }

    #[tokio::test]
    async fn test_descriptors() {
        let ctx = JobContext::new("abc");
        let telegram = MockPublisher::new(Channel::Telegram);
        let youtube = MockPublisher::new(Channel::YouTube);

        assert!(telegram
            .publish(&ctx, &request())
            .await
            .unwrap()
            .starts_with("Telegram message sent: "));
        assert_eq!(
            youtube.publish(&ctx, &request()).await.unwrap(),
            "https://www.youtube.com/watch?v=mockabc"
        );
    }

    #[tokio::test]
    async fn test_failed_publication_is_recorded() {
        let publisher = MockPublisher::new(Channel::YouTube);
        publisher
            .set_next_error(PublishError::Upload {
                channel: Channel::YouTube,
                status: 403,
                message: "quota exceeded".to_string(),
            })
            .await;

        assert!(publisher
            .publish(&JobContext::new("j"), &request())
            .await
            .is_err());
        let recorded = publisher.recorded_publications().await;
        assert_eq!(recorded.len(), 1);
        assert!(!recorded[0].success);
    }
}
