//! Mock stock footage provider for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::job::JobContext;
use crate::stock::{StockError, StockFootage};

use super::artifact_path;

/// Mock implementation of the StockFootage trait.
///
/// Returns one clip per requested clip unless a clip limit is set, which
/// lets tests simulate a provider that finds less than asked for (or
/// nothing at all).
#[derive(Debug, Default)]
pub struct MockStockFootage {
    requests: Arc<RwLock<Vec<u32>>>,
    next_error: Arc<RwLock<Option<StockError>>>,
    clip_limit: Arc<RwLock<Option<u32>>>,
    delay_ms: Arc<RwLock<u64>>,
    output_dir: Option<PathBuf>,
}

impl MockStockFootage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Clip counts requested, in call order.
    pub async fn recorded_requests(&self) -> Vec<u32> {
        self.requests.read().await.clone()
    }

    pub async fn set_next_error(&self, error: StockError) {
        *self.next_error.write().await = Some(error);
    }

    /// Return at most `limit` clips per fetch.
    pub async fn set_clip_limit(&self, limit: u32) {
        *self.clip_limit.write().await = Some(limit);
    }

    pub async fn set_delay(&self, duration: Duration) {
        *self.delay_ms.write().await = duration.as_millis() as u64;
    }
}

#[async_trait]
impl StockFootage for MockStockFootage {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, ctx: &JobContext, count: u32) -> Result<Vec<PathBuf>, StockError> {
        self.requests.write().await.push(count);

        let delay_ms = *self.delay_ms.read().await;
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let returned = match *self.clip_limit.read().await {
            Some(limit) => count.min(limit),
            None => count,
        };

        let mut clips = Vec::with_capacity(returned as usize);
        for i in 0..returned {
            clips.push(artifact_path(&self.output_dir, ctx, &format!("stock_{:02}.mp4", i)).await);
        }
        Ok(clips)
    }
}
