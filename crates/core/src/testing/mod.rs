//! Testing utilities and mock implementations for pipeline tests.
//!
//! This module provides mock implementations of every collaborator trait,
//! allowing full pipeline runs without ffmpeg, yt-dlp or network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use talkreel_core::testing::fixtures::MockPipeline;
//!
//! let mocks = MockPipeline::new();
//! mocks.thumbnails.set_next_error(ThumbnailError::NotConfigured("no key".into())).await;
//!
//! let orchestrator = PipelineOrchestrator::new(config, store, mocks.services());
//! ```

mod mock_audio_source;
mod mock_media;
mod mock_publisher;
mod mock_stock;
mod mock_thumbnail;

pub use mock_audio_source::{MockAudioSource, RecordedAcquisition};
pub use mock_media::{MockComposer, MockEnhancer, RecordedComposition};
pub use mock_publisher::{MockPublisher, RecordedPublication};
pub use mock_stock::MockStockFootage;
pub use mock_thumbnail::{MockThumbnailGenerator, RecordedThumbnail};

use std::path::PathBuf;

use crate::job::JobContext;

/// Path of a mock artifact. With an output dir the file is actually written,
/// so tests can watch cleanup remove it.
async fn artifact_path(output_dir: &Option<PathBuf>, ctx: &JobContext, suffix: &str) -> PathBuf {
    let name = ctx.artifact_name(suffix);
    match output_dir {
        Some(dir) => {
            let path = dir.join(name);
            if let Err(e) = tokio::fs::write(&path, b"mock").await {
                tracing::warn!(path = %path.display(), error = %e, "Failed to write mock artifact");
            }
            path
        }
        None => std::env::temp_dir().join("talkreel-mock").join(name),
    }
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use super::{
        MockAudioSource, MockComposer, MockEnhancer, MockPublisher, MockStockFootage,
        MockThumbnailGenerator,
    };
    use crate::job::{Job, JobStore};
    use crate::orchestrator::{OrchestratorConfig, PipelineRequest, PipelineServices};
    use crate::publisher::Channel;

    /// One mock per collaborator, with handles kept for configuration and
    /// assertions after they are handed to an orchestrator.
    pub struct MockPipeline {
        pub audio_source: Arc<MockAudioSource>,
        pub enhancer: Arc<MockEnhancer>,
        pub stock: Arc<MockStockFootage>,
        pub thumbnails: Arc<MockThumbnailGenerator>,
        pub composer: Arc<MockComposer>,
        pub telegram: Arc<MockPublisher>,
        pub youtube: Arc<MockPublisher>,
    }

    impl MockPipeline {
        /// Mocks that return paths without touching the filesystem.
        pub fn new() -> Self {
            Self {
                audio_source: Arc::new(MockAudioSource::new()),
                enhancer: Arc::new(MockEnhancer::new()),
                stock: Arc::new(MockStockFootage::new()),
                thumbnails: Arc::new(MockThumbnailGenerator::new()),
                composer: Arc::new(MockComposer::new()),
                telegram: Arc::new(MockPublisher::new(Channel::Telegram)),
                youtube: Arc::new(MockPublisher::new(Channel::YouTube)),
            }
        }

        /// Mocks that write every artifact they return into `dir`.
        pub fn with_output_dir(dir: &Path) -> Self {
            Self {
                audio_source: Arc::new(MockAudioSource::new().with_output_dir(dir)),
                enhancer: Arc::new(MockEnhancer::new().with_output_dir(dir)),
                stock: Arc::new(MockStockFootage::new().with_output_dir(dir)),
                thumbnails: Arc::new(MockThumbnailGenerator::new().with_output_dir(dir)),
                composer: Arc::new(MockComposer::new().with_output_dir(dir)),
                telegram: Arc::new(MockPublisher::new(Channel::Telegram)),
                youtube: Arc::new(MockPublisher::new(Channel::YouTube)),
            }
        }

        /// Services with publishers for both channels.
        pub fn services(&self) -> PipelineServices {
            self.services_without_publishers()
                .with_publisher(self.telegram.clone())
                .with_publisher(self.youtube.clone())
        }

        /// Services with no publisher registered.
        pub fn services_without_publishers(&self) -> PipelineServices {
            PipelineServices::new(
                self.audio_source.clone(),
                self.enhancer.clone(),
                self.stock.clone(),
                self.thumbnails.clone(),
                self.composer.clone(),
            )
        }
    }

    impl Default for MockPipeline {
        fn default() -> Self {
            Self::new()
        }
    }

    /// A request for `audio` under `title` with the default config, three
    /// clips, a thumbnail and Telegram only.
    pub fn request(audio: &str, title: &str) -> PipelineRequest {
        PipelineRequest::new(audio, title, &OrchestratorConfig::default())
            .with_stock_clip_count(3)
            .with_thumbnail(true, None)
            .with_channels(vec![Channel::Telegram])
    }

    /// Poll the store until the job is terminal or `timeout` passes.
    pub async fn wait_for_terminal(
        store: &dyn JobStore,
        job_id: &str,
        timeout: Duration,
    ) -> Option<Job> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Ok(Some(job)) = store.get(job_id) {
                if job.is_terminal() {
                    return Some(job);
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}
