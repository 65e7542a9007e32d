//! Types for the pipeline orchestrator.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::downloader::AudioSource;
use crate::job::JobError;
use crate::media::{AudioEnhancer, VideoComposer};
use crate::publisher::{Channel, Publisher};
use crate::stock::StockFootage;
use crate::thumbnail::ThumbnailGenerator;

use super::config::OrchestratorConfig;

/// Errors that can occur during orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The submission was rejected before a job was created.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Job store error.
    #[error("job store error: {0}")]
    Job(#[from] JobError),
}

/// Parameters of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRequest {
    /// Direct audio link or any page yt-dlp understands.
    pub audio_reference: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub stock_clip_count: u32,
    pub generate_thumbnail: bool,
    #[serde(default)]
    pub thumbnail_prompt: Option<String>,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

impl PipelineRequest {
    /// A request using the configured defaults for everything but the
    /// audio and title.
    pub fn new(
        audio_reference: impl Into<String>,
        title: impl Into<String>,
        config: &OrchestratorConfig,
    ) -> Self {
        Self {
            audio_reference: audio_reference.into(),
            title: title.into(),
            description: None,
            stock_clip_count: config.default_stock_clip_count,
            generate_thumbnail: config.generate_thumbnail_by_default,
            thumbnail_prompt: None,
            channels: config.default_channels.clone(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_stock_clip_count(mut self, count: u32) -> Self {
        self.stock_clip_count = count;
        self
    }

    pub fn with_thumbnail(mut self, generate: bool, prompt: Option<String>) -> Self {
        self.generate_thumbnail = generate;
        self.thumbnail_prompt = prompt;
        self
    }

    pub fn with_channels(mut self, channels: Vec<Channel>) -> Self {
        self.channels = channels;
        self
    }

    /// Check the request against `config` and return its normalized form:
    /// trimmed text, blank optionals dropped, duplicate channels collapsed.
    pub fn validate(self, config: &OrchestratorConfig) -> Result<Self, OrchestratorError> {
        let audio_reference = self.audio_reference.trim().to_string();
        if audio_reference.is_empty() {
            return Err(OrchestratorError::InvalidRequest(
                "audio reference is required".to_string(),
            ));
        }

        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(OrchestratorError::InvalidRequest(
                "title is required".to_string(),
            ));
        }

        if self.stock_clip_count == 0 || self.stock_clip_count > config.max_stock_clip_count {
            return Err(OrchestratorError::InvalidRequest(format!(
                "stock_clip_count must be between 1 and {}, got {}",
                config.max_stock_clip_count, self.stock_clip_count
            )));
        }

        let mut channels = Vec::with_capacity(self.channels.len());
        for channel in self.channels {
            if !channels.contains(&channel) {
                channels.push(channel);
            }
        }

        Ok(Self {
            audio_reference,
            title,
            description: non_blank(self.description),
            stock_clip_count: self.stock_clip_count,
            generate_thumbnail: self.generate_thumbnail,
            thumbnail_prompt: non_blank(self.thumbnail_prompt),
            channels,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// The collaborators a pipeline run calls into.
#[derive(Clone)]
pub struct PipelineServices {
    pub audio_source: Arc<dyn AudioSource>,
    pub enhancer: Arc<dyn AudioEnhancer>,
    pub stock: Arc<dyn StockFootage>,
    pub thumbnails: Arc<dyn ThumbnailGenerator>,
    pub composer: Arc<dyn VideoComposer>,
    pub publishers: HashMap<Channel, Arc<dyn Publisher>>,
}

impl PipelineServices {
    pub fn new(
        audio_source: Arc<dyn AudioSource>,
        enhancer: Arc<dyn AudioEnhancer>,
        stock: Arc<dyn StockFootage>,
        thumbnails: Arc<dyn ThumbnailGenerator>,
        composer: Arc<dyn VideoComposer>,
    ) -> Self {
        Self {
            audio_source,
            enhancer,
            stock,
            thumbnails,
            composer,
            publishers: HashMap::new(),
        }
    }

    /// Register a publisher under the channel it serves.
    pub fn with_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publishers.insert(publisher.channel(), publisher);
        self
    }
}

/// Number of jobs in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounts {
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Jobs whose pipeline task has not finished yet.
    pub active_jobs: Vec<String>,
    /// Jobs by status.
    pub counts: JobCounts,
    /// Channels with a registered publisher.
    pub channels: Vec<Channel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OrchestratorConfig {
        OrchestratorConfig::default()
    }

    #[test]
    fn test_new_uses_config_defaults() {
        let request = PipelineRequest::new("a.wav", "Talk 1", &config());
        assert_eq!(request.stock_clip_count, 5);
        assert!(request.generate_thumbnail);
        assert_eq!(request.channels, vec![Channel::Telegram]);
    }

    #[test]
    fn test_validate_normalizes() {
        let request = PipelineRequest::new("  a.wav ", " Talk 1 ", &config())
            .with_description("   ")
            .with_thumbnail(true, Some("".to_string()))
            .with_channels(vec![Channel::YouTube, Channel::Telegram, Channel::YouTube]);

        let valid = request.validate(&config()).unwrap();
        assert_eq!(valid.audio_reference, "a.wav");
        assert_eq!(valid.title, "Talk 1");
        assert_eq!(valid.description, None);
        assert_eq!(valid.thumbnail_prompt, None);
        assert_eq!(valid.channels, vec![Channel::YouTube, Channel::Telegram]);
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let err = PipelineRequest::new(" ", "Talk", &config())
            .validate(&config())
            .unwrap_err();
        assert!(err.to_string().contains("audio reference"));

        let err = PipelineRequest::new("a.wav", "", &config())
            .validate(&config())
            .unwrap_err();
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn test_validate_clip_count_bounds() {
        for count in [0, 21] {
            let err = PipelineRequest::new("a.wav", "T", &config())
                .with_stock_clip_count(count)
                .validate(&config())
                .unwrap_err();
            assert!(matches!(err, OrchestratorError::InvalidRequest(_)));
        }

        assert!(PipelineRequest::new("a.wav", "T", &config())
            .with_stock_clip_count(20)
            .validate(&config())
            .is_ok());
    }

    #[test]
    fn test_status_serialization() {
        let status = OrchestratorStatus {
            active_jobs: vec!["abc".to_string()],
            counts: JobCounts {
                running: 1,
                ..Default::default()
            },
            channels: vec![Channel::Telegram],
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["active_jobs"][0], "abc");
        assert_eq!(json["counts"]["running"], 1);
        assert_eq!(json["channels"][0], "telegram");
    }
}
