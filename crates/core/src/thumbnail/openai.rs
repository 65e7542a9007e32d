//! OpenAI images API backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tokio::time::Duration;
use tracing::{debug, info};

use crate::config::ThumbnailConfig;
use crate::fetch::{body_excerpt, download_to_file, FetchFailure};
use crate::job::JobContext;
use crate::metrics;

use super::error::ThumbnailError;
use super::traits::ThumbnailGenerator;

/// Prompt used when the submission does not provide one. `{title}` is
/// replaced with the talk title.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "A stunning YouTube thumbnail for a Burmese Buddhist \
Dhamma talk titled \"{title}\". Feature the golden Shwedagon Pagoda at sunset with warm golden \
light rays, a serene Buddha statue in meditation pose, Myanmar Buddhist temple architecture, \
soft lotus flowers, and a peaceful spiritual atmosphere. Cinematic lighting, 16:9 aspect ratio, \
photorealistic, warm gold and maroon color palette, no text overlays.";

/// The prompt sent to the image model.
pub fn build_prompt(title: &str, custom: Option<&str>) -> String {
    match custom.map(str::trim) {
        Some(prompt) if !prompt.is_empty() => prompt.to_string(),
        _ => DEFAULT_PROMPT_TEMPLATE.replace("{title}", title),
    }
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    quality: &'a str,
    style: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

/// Thumbnail generator backed by the OpenAI images endpoint.
pub struct OpenAiThumbnailGenerator {
    client: Client,
    config: ThumbnailConfig,
    thumbnails_dir: PathBuf,
}

impl OpenAiThumbnailGenerator {
    pub fn new(config: ThumbnailConfig, thumbnails_dir: PathBuf) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            config,
            thumbnails_dir,
        }
    }

    async fn request_image(&self, api_key: &str, prompt: &str) -> Result<String, ThumbnailError> {
        let body = ImageRequest {
            model: &self.config.model,
            prompt,
            n: 1,
            size: &self.config.size,
            quality: "hd",
            style: "vivid",
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| match FetchFailure::from(e) {
                FetchFailure::Timeout => ThumbnailError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                },
                other => ThumbnailError::InvalidResponse(other.to_string()),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ThumbnailError::Api {
                status: status.as_u16(),
                message: body_excerpt(&body),
            });
        }

        let parsed: ImageResponse = response
            .json()
            .await
            .map_err(|e| ThumbnailError::InvalidResponse(e.to_string()))?;

        parsed
            .data
            .into_iter()
            .find_map(|d| d.url)
            .ok_or_else(|| ThumbnailError::InvalidResponse("no image URL returned".to_string()))
    }
}

#[async_trait]
impl ThumbnailGenerator for OpenAiThumbnailGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        ctx: &JobContext,
        title: &str,
        prompt: Option<&str>,
    ) -> Result<PathBuf, ThumbnailError> {
        let api_key = match self.config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key,
            _ => {
                return Err(ThumbnailError::NotConfigured(
                    "OpenAI API key is not set".to_string(),
                ))
            }
        };

        let prompt = build_prompt(title, prompt);
        debug!(job_id = %ctx.job_id, model = %self.config.model, "Requesting thumbnail image");

        let start = Instant::now();
        let result = self.request_image(api_key, &prompt).await;
        metrics::record_external_call(
            "openai",
            "generate_image",
            result.is_ok(),
            start.elapsed().as_secs_f64(),
        );
        let image_url = result?;

        tokio::fs::create_dir_all(&self.thumbnails_dir).await?;
        let dest = self.thumbnails_dir.join(ctx.artifact_name("thumbnail.png"));
        download_to_file(&self.client, "openai", &image_url, &dest)
            .await
            .map_err(|e| ThumbnailError::Download(e.to_string()))?;

        info!(job_id = %ctx.job_id, path = %dest.display(), "Thumbnail generated");
        Ok(dest)
    }
}
