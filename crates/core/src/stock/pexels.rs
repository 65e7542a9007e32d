//! Pexels video search backend.

use async_trait::async_trait;
use rand::seq::{IndexedRandom, SliceRandom};
use reqwest::Client;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::config::PexelsConfig;
use crate::fetch::{body_excerpt, download_to_file, FetchFailure};
use crate::job::JobContext;
use crate::metrics;

use super::error::StockError;
use super::traits::StockFootage;

/// Pause between clip downloads to stay under the API rate limit.
const DOWNLOAD_SPACING: Duration = Duration::from_millis(500);

/// Preferred clip height.
const TARGET_HEIGHT: u32 = 1080;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    videos: Vec<PexelsVideo>,
}

#[derive(Debug, Clone, Deserialize)]
struct PexelsVideo {
    #[serde(default)]
    video_files: Vec<PexelsVideoFile>,
}

#[derive(Debug, Clone, Deserialize)]
struct PexelsVideoFile {
    link: String,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    quality: Option<String>,
}

/// Pick the rendition to download: HD/SD files of at least 720p when there
/// are any, otherwise every file, closest to 1080p.
fn choose_file(files: &[PexelsVideoFile]) -> Option<&PexelsVideoFile> {
    let hd: Vec<&PexelsVideoFile> = files
        .iter()
        .filter(|f| {
            f.height.unwrap_or(0) >= 720
                && matches!(f.quality.as_deref(), Some("hd") | Some("sd"))
        })
        .collect();

    let candidates: Vec<&PexelsVideoFile> = if hd.is_empty() {
        files.iter().collect()
    } else {
        hd
    };

    candidates
        .into_iter()
        .min_by_key(|f| f.height.unwrap_or(0).abs_diff(TARGET_HEIGHT))
}

/// Stock footage from the Pexels video API.
pub struct PexelsStockFootage {
    client: Client,
    config: PexelsConfig,
    stock_dir: PathBuf,
}

impl PexelsStockFootage {
    pub fn new(config: PexelsConfig, stock_dir: PathBuf) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            config,
            stock_dir,
        }
    }

    /// One query per clip, shuffled; queries repeat when more clips than
    /// queries are requested.
    fn plan_queries(&self, count: usize) -> Vec<String> {
        let mut queries = self.config.queries.clone();
        queries.shuffle(&mut rand::rng());
        queries.into_iter().cycle().take(count).collect()
    }

    async fn search(&self, api_key: &str, query: &str) -> Result<Vec<PexelsVideo>, String> {
        let start = Instant::now();
        let per_page = self.config.per_page.to_string();
        let result = async {
            let response = self
                .client
                .get(&self.config.api_url)
                .header("Authorization", api_key)
                .query(&[
                    ("query", query),
                    ("per_page", per_page.as_str()),
                    ("size", "large"),
                    ("orientation", "landscape"),
                ])
                .send()
                .await
                .map_err(|e| FetchFailure::from(e).to_string())?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(format!("HTTP {}: {}", status, body_excerpt(&body)));
            }

            response
                .json::<SearchResponse>()
                .await
                .map(|r| r.videos)
                .map_err(|e| format!("Failed to parse response: {}", e))
        }
        .await;

        metrics::record_external_call(
            "pexels",
            "search",
            result.is_ok(),
            start.elapsed().as_secs_f64(),
        );
        result
    }
}

#[async_trait]
impl StockFootage for PexelsStockFootage {
    fn name(&self) -> &str {
        "pexels"
    }

    async fn fetch(&self, ctx: &JobContext, count: u32) -> Result<Vec<PathBuf>, StockError> {
        let api_key = match self.config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key,
            _ => {
                return Err(StockError::NotConfigured(
                    "Pexels API key is not set".to_string(),
                ))
            }
        };
        if self.config.queries.is_empty() {
            return Err(StockError::NoFootage(
                "no search queries configured".to_string(),
            ));
        }

        tokio::fs::create_dir_all(&self.stock_dir).await?;

        let mut downloaded = Vec::new();
        let mut last_error = None;

        for (i, query) in self.plan_queries(count as usize).iter().enumerate() {
            let videos = match self.search(api_key, query).await {
                Ok(videos) => videos,
                Err(e) => {
                    warn!(job_id = %ctx.job_id, query = %query, error = %e, "Pexels search failed");
                    last_error = Some(e);
                    continue;
                }
            };

            let link = videos
                .choose(&mut rand::rng())
                .and_then(|video| choose_file(&video.video_files))
                .map(|file| file.link.clone());
            let Some(link) = link else {
                debug!(job_id = %ctx.job_id, query = %query, "No usable videos for query");
                continue;
            };

            let dest = self
                .stock_dir
                .join(ctx.artifact_name(&format!("stock_{:02}.mp4", i)));
            match download_to_file(&self.client, "pexels", &link, &dest).await {
                Ok(bytes) => {
                    debug!(job_id = %ctx.job_id, query = %query, bytes, "Stock clip downloaded");
                    downloaded.push(dest);
                }
                Err(e) => {
                    warn!(job_id = %ctx.job_id, query = %query, error = %e, "Stock clip download failed");
                    last_error = Some(e.to_string());
                }
            }

            sleep(DOWNLOAD_SPACING).await;
        }

        if downloaded.is_empty() {
            return Err(StockError::NoFootage(
                last_error.unwrap_or_else(|| "no videos matched any query".to_string()),
            ));
        }

        info!(job_id = %ctx.job_id, clips = downloaded.len(), requested = count, "Stock footage ready");
        Ok(downloaded)
    }
}
