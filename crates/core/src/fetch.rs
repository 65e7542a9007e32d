//! Streaming HTTP downloads shared by the collaborators that fetch files.

use reqwest::Client;
use std::path::Path;
use std::time::Instant;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::metrics;

/// Why a download did not complete.
#[derive(Debug, Error)]
pub(crate) enum FetchFailure {
    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for FetchFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchFailure::Timeout
        } else {
            FetchFailure::Request(e.to_string())
        }
    }
}

/// Truncated response body for error messages.
pub(crate) fn body_excerpt(body: &str) -> String {
    body.chars().take(200).collect()
}

/// Download `url` into `dest`, returning the number of bytes written.
///
/// A partially written file is removed when the transfer fails.
pub(crate) async fn download_to_file(
    client: &Client,
    service: &str,
    url: &str,
    dest: &Path,
) -> Result<u64, FetchFailure> {
    let start = Instant::now();
    let result = stream_to_file(client, url, dest).await;
    metrics::record_external_call(
        service,
        "download",
        result.is_ok(),
        start.elapsed().as_secs_f64(),
    );

    if result.is_err() {
        let _ = tokio::fs::remove_file(dest).await;
    } else {
        debug!(service, url, dest = %dest.display(), "Download complete");
    }
    result
}

async fn stream_to_file(client: &Client, url: &str, dest: &Path) -> Result<u64, FetchFailure> {
    let mut response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchFailure::Status {
            status: status.as_u16(),
            body: body_excerpt(&body),
        });
    }

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(FetchFailure::Io)?;
    }

    let mut file = File::create(dest).await.map_err(FetchFailure::Io)?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await.map_err(FetchFailure::Io)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(FetchFailure::Io)?;

    Ok(written)
}
