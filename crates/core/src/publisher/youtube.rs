//! YouTube Data API publisher.

use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::{Body, Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Instant;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::config::YouTubeConfig;
use crate::fetch::{body_excerpt, FetchFailure};
use crate::job::JobContext;
use crate::metrics;

use super::error::PublishError;
use super::traits::{Channel, PublishRequest, Publisher};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/youtube/v3/videos";
const THUMBNAIL_URL: &str = "https://www.googleapis.com/upload/youtube/v3/thumbnails/set";

/// Stored OAuth credentials.
#[derive(Debug, Clone, Deserialize)]
struct StoredToken {
    token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UploadedVideo {
    id: String,
}

/// Publisher uploading the video to the authorized YouTube channel.
pub struct YouTubePublisher {
    client: Client,
    config: YouTubeConfig,
}

impl YouTubePublisher {
    pub fn new(config: YouTubeConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Video resource sent when opening the upload session.
    fn video_metadata(&self, request: &PublishRequest) -> Value {
        let description = request.description().map(str::to_string).unwrap_or_else(|| {
            format!(
                "🙏 {}\n\nDhamma Audio → Video\nMyanmar Buddhist Teaching",
                request.title
            )
        });

        json!({
            "snippet": {
                "title": request.title,
                "description": description,
                "tags": self.config.tags,
                "categoryId": self.config.category_id,
                "defaultLanguage": self.config.default_language,
            },
            "status": {
                "privacyStatus": self.config.privacy_status,
                "selfDeclaredMadeForKids": false,
            },
        })
    }

    fn request_error(&self, e: reqwest::Error) -> PublishError {
        match FetchFailure::from(e) {
            FetchFailure::Timeout => PublishError::Timeout {
                channel: Channel::YouTube,
                timeout_secs: self.config.timeout_secs,
            },
            other => PublishError::Request {
                channel: Channel::YouTube,
                message: other.to_string(),
            },
        }
    }

    async fn load_token(&self) -> Result<StoredToken, PublishError> {
        let raw = match tokio::fs::read_to_string(&self.config.token_file).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PublishError::NotAuthorized {
                    channel: Channel::YouTube,
                    reason: format!(
                        "token file {} not found",
                        self.config.token_file.display()
                    ),
                })
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&raw).map_err(|e| PublishError::NotAuthorized {
            channel: Channel::YouTube,
            reason: format!("invalid token file: {}", e),
        })
    }

    /// Access token to use, refreshed when client credentials allow it.
    async fn access_token(&self) -> Result<String, PublishError> {
        let stored = self.load_token().await?;

        let (Some(client_id), Some(client_secret), Some(refresh_token)) = (
            self.config.client_id.as_deref(),
            self.config.client_secret.as_deref(),
            stored.refresh_token.as_deref(),
        ) else {
            return Ok(stored.token);
        };

        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::NotAuthorized {
                channel: Channel::YouTube,
                reason: format!("token refresh failed (HTTP {}): {}", status, body_excerpt(&body)),
            });
        }

        let refreshed: RefreshResponse = response.json().await.map_err(|e| PublishError::Request {
            channel: Channel::YouTube,
            message: format!("invalid token response: {}", e),
        })?;
        Ok(refreshed.access_token)
    }

    async fn check(&self, response: Response) -> Result<Response, PublishError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 413 {
            return Err(PublishError::TooLarge {
                channel: Channel::YouTube,
                message: body_excerpt(&body),
            });
        }
        Err(PublishError::Upload {
            channel: Channel::YouTube,
            status: status.as_u16(),
            message: body_excerpt(&body),
        })
    }

    /// Open a resumable session, then send the whole file in one PUT.
    async fn upload_video(
        &self,
        token: &str,
        request: &PublishRequest,
    ) -> Result<String, PublishError> {
        let file = open_upload(&request.video_path).await?;
        let len = file.metadata().await?.len();

        let session = self
            .client
            .post(UPLOAD_URL)
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(token)
            .header("X-Upload-Content-Type", "video/mp4")
            .header("X-Upload-Content-Length", len)
            .json(&self.video_metadata(request))
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        let session = self.check(session).await?;

        let session_url = session
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| PublishError::Request {
                channel: Channel::YouTube,
                message: "upload session has no location".to_string(),
            })?;

        let uploaded = self
            .client
            .put(&session_url)
            .header(CONTENT_TYPE, "video/mp4")
            .header(CONTENT_LENGTH, len)
            .body(Body::from(file))
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        let uploaded = self.check(uploaded).await?;

        let video: UploadedVideo = uploaded.json().await.map_err(|e| PublishError::Request {
            channel: Channel::YouTube,
            message: format!("invalid upload response: {}", e),
        })?;
        Ok(video.id)
    }

    async fn set_thumbnail(
        &self,
        token: &str,
        video_id: &str,
        thumbnail: &Path,
    ) -> Result<(), PublishError> {
        let file = open_upload(thumbnail).await?;
        let len = file.metadata().await?.len();

        let response = self
            .client
            .post(THUMBNAIL_URL)
            .query(&[("videoId", video_id)])
            .bearer_auth(token)
            .header(CONTENT_TYPE, "image/png")
            .header(CONTENT_LENGTH, len)
            .body(Body::from(file))
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        self.check(response).await?;
        Ok(())
    }
}

async fn open_upload(path: &Path) -> Result<tokio::fs::File, PublishError> {
    tokio::fs::File::open(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PublishError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PublishError::Io(e)
        }
    })
}

/// Public watch URL of an uploaded video.
fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

#[async_trait]
impl Publisher for YouTubePublisher {
    fn channel(&self) -> Channel {
        Channel::YouTube
    }

    async fn publish(
        &self,
        ctx: &JobContext,
        request: &PublishRequest,
    ) -> Result<String, PublishError> {
        let token = self.access_token().await?;

        debug!(job_id = %ctx.job_id, video = %request.video_path.display(), "Uploading to YouTube");
        let start = Instant::now();
        let result = self.upload_video(&token, request).await;
        metrics::record_external_call(
            "youtube",
            "upload",
            result.is_ok(),
            start.elapsed().as_secs_f64(),
        );
        let video_id = result?;

        if let Some(thumbnail) = &request.thumbnail {
            if let Err(e) = self.set_thumbnail(&token, &video_id, thumbnail).await {
                warn!(job_id = %ctx.job_id, video_id = %video_id, error = %e, "Failed to set YouTube thumbnail");
            }
        }

        info!(job_id = %ctx.job_id, video_id = %video_id, "Published to YouTube");
        Ok(watch_url(&video_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn request(description: Option<&str>) -> PublishRequest {
        PublishRequest {
            video_path: PathBuf::from("/out/j_talk.mp4"),
            title: "Talk 1".to_string(),
            description: description.map(str::to_string),
            thumbnail: None,
        }
    }

    #[test]
    fn test_video_metadata_defaults() {
        let publisher = YouTubePublisher::new(YouTubeConfig::default());
        let metadata = publisher.video_metadata(&request(None));

        assert_eq!(metadata["snippet"]["title"], "Talk 1");
        assert_eq!(metadata["snippet"]["categoryId"], "22");
        assert_eq!(metadata["snippet"]["defaultLanguage"], "my");
        assert_eq!(metadata["status"]["privacyStatus"], "public");
        assert_eq!(metadata["status"]["selfDeclaredMadeForKids"], false);
        assert!(metadata["snippet"]["description"]
            .as_str()
            .unwrap()
            .starts_with("🙏 Talk 1"));
    }

    #[test]
    fn test_video_metadata_uses_description() {
        let publisher = YouTubePublisher::new(YouTubeConfig::default());
        let metadata = publisher.video_metadata(&request(Some("On patience")));
        assert_eq!(metadata["snippet"]["description"], "On patience");
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(watch_url("abc123"), "https://www.youtube.com/watch?v=abc123");
    }

    #[tokio::test]
    async fn test_missing_token_file_is_not_authorized() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = YouTubePublisher::new(YouTubeConfig {
            token_file: dir.path().join("missing.json"),
            ..Default::default()
        });
        let err = publisher
            .publish(&JobContext::new("j"), &request(None))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::NotAuthorized { .. }));
    }

    #[tokio::test]
    async fn test_stored_token_without_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let token_file = dir.path().join("token.json");
        tokio::fs::write(&token_file, r#"{"token": "abc", "refresh_token": "r"}"#)
            .await
            .unwrap();

        // Without client credentials the stored token is used as-is.
        let publisher = YouTubePublisher::new(YouTubeConfig {
            token_file,
            ..Default::default()
        });
        assert_eq!(publisher.access_token().await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_missing_video_file() {
        let dir = tempfile::tempdir().unwrap();
        let token_file = dir.path().join("token.json");
        tokio::fs::write(&token_file, r#"{"token": "abc"}"#)
            .await
            .unwrap();
        let publisher = YouTubePublisher::new(YouTubeConfig {
            token_file,
            ..Default::default()
        });

        let err = publisher
            .publish(&JobContext::new("j"), &request(None))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::FileNotFound { .. }));
    }
}
