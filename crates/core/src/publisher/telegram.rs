//! Telegram Bot API publisher.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, StatusCode};
use serde::Deserialize;
use std::path::Path;
use std::time::Instant;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::config::TelegramConfig;
use crate::fetch::{body_excerpt, FetchFailure};
use crate::job::JobContext;
use crate::metrics;

use super::error::PublishError;
use super::traits::{Channel, PublishRequest, Publisher};

/// Telegram's caption limit, in characters.
const MAX_CAPTION_CHARS: usize = 1024;

const CAPTION_FOOTER: &str = "🎙 Dhamma Audio → Video";

/// Escape characters with meaning in Telegram's legacy Markdown.
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Markdown caption: bold title, optional description, footer.
pub fn build_caption(title: &str, description: Option<&str>) -> String {
    let mut caption = format!("🙏 *{}*", escape_markdown(title));
    if let Some(description) = description {
        caption.push_str("\n\n");
        caption.push_str(&escape_markdown(description));
    }
    caption.push_str("\n\n");
    caption.push_str(CAPTION_FOOTER);

    if caption.chars().count() > MAX_CAPTION_CHARS {
        let mut truncated: String = caption.chars().take(MAX_CAPTION_CHARS - 1).collect();
        truncated.push('…');
        return truncated;
    }
    caption
}

#[derive(Debug, Deserialize)]
struct BotResponse {
    ok: bool,
    #[serde(default)]
    result: Option<BotMessage>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BotMessage {
    message_id: i64,
}

/// Publisher posting the video to a Telegram chat through a bot.
pub struct TelegramPublisher {
    client: Client,
    config: TelegramConfig,
}

impl TelegramPublisher {
    pub fn new(config: TelegramConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    fn method_url(&self, token: &str, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_url.trim_end_matches('/'),
            token,
            method
        )
    }

    /// Videos above the bot upload limit go out as documents.
    fn upload_method(&self, size_bytes: u64) -> (&'static str, &'static str) {
        if size_bytes > self.config.max_video_bytes {
            ("sendDocument", "document")
        } else {
            ("sendVideo", "video")
        }
    }

    async fn send(&self, url: &str, form: Form) -> Result<i64, PublishError> {
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| match FetchFailure::from(e) {
                FetchFailure::Timeout => PublishError::Timeout {
                    channel: Channel::Telegram,
                    timeout_secs: self.config.timeout_secs,
                },
                other => PublishError::Request {
                    channel: Channel::Telegram,
                    message: other.to_string(),
                },
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let parsed: Option<BotResponse> = serde_json::from_str(&body).ok();

        let message = parsed
            .as_ref()
            .and_then(|r| r.description.clone())
            .unwrap_or_else(|| body_excerpt(&body));

        if status == StatusCode::PAYLOAD_TOO_LARGE {
            return Err(PublishError::TooLarge {
                channel: Channel::Telegram,
                message,
            });
        }

        match parsed {
            Some(BotResponse {
                ok: true,
                result: Some(msg),
                ..
            }) if status.is_success() => Ok(msg.message_id),
            _ => Err(PublishError::Upload {
                channel: Channel::Telegram,
                status: status.as_u16(),
                message,
            }),
        }
    }
}

/// Multipart part streaming `path` from disk.
async fn file_part(path: &Path, mime: &str) -> Result<Part, PublishError> {
    let file = tokio::fs::File::open(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PublishError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PublishError::Io(e)
        }
    })?;
    let len = file.metadata().await?.len();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    Part::stream_with_length(Body::from(file), len)
        .file_name(name)
        .mime_str(mime)
        .map_err(|e| PublishError::Request {
            channel: Channel::Telegram,
            message: e.to_string(),
        })
}

#[async_trait]
impl Publisher for TelegramPublisher {
    fn channel(&self) -> Channel {
        Channel::Telegram
    }

    async fn publish(
        &self,
        ctx: &JobContext,
        request: &PublishRequest,
    ) -> Result<String, PublishError> {
        let (token, chat_id) = match (&self.config.bot_token, &self.config.chat_id) {
            (Some(token), Some(chat_id)) => (token, chat_id),
            _ => {
                return Err(PublishError::NotConfigured {
                    channel: Channel::Telegram,
                    reason: "bot token and chat id are required".to_string(),
                })
            }
        };

        let size = match tokio::fs::metadata(&request.video_path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PublishError::FileNotFound {
                    path: request.video_path.clone(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        let (method, field) = self.upload_method(size);

        let mut form = Form::new()
            .text("chat_id", chat_id.clone())
            .text("caption", build_caption(&request.title, request.description()))
            .text("parse_mode", "Markdown")
            .part(field, file_part(&request.video_path, "video/mp4").await?);
        if method == "sendVideo" {
            form = form.text("supports_streaming", "true");
        }

        if let Some(thumbnail) = &request.thumbnail {
            match file_part(thumbnail, "image/png").await {
                Ok(part) => form = form.part("thumbnail", part),
                Err(e) => {
                    warn!(job_id = %ctx.job_id, error = %e, "Skipping Telegram thumbnail")
                }
            }
        }

        debug!(job_id = %ctx.job_id, method, size_bytes = size, "Uploading to Telegram");
        let start = Instant::now();
        let result = self.send(&self.method_url(token, method), form).await;
        metrics::record_external_call(
            "telegram",
            method,
            result.is_ok(),
            start.elapsed().as_secs_f64(),
        );

        let message_id = result?;
        info!(job_id = %ctx.job_id, message_id, "Published to Telegram");
        Ok(format!("Telegram message sent: {}", message_id))
    }
}
