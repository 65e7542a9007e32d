use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::orchestrator::OrchestratorConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub downloader: DownloaderConfig,
    #[serde(default)]
    pub ffmpeg: FfmpegConfig,
    #[serde(default)]
    pub pexels: PexelsConfig,
    #[serde(default)]
    pub thumbnail: ThumbnailConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub youtube: YouTubeConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory with the static dashboard, served as fallback when set.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Where downloaded, intermediate and produced media lives.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaConfig {
    #[serde(default = "default_media_root")]
    pub root_dir: PathBuf,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root_dir: default_media_root(),
        }
    }
}

fn default_media_root() -> PathBuf {
    PathBuf::from("/media/talkreel")
}

impl MediaConfig {
    pub fn audio_dir(&self) -> PathBuf {
        self.root_dir.join("audio")
    }

    pub fn video_dir(&self) -> PathBuf {
        self.root_dir.join("video")
    }

    pub fn stock_dir(&self) -> PathBuf {
        self.root_dir.join("stock")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root_dir.join("output")
    }

    pub fn thumbnails_dir(&self) -> PathBuf {
        self.root_dir.join("thumbnails")
    }

    /// Create every media subdirectory if missing.
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [
            self.audio_dir(),
            self.video_dir(),
            self.stock_dir(),
            self.output_dir(),
            self.thumbnails_dir(),
        ] {
            tokio::fs::create_dir_all(&dir).await?;
        }
        Ok(())
    }
}

/// Audio acquisition configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloaderConfig {
    /// Timeout for direct HTTP downloads in seconds (default: 300)
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
    /// yt-dlp binary used for non-direct sources
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,
    /// Timeout for yt-dlp in seconds (default: 600)
    #[serde(default = "default_ytdlp_timeout")]
    pub ytdlp_timeout_secs: u64,
}

fn default_http_timeout() -> u64 {
    300
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_ytdlp_timeout() -> u64 {
    600
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
            ytdlp_path: default_ytdlp_path(),
            ytdlp_timeout_secs: default_ytdlp_timeout(),
        }
    }
}

/// FFmpeg tooling configuration (enhancement and composition)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FfmpegConfig {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,
    #[serde(default = "default_long_timeout")]
    pub enhance_timeout_secs: u64,
    #[serde(default = "default_long_timeout")]
    pub compose_timeout_secs: u64,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
    /// Font used for the title overlay
    #[serde(default = "default_title_font")]
    pub title_font: PathBuf,
    /// Assumed length of one stock clip when filling the audio duration
    #[serde(default = "default_clip_estimate")]
    pub clip_estimate_secs: u64,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_long_timeout() -> u64 {
    1800 // 30 minutes
}

fn default_probe_timeout() -> u64 {
    30
}

fn default_title_font() -> PathBuf {
    PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf")
}

fn default_clip_estimate() -> u64 {
    15
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            enhance_timeout_secs: default_long_timeout(),
            compose_timeout_secs: default_long_timeout(),
            probe_timeout_secs: default_probe_timeout(),
            title_font: default_title_font(),
            clip_estimate_secs: default_clip_estimate(),
        }
    }
}

/// Pexels stock video configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PexelsConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_pexels_url")]
    pub api_url: String,
    #[serde(default = "default_service_timeout")]
    pub timeout_secs: u64,
    /// Search queries sampled for each job
    #[serde(default = "default_queries")]
    pub queries: Vec<String>,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_pexels_url() -> String {
    "https://api.pexels.com/videos/search".to_string()
}

fn default_service_timeout() -> u64 {
    120
}

fn default_queries() -> Vec<String> {
    [
        "Shwedagon pagoda Myanmar",
        "Bagan temples Myanmar",
        "Buddhist temple Myanmar",
        "Buddha statue golden",
        "Myanmar pagoda sunset",
        "Buddhist monastery Myanmar",
        "Mandalay temple",
        "Buddhist meditation temple",
        "Golden pagoda Buddhism",
        "Myanmar Buddhist ceremony",
    ]
    .iter()
    .map(|q| q.to_string())
    .collect()
}

fn default_per_page() -> u32 {
    5
}

impl Default for PexelsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_pexels_url(),
            timeout_secs: default_service_timeout(),
            queries: default_queries(),
            per_page: default_per_page(),
        }
    }
}

/// Image generation configuration for thumbnails
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThumbnailConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_images_url")]
    pub api_url: String,
    #[serde(default = "default_image_model")]
    pub model: String,
    #[serde(default = "default_image_size")]
    pub size: String,
    #[serde(default = "default_service_timeout")]
    pub timeout_secs: u64,
}

fn default_images_url() -> String {
    "https://api.openai.com/v1/images/generations".to_string()
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_image_size() -> String {
    "1792x1024".to_string()
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_images_url(),
            model: default_image_model(),
            size: default_image_size(),
            timeout_secs: default_service_timeout(),
        }
    }
}

/// Telegram bot publishing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default = "default_telegram_url")]
    pub api_url: String,
    #[serde(default = "default_upload_timeout")]
    pub timeout_secs: u64,
    /// Videos above this size are sent as documents
    #[serde(default = "default_max_video_bytes")]
    pub max_video_bytes: u64,
}

fn default_telegram_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_upload_timeout() -> u64 {
    300
}

fn default_max_video_bytes() -> u64 {
    50 * 1024 * 1024
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_url: default_telegram_url(),
            timeout_secs: default_upload_timeout(),
            max_video_bytes: default_max_video_bytes(),
        }
    }
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        self.bot_token.is_some() && self.chat_id.is_some()
    }
}

/// YouTube upload configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YouTubeConfig {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    /// JSON file holding `token` and optionally `refresh_token`
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
    #[serde(default = "default_youtube_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_privacy_status")]
    pub privacy_status: String,
    #[serde(default = "default_category_id")]
    pub category_id: String,
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,
}

fn default_token_file() -> PathBuf {
    PathBuf::from("/media/talkreel/youtube_token.json")
}

fn default_youtube_timeout() -> u64 {
    600
}

fn default_privacy_status() -> String {
    "public".to_string()
}

fn default_category_id() -> String {
    "22".to_string() // People & Blogs
}

fn default_language() -> String {
    "my".to_string()
}

fn default_tags() -> Vec<String> {
    [
        "Dhamma",
        "Buddhism",
        "Myanmar",
        "Burmese",
        "Theravada",
        "Meditation",
    ]
    .iter()
    .map(|t| t.to_string())
    .collect()
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            token_file: default_token_file(),
            timeout_secs: default_youtube_timeout(),
            privacy_status: default_privacy_status(),
            category_id: default_category_id(),
            default_language: default_language(),
            tags: default_tags(),
        }
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub media: MediaConfig,
    pub orchestrator: OrchestratorConfig,
    pub downloader: DownloaderConfig,
    pub ffmpeg: FfmpegConfig,
    pub pexels: SanitizedPexelsConfig,
    pub thumbnail: SanitizedThumbnailConfig,
    pub telegram: SanitizedTelegramConfig,
    pub youtube: SanitizedYouTubeConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPexelsConfig {
    pub api_key_configured: bool,
    pub timeout_secs: u64,
    pub queries: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedThumbnailConfig {
    pub api_key_configured: bool,
    pub model: String,
    pub size: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTelegramConfig {
    pub bot_token_configured: bool,
    pub chat_id_configured: bool,
    pub timeout_secs: u64,
    pub max_video_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedYouTubeConfig {
    pub client_configured: bool,
    pub token_file: PathBuf,
    pub privacy_status: String,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            media: config.media.clone(),
            orchestrator: config.orchestrator.clone(),
            downloader: config.downloader.clone(),
            ffmpeg: config.ffmpeg.clone(),
            pexels: SanitizedPexelsConfig {
                api_key_configured: config.pexels.api_key.is_some(),
                timeout_secs: config.pexels.timeout_secs,
                queries: config.pexels.queries.clone(),
            },
            thumbnail: SanitizedThumbnailConfig {
                api_key_configured: config.thumbnail.api_key.is_some(),
                model: config.thumbnail.model.clone(),
                size: config.thumbnail.size.clone(),
                timeout_secs: config.thumbnail.timeout_secs,
            },
            telegram: SanitizedTelegramConfig {
                bot_token_configured: config.telegram.bot_token.is_some(),
                chat_id_configured: config.telegram.chat_id.is_some(),
                timeout_secs: config.telegram.timeout_secs,
                max_video_bytes: config.telegram.max_video_bytes,
            },
            youtube: SanitizedYouTubeConfig {
                client_configured: config.youtube.client_id.is_some()
                    && config.youtube.client_secret.is_some(),
                token_file: config.youtube.token_file.clone(),
                privacy_status: config.youtube.privacy_status.clone(),
            },
        }
    }
}

/// Which external services have credentials.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ServiceStatus {
    pub pexels: bool,
    pub thumbnail: bool,
    pub telegram: bool,
    pub youtube: bool,
}

impl From<&Config> for ServiceStatus {
    fn from(config: &Config) -> Self {
        Self {
            pexels: config.pexels.api_key.is_some(),
            thumbnail: config.thumbnail.api_key.is_some(),
            telegram: config.telegram.is_configured(),
            youtube: config.youtube.token_file.exists(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::Channel;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.orchestrator.default_stock_clip_count, 5);
        assert_eq!(config.orchestrator.default_channels, vec![Channel::Telegram]);
        assert_eq!(config.downloader.ytdlp_timeout_secs, 600);
        assert_eq!(config.pexels.queries.len(), 10);
        assert_eq!(config.telegram.max_video_bytes, 50 * 1024 * 1024);
        assert!(config.pexels.api_key.is_none());
    }

    #[test]
    fn test_media_subdirectories() {
        let media = MediaConfig {
            root_dir: PathBuf::from("/srv/media"),
        };
        assert_eq!(media.audio_dir(), PathBuf::from("/srv/media/audio"));
        assert_eq!(media.stock_dir(), PathBuf::from("/srv/media/stock"));
        assert_eq!(media.output_dir(), PathBuf::from("/srv/media/output"));
        assert_eq!(media.thumbnails_dir(), PathBuf::from("/srv/media/thumbnails"));
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let toml = r#"
[pexels]
api_key = "pexels-secret"

[telegram]
bot_token = "bot-secret"
chat_id = "-100123"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        let json = serde_json::to_string(&sanitized).unwrap();

        assert!(!json.contains("pexels-secret"));
        assert!(!json.contains("bot-secret"));
        assert!(sanitized.pexels.api_key_configured);
        assert!(sanitized.telegram.bot_token_configured);
        assert!(!sanitized.thumbnail.api_key_configured);
    }

    #[test]
    fn test_service_status() {
        let mut config = Config::default();
        config.telegram.bot_token = Some("token".to_string());
        let status = ServiceStatus::from(&config);
        assert!(!status.telegram);

        config.telegram.chat_id = Some("chat".to_string());
        config.youtube.token_file = PathBuf::from("/nonexistent/token.json");
        let status = ServiceStatus::from(&config);
        assert!(status.telegram);
        assert!(!status.pexels);
        assert!(!status.youtube);
    }
}
