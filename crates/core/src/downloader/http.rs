//! HTTP and yt-dlp backed audio source.

use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::time::{timeout, Duration};
use tracing::{debug, info};

use crate::config::DownloaderConfig;
use crate::fetch::{download_to_file, FetchFailure};
use crate::job::JobContext;
use crate::process::{run_tool, ToolFailure};

use super::error::DownloadError;
use super::traits::AudioSource;

/// File extensions fetched directly instead of through yt-dlp.
pub const DIRECT_AUDIO_EXTENSIONS: [&str; 5] = ["mp3", "wav", "m4a", "ogg", "flac"];

/// Extension of a direct audio link, if `reference` is one.
///
/// Only the URL path is inspected, so query strings and fragments are ignored.
pub fn direct_audio_extension(reference: &str) -> Option<String> {
    let without_fragment = reference.split('#').next().unwrap_or(reference);
    let path = without_fragment.split('?').next().unwrap_or(without_fragment);
    let file_name = path.rsplit('/').next()?;
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    DIRECT_AUDIO_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(ext)
}

/// Audio source that downloads direct links and delegates the rest to yt-dlp.
pub struct HttpAudioSource {
    client: Client,
    config: DownloaderConfig,
    audio_dir: PathBuf,
}

impl HttpAudioSource {
    /// Create a source writing into `audio_dir`.
    pub fn new(config: DownloaderConfig, audio_dir: PathBuf) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            config,
            audio_dir,
        }
    }

    async fn download_direct(
        &self,
        ctx: &JobContext,
        url: &str,
        ext: &str,
    ) -> Result<PathBuf, DownloadError> {
        let dest = self
            .audio_dir
            .join(ctx.artifact_name(&format!("raw.{}", ext)));
        let timeout_secs = self.config.http_timeout_secs;

        debug!(job_id = %ctx.job_id, url, "Downloading direct audio link");
        let transfer = timeout(
            Duration::from_secs(timeout_secs),
            download_to_file(&self.client, "audio", url, &dest),
        )
        .await;

        match transfer {
            Ok(Ok(bytes)) => {
                info!(job_id = %ctx.job_id, bytes, path = %dest.display(), "Audio downloaded");
                Ok(dest)
            }
            Ok(Err(FetchFailure::Timeout)) => Err(DownloadError::Timeout { timeout_secs }),
            Ok(Err(FetchFailure::Io(e))) => Err(DownloadError::Io(e)),
            Ok(Err(other)) => Err(DownloadError::Http(other.to_string())),
            Err(_) => {
                let _ = tokio::fs::remove_file(&dest).await;
                Err(DownloadError::Timeout { timeout_secs })
            }
        }
    }

    async fn download_with_ytdlp(
        &self,
        ctx: &JobContext,
        reference: &str,
    ) -> Result<PathBuf, DownloadError> {
        let template = self.audio_dir.join(ctx.artifact_name("raw.%(ext)s"));
        let args: Vec<String> = vec![
            "--extract-audio".into(),
            "--audio-format".into(),
            "wav".into(),
            "--audio-quality".into(),
            "0".into(),
            "--output".into(),
            template.to_string_lossy().into_owned(),
            "--no-playlist".into(),
            reference.to_string(),
        ];

        debug!(job_id = %ctx.job_id, reference, "Running yt-dlp");
        run_tool(&self.config.ytdlp_path, &args, self.config.ytdlp_timeout_secs)
            .await
            .map_err(|failure| match failure {
                ToolFailure::NotFound(path) => DownloadError::ToolNotFound { path },
                ToolFailure::Timeout(timeout_secs) => DownloadError::Timeout { timeout_secs },
                ToolFailure::Io(e) => DownloadError::Io(e),
                ToolFailure::Exit { code, stderr } => DownloadError::ToolFailed {
                    reason: format!("exit code {:?}: {}", code, stderr),
                },
            })?;

        let path = find_raw_artifact(&self.audio_dir, ctx).await?;
        info!(job_id = %ctx.job_id, path = %path.display(), "Audio extracted");
        Ok(path)
    }
}

/// Extensions yt-dlp uses for unfinished downloads.
const PARTIAL_EXTENSIONS: &[&str] = &["part", "ytdl", "temp"];

/// Locate `<job_id>_raw.*` in `dir`.
///
/// The extracted `.wav` wins over a leftover pre-conversion original;
/// partial downloads are never returned.
async fn find_raw_artifact(dir: &Path, ctx: &JobContext) -> Result<PathBuf, DownloadError> {
    let prefix = ctx.artifact_name("raw.");
    let mut candidates = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_name().to_string_lossy().starts_with(&prefix) {
            continue;
        }
        let path = entry.path();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if PARTIAL_EXTENSIONS.contains(&ext.as_str()) {
            continue;
        }
        if ext == "wav" {
            return Ok(path);
        }
        candidates.push(path);
    }

    candidates.sort();
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| DownloadError::OutputMissing {
            job_id: ctx.job_id.clone(),
        })
}

#[async_trait]
impl AudioSource for HttpAudioSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn acquire(&self, ctx: &JobContext, reference: &str) -> Result<PathBuf, DownloadError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(DownloadError::InvalidReference(
                "reference is empty".to_string(),
            ));
        }

        tokio::fs::create_dir_all(&self.audio_dir).await?;

        match direct_audio_extension(reference) {
            Some(ext) => self.download_direct(ctx, reference, &ext).await,
            None => self.download_with_ytdlp(ctx, reference).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_extension_detection() {
        assert_eq!(
            direct_audio_extension("https://cdn.example.com/talks/a.mp3"),
            Some("mp3".to_string())
        );
        assert_eq!(
            direct_audio_extension("https://cdn.example.com/a.WAV?token=abc"),
            Some("wav".to_string())
        );
        assert_eq!(
            direct_audio_extension("https://x.org/file.flac#t=10"),
            Some("flac".to_string())
        );
    }

    #[test]
    fn test_non_direct_references() {
        assert_eq!(
            direct_audio_extension("https://www.youtube.com/watch?v=abc.mp3"),
            None
        );
        assert_eq!(direct_audio_extension("https://example.com/video.mp4"), None);
        assert_eq!(direct_audio_extension("https://example.com/talks/"), None);
    }

    #[tokio::test]
    async fn test_empty_reference_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = HttpAudioSource::new(DownloaderConfig::default(), dir.path().to_path_buf());
        let err = source
            .acquire(&JobContext::new("abc"), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn test_missing_ytdlp_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = DownloaderConfig {
            ytdlp_path: PathBuf::from("/nonexistent/yt-dlp"),
            ..Default::default()
        };
        let source = HttpAudioSource::new(config, dir.path().to_path_buf());
        let err = source
            .acquire(&JobContext::new("abc"), "https://www.youtube.com/watch?v=x")
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::ToolNotFound { .. }));
    }

    #[tokio::test]
    async fn test_find_raw_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = JobContext::new("job42");
        tokio::fs::write(dir.path().join("other_raw.wav"), b"x")
            .await
            .unwrap();
        assert!(find_raw_artifact(dir.path(), &ctx).await.is_err());

        tokio::fs::write(dir.path().join("job42_raw.wav"), b"x")
            .await
            .unwrap();
        let found = find_raw_artifact(dir.path(), &ctx).await.unwrap();
        assert!(found.ends_with("job42_raw.wav"));
    }

    #[tokio::test]
    async fn test_find_raw_artifact_skips_partial_and_prefers_wav() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = JobContext::new("job7");
        for name in ["job7_raw.webm.part", "job7_raw.webm"] {
            tokio::fs::write(dir.path().join(name), b"x").await.unwrap();
        }

        // Only the pre-conversion original is usable so far.
        let found = find_raw_artifact(dir.path(), &ctx).await.unwrap();
        assert!(found.ends_with("job7_raw.webm"));

        tokio::fs::write(dir.path().join("job7_raw.wav"), b"x")
            .await
            .unwrap();
        let found = find_raw_artifact(dir.path(), &ctx).await.unwrap();
        assert!(found.ends_with("job7_raw.wav"));
    }

    #[tokio::test]
    async fn test_find_raw_artifact_ignores_only_partial() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = JobContext::new("job8");
        tokio::fs::write(dir.path().join("job8_raw.wav.part"), b"x")
            .await
            .unwrap();
        let err = find_raw_artifact(dir.path(), &ctx).await.unwrap_err();
        assert!(matches!(err, DownloadError::OutputMissing { .. }));
    }
}
