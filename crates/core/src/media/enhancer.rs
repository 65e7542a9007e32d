//! FFmpeg-based speech enhancement.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::FfmpegConfig;
use crate::job::JobContext;
use crate::process::run_tool;

use super::error::MediaError;
use super::traits::AudioEnhancer;

/// Filter chain applied to the raw recording, in order: rumble highpass,
/// speech-band lowpass, adaptive denoise, gentle compression, EBU R128
/// loudness normalization to -16 LUFS, 48 kHz resample.
pub const ENHANCE_FILTERS: &str = "highpass=f=80,\
lowpass=f=14000,\
afftdn=nf=-25:nr=10:nt=w,\
acompressor=threshold=-20dB:ratio=3:attack=5:release=50,\
loudnorm=I=-16:TP=-1.5:LRA=11,\
aresample=48000";

/// Enhancer producing 24-bit 48 kHz PCM WAV.
pub struct FfmpegEnhancer {
    config: FfmpegConfig,
    audio_dir: PathBuf,
}

impl FfmpegEnhancer {
    pub fn new(config: FfmpegConfig, audio_dir: PathBuf) -> Self {
        Self { config, audio_dir }
    }

    fn build_args(input: &Path, output: &Path) -> Vec<String> {
        vec![
            "-y".into(),
            "-i".into(),
            input.to_string_lossy().into_owned(),
            "-af".into(),
            ENHANCE_FILTERS.into(),
            "-ar".into(),
            "48000".into(),
            "-sample_fmt".into(),
            "s24".into(),
            "-c:a".into(),
            "pcm_s24le".into(),
            output.to_string_lossy().into_owned(),
        ]
    }
}

#[async_trait]
impl AudioEnhancer for FfmpegEnhancer {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn enhance(&self, ctx: &JobContext, input: &Path) -> Result<PathBuf, MediaError> {
        if !tokio::fs::try_exists(input).await? {
            return Err(MediaError::InputNotFound {
                path: input.to_path_buf(),
            });
        }
        tokio::fs::create_dir_all(&self.audio_dir).await?;

        let output = self.audio_dir.join(ctx.artifact_name("enhanced.wav"));
        let args = Self::build_args(input, &output);

        debug!(job_id = %ctx.job_id, input = %input.display(), "Enhancing audio");
        run_tool(
            &self.config.ffmpeg_path,
            &args,
            self.config.enhance_timeout_secs,
        )
        .await
        .map_err(|f| MediaError::from_tool("Audio enhancement", f))?;

        info!(job_id = %ctx.job_id, output = %output.display(), "Audio enhanced");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_chain_order() {
        let filters: Vec<&str> = ENHANCE_FILTERS
            .split(',')
            .map(|f| f.split('=').next().unwrap())
            .collect();
        assert_eq!(
            filters,
            vec![
                "highpass",
                "lowpass",
                "afftdn",
                "acompressor",
                "loudnorm",
                "aresample"
            ]
        );
        assert!(ENHANCE_FILTERS.contains("loudnorm=I=-16"));
    }

    #[test]
    fn test_build_args() {
        let args = FfmpegEnhancer::build_args(Path::new("/a/in.mp3"), Path::new("/a/out.wav"));
        assert_eq!(args[0], "-y");
        assert_eq!(args[2], "/a/in.mp3");
        assert!(args.windows(2).any(|w| w[0] == "-c:a" && w[1] == "pcm_s24le"));
        assert_eq!(args.last().unwrap(), "/a/out.wav");
    }

    #[tokio::test]
    async fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let enhancer = FfmpegEnhancer::new(FfmpegConfig::default(), dir.path().to_path_buf());
        let err = enhancer
            .enhance(&JobContext::new("j1"), &dir.path().join("missing.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InputNotFound { .. }));
    }
}
