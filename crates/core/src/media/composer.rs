//! FFmpeg-based video composition.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::FfmpegConfig;
use crate::job::JobContext;
use crate::process::run_tool;

use super::error::MediaError;
use super::traits::VideoComposer;

/// Extra visual length rendered past the end of the audio.
const VISUAL_PADDING_SECS: f64 = 10.0;

/// Longest audio accepted for composition.
const MAX_AUDIO_SECS: f64 = 24.0 * 3600.0;

/// Upper bound on concat-list length.
const MAX_CONCAT_ENTRIES: usize = 10_000;

/// Seconds the title stays on screen.
const TITLE_DURATION_SECS: u32 = 8;

const SCALE_FILTER: &str = "scale=1920:1080:force_original_aspect_ratio=decrease,\
pad=1920:1080:(ow-iw)/2:(oh-ih)/2,setsar=1";

/// Concat-demuxer entries that loop `clips` until their estimated length
/// exceeds the audio plus padding.
pub fn concat_entries(clips: &[PathBuf], audio_secs: f64, clip_estimate_secs: u64) -> Vec<String> {
    if clips.is_empty() || clip_estimate_secs == 0 {
        return Vec::new();
    }

    let target = audio_secs + VISUAL_PADDING_SECS;
    let mut entries = Vec::new();
    let mut estimated = 0.0;
    while estimated < target && entries.len() < MAX_CONCAT_ENTRIES {
        let clip = &clips[entries.len() % clips.len()];
        let quoted = clip.to_string_lossy().replace('\'', r"'\''");
        entries.push(format!("file '{}'", quoted));
        estimated += clip_estimate_secs as f64;
    }
    entries
}

/// Escape text for an ffmpeg drawtext `text='...'` value.
pub fn escape_drawtext(text: &str) -> String {
    text.replace('\\', r"\\")
        .replace('\'', r"\'")
        .replace(':', r"\:")
        .replace('%', r"\%")
}

/// Composer rendering a 1920x1080 30 fps H.264 video with AAC audio.
pub struct FfmpegComposer {
    config: FfmpegConfig,
    work_dir: PathBuf,
    output_dir: PathBuf,
}

impl FfmpegComposer {
    /// `work_dir` holds intermediates; the finished video lands in `output_dir`.
    pub fn new(config: FfmpegConfig, work_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            config,
            work_dir,
            output_dir,
        }
    }

    async fn probe_duration(&self, audio: &Path) -> Result<f64, MediaError> {
        let args: Vec<String> = vec![
            "-v".into(),
            "quiet".into(),
            "-show_entries".into(),
            "format=duration".into(),
            "-of".into(),
            "default=noprint_wrappers=1:nokey=1".into(),
            audio.to_string_lossy().into_owned(),
        ];

        let output = run_tool(&self.config.ffprobe_path, &args, self.config.probe_timeout_secs)
            .await
            .map_err(|f| MediaError::from_tool("Audio probe", f))?;

        parse_duration(&output.stdout)
    }

    fn title_filter(&self, title: &str) -> String {
        if title.trim().is_empty() {
            return "null".to_string();
        }
        format!(
            "null,drawtext=text='{}':fontsize=42:fontcolor=white:borderw=3:bordercolor=black\
             :x=(w-text_w)/2:y=50:enable='between(t,0,{})':fontfile={}",
            escape_drawtext(title.trim()),
            TITLE_DURATION_SECS,
            self.config.title_font.display()
        )
    }

    fn concat_args(list: &Path, visual: &Path, audio_secs: f64) -> Vec<String> {
        vec![
            "-y".into(),
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            list.to_string_lossy().into_owned(),
            "-vf".into(),
            SCALE_FILTER.into(),
            "-c:v".into(),
            "libx264".into(),
            "-preset".into(),
            "medium".into(),
            "-crf".into(),
            "20".into(),
            "-r".into(),
            "30".into(),
            "-an".into(),
            "-t".into(),
            format!("{:.3}", audio_secs),
            visual.to_string_lossy().into_owned(),
        ]
    }

    fn mux_args(&self, visual: &Path, audio: &Path, title: &str, output: &Path) -> Vec<String> {
        vec![
            "-y".into(),
            "-i".into(),
            visual.to_string_lossy().into_owned(),
            "-i".into(),
            audio.to_string_lossy().into_owned(),
            "-vf".into(),
            self.title_filter(title),
            "-c:v".into(),
            "libx264".into(),
            "-preset".into(),
            "medium".into(),
            "-crf".into(),
            "20".into(),
            "-c:a".into(),
            "aac".into(),
            "-b:a".into(),
            "192k".into(),
            "-ar".into(),
            "48000".into(),
            "-shortest".into(),
            "-movflags".into(),
            "+faststart".into(),
            output.to_string_lossy().into_owned(),
        ]
    }

    async fn render(
        &self,
        ctx: &JobContext,
        audio: &Path,
        clips: &[PathBuf],
        title: &str,
        list_path: &Path,
        visual_path: &Path,
    ) -> Result<PathBuf, MediaError> {
        let audio_secs = self.probe_duration(audio).await?;
        debug!(job_id = %ctx.job_id, audio_secs, clips = clips.len(), "Composing video");

        let entries = concat_entries(clips, audio_secs, self.config.clip_estimate_secs);
        tokio::fs::write(list_path, entries.join("\n")).await?;

        run_tool(
            &self.config.ffmpeg_path,
            Self::concat_args(list_path, visual_path, audio_secs),
            self.config.compose_timeout_secs,
        )
        .await
        .map_err(|f| MediaError::from_tool("Video concat", f))?;

        let output = self.output_dir.join(ctx.artifact_name("talk.mp4"));
        run_tool(
            &self.config.ffmpeg_path,
            self.mux_args(visual_path, audio, title, &output),
            self.config.compose_timeout_secs,
        )
        .await
        .map_err(|f| MediaError::from_tool("Video mux", f))?;

        Ok(output)
    }
}

fn parse_duration(stdout: &str) -> Result<f64, MediaError> {
    let trimmed = stdout.trim();
    let secs: f64 = trimmed.parse().map_err(|_| MediaError::ProbeFailed {
        reason: format!("unexpected duration output: {:?}", trimmed),
    })?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(MediaError::ProbeFailed {
            reason: format!("invalid duration: {}", secs),
        });
    }
    if secs > MAX_AUDIO_SECS {
        return Err(MediaError::ProbeFailed {
            reason: format!("duration {}s exceeds limit of {}s", secs, MAX_AUDIO_SECS),
        });
    }
    Ok(secs)
}

#[async_trait]
impl VideoComposer for FfmpegComposer {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn compose(
        &self,
        ctx: &JobContext,
        audio: &Path,
        clips: &[PathBuf],
        title: &str,
    ) -> Result<PathBuf, MediaError> {
        if clips.is_empty() {
            return Err(MediaError::NoFootage);
        }
        if !tokio::fs::try_exists(audio).await? {
            return Err(MediaError::InputNotFound {
                path: audio.to_path_buf(),
            });
        }
        tokio::fs::create_dir_all(&self.work_dir).await?;
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let list_path = self.work_dir.join(ctx.artifact_name("concat.txt"));
        let visual_path = self.work_dir.join(ctx.artifact_name("visual.mp4"));

        let result = self
            .render(ctx, audio, clips, title, &list_path, &visual_path)
            .await;

        // Intermediates
        let _ = tokio::fs::remove_file(&list_path).await;
        let _ = tokio::fs::remove_file(&visual_path).await;

        if let Ok(output) = &result {
            info!(job_id = %ctx.job_id, output = %output.display(), "Video composed");
        }
        result
    }
}
