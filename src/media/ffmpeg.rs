//! `MediaToolkit` backed by the ffmpeg and ffprobe binaries

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::config::MediaConfig;
use crate::error::{AppError, Result};
use crate::media::MediaToolkit;

/// Ratios this close to 1.0 leave the audio untouched
const TEMPO_TOLERANCE: f64 = 0.01;

pub struct FfmpegToolkit {
    ffmpeg: String,
    ffprobe: String,
}

impl FfmpegToolkit {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg_path.clone(),
            ffprobe: config.ffprobe_path.clone(),
        }
    }

    async fn run(&self, program: &str, args: &[&str]) -> Result<Vec<u8>> {
        debug!(program = %program, args = ?args, "Running media tool");

        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AppError::Media(format!("Failed to run {}: {}", program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Media(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}

fn path_arg(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| AppError::Media(format!("Non UTF-8 path: {}", path.display())))
}

/// Parse ffprobe's bare `format=duration` output
pub fn parse_duration(stdout: &str) -> Result<f64> {
    let value = stdout.trim();
    value
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .ok_or_else(|| AppError::Media(format!("Unreadable media duration '{}'", value)))
}

/// Frame sampling and downscaling filter graph
pub fn frame_filter(interval: u32, max_width: u32) -> String {
    let select = format!("select='not(mod(n,{}))'", interval.max(1));
    if max_width == 0 {
        select
    } else {
        format!("{},scale='min({},iw)':-2", select, max_width)
    }
}

/// Chain of `atempo` filters whose product is `ratio`
///
/// Each stage stays within [0.5, 2.0], the range every ffmpeg release accepts.
pub fn atempo_chain(ratio: f64) -> String {
    let mut remaining = ratio;
    let mut stages = Vec::new();

    while remaining > 2.0 {
        stages.push(2.0);
        remaining /= 2.0;
    }
    while remaining < 0.5 {
        stages.push(0.5);
        remaining /= 0.5;
    }
    stages.push(remaining);

    stages
        .iter()
        .map(|stage| format!("atempo={:.6}", stage))
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        let stdout = self
            .run(
                &self.ffprobe,
                &[
                    "-v",
                    "error",
                    "-show_entries",
                    "format=duration",
                    "-of",
                    "default=noprint_wrappers=1:nokey=1",
                    path_arg(path)?,
                ],
            )
            .await?;

        parse_duration(&String::from_utf8_lossy(&stdout))
    }

    async fn extract_frames(&self, path: &Path, interval: u32, max_width: u32) -> Result<Vec<Vec<u8>>> {
        let frames_dir = tempfile::tempdir()?;
        let pattern = frames_dir.path().join("frame_%06d.jpg");
        let filter = frame_filter(interval, max_width);

        self.run(
            &self.ffmpeg,
            &[
                "-hide_banner",
                "-loglevel",
                "error",
                "-i",
                path_arg(path)?,
                "-vf",
                filter.as_str(),
                "-vsync",
                "vfr",
                "-q:v",
                "3",
                path_arg(&pattern)?,
            ],
        )
        .await?;

        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(frames_dir.path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            files.push(entry.path());
        }
        files.sort();

        let mut frames = Vec::with_capacity(files.len());
        for file in files {
            frames.push(tokio::fs::read(&file).await?);
        }

        debug!(frames = frames.len(), interval = interval, "Extracted video frames");
        Ok(frames)
    }

    async fn fit_duration(&self, input: &Path, output: &Path, target_secs: f64) -> Result<()> {
        let current = self.probe_duration(input).await?;

        if target_secs <= 0.0 || current <= 0.0 {
            debug!(current = current, target = target_secs, "Skipping audio re-timing");
            tokio::fs::copy(input, output).await?;
            return Ok(());
        }

        let ratio = current / target_secs;
        if (ratio - 1.0).abs() < TEMPO_TOLERANCE {
            tokio::fs::copy(input, output).await?;
            return Ok(());
        }

        let chain = atempo_chain(ratio);
        debug!(current = current, target = target_secs, filter = %chain, "Re-timing audio");

        self.run(
            &self.ffmpeg,
            &[
                "-hide_banner",
                "-loglevel",
                "error",
                "-y",
                "-i",
                path_arg(input)?,
                "-filter:a",
                chain.as_str(),
                path_arg(output)?,
            ],
        )
        .await?;

        Ok(())
    }
}
