//! Video and audio processing

pub mod ffmpeg;

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

pub use ffmpeg::FfmpegToolkit;

/// Media operations the narration pipeline depends on
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Container duration in seconds
    async fn probe_duration(&self, path: &Path) -> Result<f64>;

    /// JPEG bytes of frames 0, `interval`, `2 * interval`, ... in order,
    /// scaled down to at most `max_width` pixels wide (0 disables scaling)
    async fn extract_frames(&self, path: &Path, interval: u32, max_width: u32) -> Result<Vec<Vec<u8>>>;

    /// Re-time the audio at `input` so it lasts `target_secs`, writing to `output`
    async fn fit_duration(&self, input: &Path, output: &Path, target_secs: f64) -> Result<()>;
}
