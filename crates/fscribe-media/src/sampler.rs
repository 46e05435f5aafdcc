//! Fixed-interval frame sampling.
//!
//! Decodes one frame at t=0 and then every `interval` seconds until end of
//! stream. Decoding is delegated to a `FrameDecoder` capability so the
//! FFmpeg dependency stays at the edge; a decode failure skips that frame
//! and never aborts the sequence.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use fscribe_models::FrameSample;
use tracing::{debug, info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_video;

/// Frame sampling configuration.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Smallest accepted sampling interval in seconds
    pub min_interval: f64,
    /// Largest accepted sampling interval in seconds
    pub max_interval: f64,
    /// Hard cap on frames extracted per video
    pub max_frames: u32,
    /// Per-frame decode timeout in seconds
    pub decode_timeout_secs: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            min_interval: 1.0,
            max_interval: 60.0,
            max_frames: 50,
            decode_timeout_secs: 30,
        }
    }
}

/// Decodes a single frame at a timestamp into an image file.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FrameDecoder: Send + Sync {
    async fn decode_frame(&self, video: &Path, timestamp: f64, output: &Path) -> MediaResult<()>;
}

/// Production decoder shelling out to FFmpeg.
pub struct FfmpegFrameDecoder {
    timeout_secs: u64,
}

impl FfmpegFrameDecoder {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

#[async_trait]
impl FrameDecoder for FfmpegFrameDecoder {
    async fn decode_frame(&self, video: &Path, timestamp: f64, output: &Path) -> MediaResult<()> {
        let cmd = FfmpegCommand::new(video, output)
            .seek(timestamp)
            .single_frame()
            .log_level("error");

        FfmpegRunner::new().with_timeout(self.timeout_secs).run(&cmd).await
    }
}

/// Samples frames from an assembled video at a fixed interval.
pub struct FrameSampler {
    config: SamplerConfig,
    decoder: Arc<dyn FrameDecoder>,
}

impl FrameSampler {
    /// Create a sampler backed by FFmpeg.
    pub fn new(config: SamplerConfig) -> Self {
        let decoder = Arc::new(FfmpegFrameDecoder::new(config.decode_timeout_secs));
        Self { config, decoder }
    }

    /// Create a sampler with a custom decoder.
    pub fn with_decoder(config: SamplerConfig, decoder: Arc<dyn FrameDecoder>) -> Self {
        Self { config, decoder }
    }

    /// Sample frames from `video` every `interval` seconds into `frames_dir`.
    ///
    /// The video's duration is probed first; see [`sample_with_duration`]
    /// when the caller already has it.
    ///
    /// [`sample_with_duration`]: FrameSampler::sample_with_duration
    pub async fn sample(
        &self,
        video: &Path,
        interval: f64,
        frames_dir: &Path,
    ) -> MediaResult<Vec<FrameSample>> {
        let info = probe_video(video).await?;
        self.sample_with_duration(video, info.duration, interval, frames_dir).await
    }

    /// Sample frames from a video whose duration is already known.
    pub async fn sample_with_duration(
        &self,
        video: &Path,
        duration: f64,
        interval: f64,
        frames_dir: &Path,
    ) -> MediaResult<Vec<FrameSample>> {
        let interval = self.validate_interval(interval)?;
        tokio::fs::create_dir_all(frames_dir).await?;

        let timestamps = sample_timestamps(duration, interval);
        let capped = timestamps.len().min(self.config.max_frames as usize);
        if capped < timestamps.len() {
            warn!(
                "Sampling capped at {} frames ({} scheduled)",
                self.config.max_frames,
                timestamps.len()
            );
        }

        let mut samples = Vec::with_capacity(capped);
        for (index, &timestamp) in timestamps[..capped].iter().enumerate() {
            let index = index as u32;
            let output = frames_dir.join(format!("frame_{:04}.jpg", index));

            match self.decoder.decode_frame(video, timestamp, &output).await {
                Ok(()) => {
                    debug!(index, timestamp, "Frame decoded");
                    samples.push(FrameSample {
                        index,
                        timestamp,
                        image_path: output,
                    });
                }
                Err(e) => {
                    // One bad frame never aborts the sequence; the index is
                    // consumed so later frames keep their positions.
                    warn!(index, timestamp, "Skipping frame, decode failed: {}", e);
                }
            }
        }

        info!(
            video = %video.display(),
            sampled = samples.len(),
            scheduled = capped,
            "Frame sampling finished"
        );
        Ok(samples)
    }

    fn validate_interval(&self, interval: f64) -> MediaResult<f64> {
        if !interval.is_finite()
            || interval < self.config.min_interval
            || interval > self.config.max_interval
        {
            return Err(MediaError::InvalidInterval {
                value: interval,
                min: self.config.min_interval,
                max: self.config.max_interval,
            });
        }
        Ok(interval)
    }
}

/// Sampling schedule: t = 0, interval, 2*interval, ... strictly below `duration`.
pub fn sample_timestamps(duration: f64, interval: f64) -> Vec<f64> {
    let mut timestamps = Vec::new();
    if duration <= 0.0 || interval <= 0.0 {
        return timestamps;
    }
    let mut index = 0u32;
    loop {
        let t = index as f64 * interval;
        if t >= duration {
            break;
        }
        timestamps.push(t);
        index += 1;
    }
    timestamps
}
