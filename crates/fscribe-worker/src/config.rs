//! Worker configuration.

use fscribe_enrich::{DedupPolicy, EnrichmentConfig, RetryConfig};
use fscribe_media::SamplerConfig;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrently running pipelines
    pub max_concurrent_pipelines: usize,
    /// Default frame sampling interval in seconds
    pub frame_interval: f64,
    /// Smallest accepted sampling interval
    pub min_frame_interval: f64,
    /// Largest accepted sampling interval
    pub max_frame_interval: f64,
    /// Hard cap on frames extracted per video
    pub max_frames: u32,
    /// Largest accepted assembled video, in bytes
    pub max_video_bytes: u64,
    /// Token budget per enrichment segment
    pub max_tokens_per_segment: usize,
    /// Enrichment backend call throttle
    pub enrich_requests_per_second: u32,
    /// OCR language passed to the recognizer
    pub ocr_lang: String,
    /// Per-frame decode timeout in seconds
    pub decode_timeout_secs: u64,
    /// Optional near-duplicate threshold; exact matching when unset
    pub dedup_overlap_threshold: Option<f64>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_pipelines: 2,
            frame_interval: 2.0,
            min_frame_interval: 1.0,
            max_frame_interval: 60.0,
            max_frames: 50,
            max_video_bytes: 1024 * 1024 * 1024, // 1 GiB
            max_tokens_per_segment: 2000,
            enrich_requests_per_second: 2,
            ocr_lang: "eng".to_string(),
            decode_timeout_secs: 30,
            dedup_overlap_threshold: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_pipelines: env_parse("WORKER_MAX_PIPELINES", defaults.max_concurrent_pipelines),
            frame_interval: env_parse("FRAME_INTERVAL_SECS", defaults.frame_interval),
            min_frame_interval: env_parse("FRAME_INTERVAL_MIN", defaults.min_frame_interval),
            max_frame_interval: env_parse("FRAME_INTERVAL_MAX", defaults.max_frame_interval),
            max_frames: env_parse("MAX_FRAMES", defaults.max_frames),
            max_video_bytes: env_parse("MAX_VIDEO_BYTES", defaults.max_video_bytes),
            max_tokens_per_segment: env_parse("MAX_TOKENS_PER_SEGMENT", defaults.max_tokens_per_segment),
            enrich_requests_per_second: env_parse("ENRICH_RPS", defaults.enrich_requests_per_second),
            ocr_lang: std::env::var("OCR_LANG").unwrap_or(defaults.ocr_lang),
            decode_timeout_secs: env_parse("FRAME_DECODE_TIMEOUT_SECS", defaults.decode_timeout_secs),
            dedup_overlap_threshold: std::env::var("DEDUP_OVERLAP_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }

    /// Sampler configuration derived from this config.
    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            min_interval: self.min_frame_interval,
            max_interval: self.max_frame_interval,
            max_frames: self.max_frames,
            decode_timeout_secs: self.decode_timeout_secs,
        }
    }

    /// Deduplication policy derived from this config.
    pub fn dedup_policy(&self) -> DedupPolicy {
        match self.dedup_overlap_threshold {
            Some(threshold) => DedupPolicy::Overlap { threshold },
            None => DedupPolicy::Exact,
        }
    }

    /// Enrichment configuration derived from this config.
    pub fn enrichment_config(&self) -> EnrichmentConfig {
        EnrichmentConfig {
            max_tokens_per_segment: self.max_tokens_per_segment,
            retry: RetryConfig::new("enrich_segment"),
            requests_per_second: self.enrich_requests_per_second,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
