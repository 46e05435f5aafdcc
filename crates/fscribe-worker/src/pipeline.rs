//! Per-upload processing pipeline.
//!
//! Stages run sequentially for one upload: locate the assembled video,
//! sample frames, OCR them, deduplicate the captions, enrich, persist.
//! Frame and segment failures are absorbed by the stages themselves; an
//! error escaping this module is fatal for this upload only.

use std::path::Path;
use std::sync::Arc;

use fscribe_enrich::{
    CancelFlag, Deduplicator, EnrichmentClient, InsightBackend, TokenEstimator,
};
use fscribe_media::{
    FfprobeProber, FrameSampler, MediaError, TesseractRecognizer, TextExtractor, VideoProber,
};
use fscribe_models::{EnrichedEntry, PipelineStage, ResultDocument, TextUnit, UploadId};
use fscribe_storage::{ChunkStore, ResultStore, StorageLayout};
use tracing::info;

use crate::config::WorkerConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::JobLogger;
use crate::orchestrator::StatusRegistry;

/// Processing option enabling the enrichment stage.
pub const OPTION_AI_INSIGHTS: &str = "ai_insights";

/// Per-submission processing options.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Run the enrichment stage
    pub ai_insights: bool,
    /// Frame sampling interval in seconds
    pub frame_interval: f64,
}

impl PipelineOptions {
    /// Build options from the trigger request's option strings.
    pub fn from_request(options: &[String], default_interval: f64) -> Self {
        Self {
            ai_insights: options.iter().any(|o| o == OPTION_AI_INSIGHTS),
            frame_interval: default_interval,
        }
    }
}

/// Everything a pipeline run needs, constructed once and shared.
pub struct PipelineContext {
    pub config: WorkerConfig,
    pub layout: StorageLayout,
    pub chunks: ChunkStore,
    pub results: ResultStore,
    pub prober: Arc<dyn VideoProber>,
    pub sampler: FrameSampler,
    pub extractor: TextExtractor,
    pub deduplicator: Deduplicator,
    pub enrichment: Arc<EnrichmentClient>,
    pub estimator: TokenEstimator,
}

impl PipelineContext {
    /// Build a production context over FFmpeg, Tesseract, and the given
    /// generative backend.
    pub fn production(
        config: WorkerConfig,
        layout: StorageLayout,
        backend: Arc<dyn InsightBackend>,
    ) -> PipelineResult<Self> {
        let chunks = ChunkStore::new(layout.clone());
        let results = ResultStore::new(layout.clone());
        let recognizer = TesseractRecognizer::new(&config.ocr_lang)?;
        let sampler = FrameSampler::new(config.sampler_config());
        let enrichment = Arc::new(EnrichmentClient::new(backend, config.enrichment_config())?);
        let deduplicator = Deduplicator::new(config.dedup_policy());

        Ok(Self {
            config,
            layout,
            chunks,
            results,
            prober: Arc::new(FfprobeProber),
            sampler,
            extractor: TextExtractor::new(Arc::new(recognizer)),
            deduplicator,
            enrichment,
            estimator: TokenEstimator::default(),
        })
    }
}

/// Run the full pipeline for one upload.
///
/// On success the result document has been persisted; the caller persists
/// an error record when this returns an error.
pub async fn run_pipeline(
    ctx: &PipelineContext,
    upload_id: &UploadId,
    options: &PipelineOptions,
    cancel: &CancelFlag,
    registry: &StatusRegistry,
) -> PipelineResult<()> {
    let logger = JobLogger::new(upload_id);
    logger.log_start(&format!(
        "interval={}s ai_insights={}",
        options.frame_interval, options.ai_insights
    ));

    registry.update(upload_id, |s| s.set_stage(PipelineStage::Assembling)).await;
    let video = ctx
        .chunks
        .assembled_video(upload_id)
        .await
        .ok_or_else(|| PipelineError::missing_video(upload_id.as_str()))?;
    let video_file = video_file_name(&video);

    check_cancel(cancel)?;
    let info = ctx.prober.probe(&video).await?;
    if info.size > ctx.config.max_video_bytes {
        return Err(PipelineError::VideoTooLarge {
            size: info.size,
            max: ctx.config.max_video_bytes,
        });
    }

    // Extract: sample frames, then OCR each one. Per-frame decode or OCR
    // failures were already absorbed downstream of here.
    registry.update(upload_id, |s| s.set_stage(PipelineStage::Extracting)).await;
    logger.log_stage("extracting", "Sampling frames");

    let frames_dir = ctx.layout.frames_dir(upload_id);
    let samples = ctx
        .sampler
        .sample_with_duration(&video, info.duration, options.frame_interval, &frames_dir)
        .await
        .map_err(|e| match e {
            MediaError::InvalidInterval { .. } => PipelineError::invalid_configuration(e.to_string()),
            other => PipelineError::Media(other),
        })?;
    registry
        .update(upload_id, |s| s.frames_sampled = samples.len() as u32)
        .await;

    let mut units = Vec::with_capacity(samples.len());
    for sample in &samples {
        check_cancel(cancel)?;
        let mut unit = ctx.extractor.extract(sample).await;
        unit.token_count = ctx.estimator.estimate(&unit.text);
        units.push(unit);
    }

    registry.update(upload_id, |s| s.set_stage(PipelineStage::Deduplicating)).await;
    let before = units.len();
    let units = ctx.deduplicator.deduplicate(units);
    logger.log_stage(
        "deduplicating",
        &format!("{} units kept of {}", units.len(), before),
    );
    registry
        .update(upload_id, |s| s.units_kept = units.len() as u32)
        .await;

    check_cancel(cancel)?;
    let entries = if options.ai_insights {
        registry.update(upload_id, |s| s.set_stage(PipelineStage::Enriching)).await;
        enrich_units(ctx, upload_id, units, cancel, registry).await?
    } else {
        units.into_iter().map(plain_entry).collect()
    };

    check_cancel(cancel)?;
    let doc = ResultDocument::completed(upload_id.clone(), video_file, entries);
    ctx.results.write(&doc).await?;

    registry.update(upload_id, |s| s.complete()).await;
    logger.log_completion(&format!("{} entries persisted", doc.entries.len()));
    Ok(())
}

/// Enrich every kept unit, one entry at a time.
async fn enrich_units(
    ctx: &PipelineContext,
    upload_id: &UploadId,
    units: Vec<TextUnit>,
    cancel: &CancelFlag,
    registry: &StatusRegistry,
) -> PipelineResult<Vec<EnrichedEntry>> {
    let mut entries = Vec::with_capacity(units.len());
    for unit in &units {
        check_cancel(cancel)?;
        let entry = ctx.enrichment.enrich(unit, cancel).await;
        entries.push(entry);
        registry
            .update(upload_id, |s| s.entries_enriched += 1)
            .await;
    }
    info!(upload_id = %upload_id, entries = entries.len(), "Enrichment finished");
    Ok(entries)
}

/// Entry for a unit when enrichment is disabled: no segments, no insights.
fn plain_entry(unit: TextUnit) -> EnrichedEntry {
    EnrichedEntry {
        original_text: unit.text,
        frame_path: unit.source,
        total_tokens: unit.token_count,
        insights: Vec::new(),
    }
}

/// File name component of the assembled video path.
fn video_file_name(video: &Path) -> String {
    video
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video.mp4".to_string())
}

fn check_cancel(cancel: &CancelFlag) -> PipelineResult<()> {
    if cancel.is_cancelled() {
        Err(PipelineError::Cancelled)
    } else {
        Ok(())
    }
}
