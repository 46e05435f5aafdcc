//! End-to-end pipeline tests over stubbed external capabilities.
//!
//! FFmpeg, Tesseract, and Gemini are replaced by in-process stubs; chunk
//! and result storage run against a temp directory, exercising the real
//! stores.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use fscribe_enrich::{
    Deduplicator, EnrichResult, EnrichmentClient, InsightBackend, TokenEstimator,
};
use fscribe_media::{
    FrameDecoder, FrameSampler, MediaResult, TextExtractor, TextRecognizer, VideoInfo, VideoProber,
};
use fscribe_models::{PipelineStage, ResultStatus, UploadId};
use fscribe_storage::{ChunkStore, ResultStore, StorageLayout};
use fscribe_worker::{Orchestrator, PipelineContext, PipelineError, PipelineOptions, WorkerConfig};
use tempfile::TempDir;

struct StubProber {
    duration: f64,
}

#[async_trait]
impl VideoProber for StubProber {
    async fn probe(&self, _path: &Path) -> MediaResult<VideoInfo> {
        Ok(VideoInfo {
            duration: self.duration,
            width: 640,
            height: 360,
            fps: 30.0,
            size: 1024,
        })
    }
}

struct StubDecoder;

#[async_trait]
impl FrameDecoder for StubDecoder {
    async fn decode_frame(&self, _video: &Path, _timestamp: f64, _output: &Path) -> MediaResult<()> {
        Ok(())
    }
}

/// Recognizer returning the same caption for every frame.
struct ConstRecognizer(&'static str);

#[async_trait]
impl TextRecognizer for ConstRecognizer {
    async fn recognize(&self, _image: &Path) -> MediaResult<String> {
        Ok(self.0.to_string())
    }
}

/// Recognizer returning a distinct caption per frame.
struct PathRecognizer;

#[async_trait]
impl TextRecognizer for PathRecognizer {
    async fn recognize(&self, image: &Path) -> MediaResult<String> {
        Ok(format!("caption for {}", image.file_stem().unwrap().to_string_lossy()))
    }
}

struct StubBackend {
    calls: AtomicU32,
    delay: Duration,
}

impl StubBackend {
    fn fast() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            delay: Duration::ZERO,
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            delay,
        })
    }
}

#[async_trait]
impl InsightBackend for StubBackend {
    async fn generate(&self, _prompt: &str) -> EnrichResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(serde_json::json!({
            "sentiment": "neutral",
            "keywords": ["caption"],
            "summary": "A caption.",
            "complexity": "Easy"
        })
        .to_string())
    }
}

fn test_config() -> WorkerConfig {
    WorkerConfig {
        enrich_requests_per_second: 1000,
        ..Default::default()
    }
}

fn build_context(
    dir: &TempDir,
    duration: f64,
    recognizer: Arc<dyn TextRecognizer>,
    backend: Arc<dyn InsightBackend>,
) -> (PipelineContext, ChunkStore, ResultStore) {
    let layout = StorageLayout::under(dir.path());
    let config = test_config();
    let chunks = ChunkStore::new(layout.clone());
    let results = ResultStore::new(layout.clone());

    let ctx = PipelineContext {
        config: config.clone(),
        layout,
        chunks: chunks.clone(),
        results: results.clone(),
        prober: Arc::new(StubProber { duration }),
        sampler: FrameSampler::with_decoder(config.sampler_config(), Arc::new(StubDecoder)),
        extractor: TextExtractor::new(recognizer),
        deduplicator: Deduplicator::new(config.dedup_policy()),
        enrichment: Arc::new(
            EnrichmentClient::new(backend, config.enrichment_config()).unwrap(),
        ),
        estimator: TokenEstimator::default(),
    };

    (ctx, chunks, results)
}

async fn wait_terminal(orchestrator: &Orchestrator, id: &UploadId) -> PipelineStage {
    for _ in 0..500 {
        if let Some(status) = orchestrator.status(id).await {
            if status.is_terminal() {
                return status.stage;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("pipeline did not reach a terminal state");
}

#[tokio::test]
async fn test_full_pipeline_with_insights() {
    let dir = TempDir::new().unwrap();
    let backend = StubBackend::fast();
    let (ctx, chunks, results) = build_context(
        &dir,
        10.0,
        Arc::new(ConstRecognizer("Lecture slide one")),
        backend.clone(),
    );

    let id = UploadId::parse("u1").unwrap();
    let put = chunks.put_chunk(&id, 1, 1, b"fake video bytes").await.unwrap();
    assert!(put.is_completed());

    let orchestrator = Orchestrator::new(ctx);
    orchestrator
        .submit(
            id.clone(),
            PipelineOptions {
                ai_insights: true,
                frame_interval: 2.0,
            },
        )
        .await
        .unwrap();

    assert_eq!(wait_terminal(&orchestrator, &id).await, PipelineStage::Done);

    let status = orchestrator.status(&id).await.unwrap();
    // 10s at 2s intervals: t = 0, 2, 4, 6, 8
    assert_eq!(status.frames_sampled, 5);
    // Identical captions collapse to one unit
    assert_eq!(status.units_kept, 1);
    assert_eq!(status.entries_enriched, 1);

    let doc = results.read("u1.mp4").await.unwrap().unwrap();
    assert_eq!(doc.status, ResultStatus::Completed);
    assert_eq!(doc.entries.len(), 1);
    assert_eq!(doc.entries[0].original_text, "Lecture slide one");
    assert_eq!(doc.entries[0].insights.len(), 1);
    assert!(!doc.entries[0].insights[0].is_sentinel());
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_pipeline_without_insights_skips_backend() {
    let dir = TempDir::new().unwrap();
    let backend = StubBackend::fast();
    let (ctx, chunks, results) = build_context(&dir, 10.0, Arc::new(PathRecognizer), backend.clone());

    let id = UploadId::parse("u2").unwrap();
    chunks.put_chunk(&id, 1, 1, b"bytes").await.unwrap();

    let orchestrator = Orchestrator::new(ctx);
    orchestrator
        .submit(
            id.clone(),
            PipelineOptions {
                ai_insights: false,
                frame_interval: 2.0,
            },
        )
        .await
        .unwrap();

    assert_eq!(wait_terminal(&orchestrator, &id).await, PipelineStage::Done);

    let doc = results.read("u2.mp4").await.unwrap().unwrap();
    // Distinct captions all survive deduplication
    assert_eq!(doc.entries.len(), 5);
    assert!(doc.entries.iter().all(|e| e.insights.is_empty()));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_submit_unknown_upload_is_synchronous_error() {
    let dir = TempDir::new().unwrap();
    let (ctx, _chunks, _results) =
        build_context(&dir, 10.0, Arc::new(PathRecognizer), StubBackend::fast());

    let orchestrator = Orchestrator::new(ctx);
    let err = orchestrator
        .submit(
            UploadId::parse("missing").unwrap(),
            PipelineOptions {
                ai_insights: false,
                frame_interval: 2.0,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::MissingVideo(_)));
    assert!(err.is_submission_error());
}

#[tokio::test]
async fn test_submit_invalid_interval_rejected_before_processing() {
    let dir = TempDir::new().unwrap();
    let (ctx, chunks, _results) =
        build_context(&dir, 10.0, Arc::new(PathRecognizer), StubBackend::fast());

    let id = UploadId::parse("u3").unwrap();
    chunks.put_chunk(&id, 1, 1, b"bytes").await.unwrap();

    let orchestrator = Orchestrator::new(ctx);
    let err = orchestrator
        .submit(
            id,
            PipelineOptions {
                ai_insights: false,
                frame_interval: 0.01,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::InvalidConfiguration(_)));
}

#[tokio::test]
async fn test_duplicate_submission_rejected_while_running() {
    let dir = TempDir::new().unwrap();
    let backend = StubBackend::slow(Duration::from_millis(200));
    let (ctx, chunks, _results) =
        build_context(&dir, 10.0, Arc::new(PathRecognizer), backend);

    let id = UploadId::parse("u4").unwrap();
    chunks.put_chunk(&id, 1, 1, b"bytes").await.unwrap();

    let orchestrator = Orchestrator::new(ctx);
    let options = PipelineOptions {
        ai_insights: true,
        frame_interval: 2.0,
    };

    orchestrator.submit(id.clone(), options.clone()).await.unwrap();
    let err = orchestrator.submit(id.clone(), options).await.unwrap_err();
    assert!(matches!(err, PipelineError::AlreadyProcessing(_)));

    wait_terminal(&orchestrator, &id).await;
}

#[tokio::test]
async fn test_cancel_persists_error_record() {
    let dir = TempDir::new().unwrap();
    let backend = StubBackend::slow(Duration::from_millis(100));
    let (ctx, chunks, results) =
        build_context(&dir, 10.0, Arc::new(PathRecognizer), backend);

    let id = UploadId::parse("u5").unwrap();
    chunks.put_chunk(&id, 1, 1, b"bytes").await.unwrap();

    let orchestrator = Orchestrator::new(ctx);
    orchestrator
        .submit(
            id.clone(),
            PipelineOptions {
                ai_insights: true,
                frame_interval: 2.0,
            },
        )
        .await
        .unwrap();

    assert!(orchestrator.cancel(&id).await);
    assert_eq!(wait_terminal(&orchestrator, &id).await, PipelineStage::Failed);

    let doc = results.read("u5.mp4").await.unwrap().unwrap();
    assert_eq!(doc.status, ResultStatus::Failed);
    assert!(doc.error.is_some());
    assert!(doc.entries.is_empty());
}
