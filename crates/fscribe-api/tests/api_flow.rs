//! Router-level integration tests.
//!
//! The full upload → process flow runs against real chunk/result stores in
//! a temp directory, with FFmpeg, Tesseract, and Gemini replaced by stubs.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use fscribe_enrich::{
    Deduplicator, EnrichResult, EnrichmentClient, InsightBackend, TokenEstimator,
};
use fscribe_media::{
    FrameDecoder, FrameSampler, MediaResult, TextExtractor, TextRecognizer, VideoInfo, VideoProber,
};
use fscribe_storage::{ChunkStore, ResultStore, StorageLayout};
use fscribe_worker::{PipelineContext, WorkerConfig};

use fscribe_api::{create_router, ApiConfig, AppState};

const BOUNDARY: &str = "fscribe-test-boundary";

struct StubProber;

#[async_trait]
impl VideoProber for StubProber {
    async fn probe(&self, _path: &Path) -> MediaResult<VideoInfo> {
        Ok(VideoInfo {
            duration: 6.0,
            width: 640,
            height: 360,
            fps: 30.0,
            size: 512,
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

struct StubRecognizer;

#[async_trait]
impl TextRecognizer for StubRecognizer {
    async fn recognize(&self, _image: &Path) -> MediaResult<String> {
        Ok("Chapter 1: Ownership".to_string())
    }
}

struct StubBackend;

#[async_trait]
impl InsightBackend for StubBackend {
    async fn generate(&self, _prompt: &str) -> EnrichResult<String> {
        Ok(serde_json::json!({
            "sentiment": "neutral",
            "keywords": ["ownership"],
            "summary": "Introduces ownership.",
            "complexity": "Standard"
        })
        .to_string())
    }
}

fn test_app(dir: &TempDir) -> (Router, ResultStore) {
    let layout = StorageLayout::under(dir.path());
    let worker_config = WorkerConfig {
        enrich_requests_per_second: 1000,
        ..Default::default()
    };

    let chunks = ChunkStore::new(layout.clone());
    let results = ResultStore::new(layout.clone());

    let ctx = PipelineContext {
        config: worker_config.clone(),
        layout,
        chunks,
        results: results.clone(),
        prober: Arc::new(StubProber),
        sampler: FrameSampler::with_decoder(worker_config.sampler_config(), Arc::new(StubDecoder)),
        extractor: TextExtractor::new(Arc::new(StubRecognizer)),
        deduplicator: Deduplicator::new(worker_config.dedup_policy()),
        enrichment: Arc::new(
            EnrichmentClient::new(Arc::new(StubBackend), worker_config.enrichment_config()).unwrap(),
        ),
        estimator: TokenEstimator::default(),
    };

    let state = AppState::with_context(ApiConfig::default(), worker_config, ctx);
    (create_router(state, None), results)
}

fn text_part(name: &str, value: &str) -> Vec<u8> {
    format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
    )
    .into_bytes()
}

fn chunk_request(upload_id: Option<&str>, chunk_number: u32, total_chunks: u32, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend(text_part("chunk_number", &chunk_number.to_string()));
    body.extend(text_part("total_chunks", &total_chunks.to_string()));
    if let Some(id) = upload_id {
        body.extend(text_part("upload_id", id));
    }
    body.extend(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"part.bin\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend(format!("\r\n--{BOUNDARY}--\r\n").into_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload/chunked")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_out_of_order_chunks_complete_on_final_arrival() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir);

    // seq 2, then 1: both partial
    for seq in [2u32, 1] {
        let response = app
            .clone()
            .oneshot(chunk_request(Some("u1"), seq, 3, format!("part{}", seq).as_bytes()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "partial");
        assert_eq!(body["upload_id"], "u1");
    }

    // seq 3 completes the upload
    let response = app
        .clone()
        .oneshot(chunk_request(Some("u1"), 3, 3, b"part3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["total_chunks_expected"], 3);

    // Assembled bytes are chunk1 + chunk2 + chunk3 in numeric order
    let assembled = tokio::fs::read(dir.path().join("videos/u1.mp4")).await.unwrap();
    assert_eq!(assembled, b"part1part2part3");

    // Session status reflects assembly
    let response = app
        .oneshot(
            Request::builder()
                .uri("/upload/u1/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["status"], "assembled");
    assert_eq!(body["chunks_uploaded"], 3);
}

#[tokio::test]
async fn test_upload_generates_id_when_absent() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir);

    let response = app
        .oneshot(chunk_request(None, 1, 2, b"data"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert!(!body["upload_id"].as_str().unwrap().is_empty());
    assert_eq!(body["status"], "partial");
}

#[tokio::test]
async fn test_invalid_chunk_number_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir);

    let response = app
        .oneshot(chunk_request(Some("u1"), 0, 3, b"data"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_process_unknown_upload_is_not_found() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/process")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"upload_id":"ghost","processing_options":[]}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_trigger_acknowledges_and_pipeline_persists_results() {
    let dir = TempDir::new().unwrap();
    let (app, results) = test_app(&dir);

    // One-chunk upload assembles immediately
    let response = app
        .clone()
        .oneshot(chunk_request(Some("u1"), 1, 1, b"tiny video"))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["status"], "completed");

    // Trigger returns immediately with an acknowledgement
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/process")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"upload_id":"u1","processing_options":["ai_insights"]}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "processing_started");
    assert_eq!(body["upload_id"], "u1");

    // Completion is observed by polling
    let mut stage = String::new();
    for _ in 0..500 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/process/u1/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        stage = body["stage"].as_str().unwrap_or_default().to_string();
        if stage == "done" || stage == "failed" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(stage, "done");

    // 6s at the default 2s interval: frames at t = 0, 2, 4; identical
    // captions deduplicate to one enriched entry
    let doc = results.read("u1.mp4").await.unwrap().unwrap();
    assert_eq!(doc.entries.len(), 1);
    assert_eq!(doc.entries[0].original_text, "Chapter 1: Ownership");
    assert_eq!(doc.entries[0].insights.len(), 1);
}

#[tokio::test]
async fn test_cancel_without_run_is_not_found() {
    let dir = TempDir::new().unwrap();
    let (app, _) = test_app(&dir);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/process/u1/cancel")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
