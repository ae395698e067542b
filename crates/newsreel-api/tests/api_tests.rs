//! API integration tests.
//!
//! The router is exercised end to end with in-memory stores and fake
//! pipeline stages, so no ffmpeg, TTS engine or network is needed.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use newsreel_api::{create_router, ApiConfig, AppState};
use newsreel_models::{ArticleId, ImageSource, JobRequest};
use newsreel_store::{MemoryLedger, ProcessedLedger};
use newsreel_worker::{
    AdmissionGate, ImageFetcher, JobPipeline, Narrator, Publisher, Renderer, StatusSink,
    WorkerConfig, WorkerResult,
};
use tower::ServiceExt;

struct OkFetcher;
struct OkNarrator;
struct OkRenderer;
struct OkPublisher;
struct SilentStatus;

#[async_trait]
impl ImageFetcher for OkFetcher {
    async fn fetch(&self, _source: &ImageSource, dest: &Path) -> WorkerResult<()> {
        tokio::fs::write(dest, b"jpeg").await?;
        Ok(())
    }
}

#[async_trait]
impl Narrator for OkNarrator {
    async fn narrate(&self, _text: &str, dest: &Path) -> WorkerResult<()> {
        tokio::fs::write(dest, b"mp3").await?;
        Ok(())
    }
}

#[async_trait]
impl Renderer for OkRenderer {
    async fn render(
        &self,
        _image: &Path,
        _audio: &Path,
        _title: &str,
        dest: &Path,
    ) -> WorkerResult<()> {
        tokio::fs::write(dest, b"mp4").await?;
        Ok(())
    }
}

#[async_trait]
impl Publisher for OkPublisher {
    async fn publish(&self, _video: &Path, _request: &JobRequest) -> WorkerResult<String> {
        Ok("yt-test".to_string())
    }
}

#[async_trait]
impl StatusSink for SilentStatus {
    async fn video_complete(&self, _article_id: &ArticleId, _video_id: &str) {}
    async fn video_failed(&self, _article_id: &ArticleId, _error: &str) {}
}

struct TestHarness {
    state: AppState,
    ledger: Arc<MemoryLedger>,
    _work_dir: tempfile::TempDir,
    anchor_dir: tempfile::TempDir,
}

fn harness(api_key: Option<&str>) -> TestHarness {
    let work_dir = tempfile::TempDir::new().unwrap();
    let anchor_dir = tempfile::TempDir::new().unwrap();
    let ledger = Arc::new(MemoryLedger::new());

    let pipeline = Arc::new(JobPipeline::new(
        Arc::new(OkFetcher),
        Arc::new(OkNarrator),
        Arc::new(OkRenderer),
        Arc::new(OkPublisher),
        Arc::new(SilentStatus),
        ledger.clone() as Arc<dyn ProcessedLedger>,
        work_dir.path().to_path_buf(),
    ));

    let worker_config = WorkerConfig {
        work_dir: work_dir.path().to_path_buf(),
        anchor_images_dir: anchor_dir.path().to_path_buf(),
        ..WorkerConfig::default()
    };

    let state = AppState {
        config: ApiConfig {
            api_key: api_key.map(str::to_string),
            ..ApiConfig::default()
        },
        worker_config,
        gate: AdmissionGate::new(1),
        pipeline,
        ledger: ledger.clone() as Arc<dyn ProcessedLedger>,
        account_count: 0,
    };

    TestHarness {
        state,
        ledger,
        _work_dir: work_dir,
        anchor_dir,
    }
}

fn submit_request(api_key: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/generate-video")
        .header("content-type", "application/json");
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn job_body() -> serde_json::Value {
    serde_json::json!({
        "article_id": "nota-1",
        "text": "Un cuerpo de noticia suficientemente largo para narrar.",
        "title": "Titulo de la nota",
        "image": "https://example.com/img.jpg"
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_router(harness(None).state, None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_api_key_is_unauthorized() {
    let app = create_router(harness(Some("s3cret")).state, None);

    let response = app.oneshot(submit_request(None, job_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_api_key_is_unauthorized() {
    let app = create_router(harness(Some("s3cret")).state, None);

    let response = app
        .oneshot(submit_request(Some("wrong"), job_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_submission_is_accepted_and_runs() {
    let harness = harness(Some("s3cret"));
    let ledger = harness.ledger.clone();
    let app = create_router(harness.state, None);

    let response = app
        .oneshot(submit_request(Some("s3cret"), job_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    // The background job lands in the ledger once the upload succeeds.
    let article = ArticleId::new("nota-1").unwrap();
    let mut done = false;
    for _ in 0..50 {
        if ledger.is_processed(&article).await.unwrap() {
            done = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(done, "job never reached the processed ledger");
}

#[tokio::test]
async fn test_duplicate_submission_answers_already_processed() {
    let harness = harness(None);
    harness
        .ledger
        .mark_processed(&ArticleId::new("nota-1").unwrap(), "yt-old")
        .await
        .unwrap();
    let app = create_router(harness.state, None);

    let response = app.oneshot(submit_request(None, job_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "already_processed");
}

#[tokio::test]
async fn test_full_gate_answers_busy() {
    let harness = harness(None);
    let _held = harness.state.gate.try_acquire().unwrap();
    let app = create_router(harness.state, None);

    let response = app.oneshot(submit_request(None, job_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_unknown_anchor_image_is_not_found() {
    let harness = harness(None);
    let app = create_router(harness.state, None);

    let mut body = job_body();
    body["image"] = serde_json::json!("missing.jpg");

    let response = app.oneshot(submit_request(None, body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_existing_anchor_image_is_accepted() {
    let harness = harness(None);
    std::fs::write(harness.anchor_dir.path().join("studio.jpg"), b"jpeg").unwrap();
    let app = create_router(harness.state, None);

    let mut body = job_body();
    body["image"] = serde_json::json!("studio.jpg");

    let response = app.oneshot(submit_request(None, body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_invalid_article_id_is_bad_request() {
    let harness = harness(None);
    let app = create_router(harness.state, None);

    let mut body = job_body();
    body["article_id"] = serde_json::json!("has spaces!");

    let response = app.oneshot(submit_request(None, body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_text_is_bad_request() {
    let harness = harness(None);
    let app = create_router(harness.state, None);

    let mut body = job_body();
    body["text"] = serde_json::json!("");

    let response = app.oneshot(submit_request(None, body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ready_reports_missing_accounts() {
    let app = create_router(harness(None).state, None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // No upload accounts configured in the harness.
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["checks"]["accounts"]["status"], "error");
}
