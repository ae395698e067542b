//! Request handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use metrics::counter;
use newsreel_models::{ArticleId, ImageSource, JobRequest};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::metrics::names;
use crate::state::AppState;

/// Wire format of a job submission.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateVideoRequest {
    #[serde(alias = "articleId")]
    pub article_id: String,

    #[validate(length(min = 1, message = "text must not be empty"))]
    pub text: String,

    #[validate(length(min = 1, max = 500, message = "title must be 1-500 characters"))]
    pub title: String,

    /// Remote URL or anchor-image file name.
    #[serde(alias = "imageUrl")]
    pub image: String,

    #[serde(default, alias = "articleUrl")]
    pub article_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateVideoResponse {
    pub status: &'static str,
    #[serde(rename = "articleId")]
    pub article_id: ArticleId,
}

/// Submit an article for video generation.
///
/// The job runs in the background; the response only says whether it
/// was admitted. Exactly one job runs per gate slot, and an article
/// that already produced a video is acknowledged without re-running.
pub async fn generate_video(
    State(state): State<AppState>,
    Json(payload): Json<GenerateVideoRequest>,
) -> ApiResult<(StatusCode, Json<GenerateVideoResponse>)> {
    payload.validate()?;

    let article_id = ArticleId::new(payload.article_id)
        .map_err(|e| ApiError::bad_request(format!("invalid article id: {}", e)))?;

    let image = ImageSource::resolve(&payload.image, &state.worker_config.anchor_images_dir)
        .ok_or_else(|| {
            ApiError::not_found(format!("unknown image reference '{}'", payload.image))
        })?;

    // Duplicate check before taking a gate slot.
    if state.ledger.is_processed(&article_id).await? {
        counter!(names::JOBS_DUPLICATE_TOTAL).increment(1);
        return Ok((
            StatusCode::OK,
            Json(GenerateVideoResponse {
                status: "already_processed",
                article_id,
            }),
        ));
    }

    let permit = match state.gate.try_acquire() {
        Some(permit) => permit,
        None => {
            counter!(names::JOBS_REJECTED_BUSY_TOTAL).increment(1);
            return Err(ApiError::Busy);
        }
    };

    let request = JobRequest {
        article_id: article_id.clone(),
        text: payload.text,
        title: payload.title,
        image,
        article_url: payload.article_url,
    };

    info!(article = %article_id, "job admitted");
    counter!(names::JOBS_ACCEPTED_TOTAL).increment(1);

    let pipeline = state.pipeline.clone();
    tokio::spawn(async move {
        pipeline.run(permit, request).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(GenerateVideoResponse {
            status: "accepted",
            article_id,
        }),
    ))
}

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub work_dir: CheckStatus,
    pub ffmpeg: CheckStatus,
    pub accounts: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckStatus {
    fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: Some(msg.into()),
        }
    }
}

/// Readiness check endpoint. Verifies the scratch directory is
/// writable, ffmpeg is on PATH and at least one upload account exists.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let work_dir = match tokio::fs::create_dir_all(&state.worker_config.work_dir).await {
        Ok(()) => CheckStatus::ok(),
        Err(e) => CheckStatus::error(e.to_string()),
    };

    let ffmpeg = match which::which("ffmpeg") {
        Ok(_) => CheckStatus::ok(),
        Err(e) => CheckStatus::error(e.to_string()),
    };

    let accounts = if state.account_count > 0 {
        CheckStatus::ok()
    } else {
        CheckStatus::error("no upload accounts configured")
    };

    let all_ok = [&work_dir, &ffmpeg, &accounts]
        .iter()
        .all(|c| c.status == "ok");

    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            status: if all_ok { "ready" } else { "not_ready" }.to_string(),
            checks: ReadinessChecks {
                work_dir,
                ffmpeg,
                accounts,
            },
        }),
    )
}
