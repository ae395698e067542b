//! Resumable YouTube Data API v3 uploads.
//!
//! Upload is a two-step handshake: an initiation POST carrying the
//! video metadata returns a session URL in the `Location` header, then
//! the file bytes are streamed to that URL with a PUT. Quota-style
//! rejections (HTTP 403/429 with a quota reason in the body) are
//! surfaced as `QuotaExceeded` so the failover controller rotates to
//! the next account instead of failing the job.

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, LOCATION};
use serde::Deserialize;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::accounts::AccountEntry;
use crate::auth::{AccessToken, TokenManager};
use crate::error::{UploadError, UploadResult};
use crate::failover::VideoHost;
use crate::metadata::UploadMetadata;

const DEFAULT_API_BASE: &str = "https://www.googleapis.com";

const UPLOAD_PATH: &str = "/upload/youtube/v3/videos";

#[derive(Debug, Deserialize)]
struct VideoResource {
    id: String,
}

/// YouTube-backed [`VideoHost`].
#[derive(Debug, Clone)]
pub struct YoutubeClient {
    http: reqwest::Client,
    tokens: TokenManager,
    api_base: String,
}

impl YoutubeClient {
    pub fn new(http: reqwest::Client) -> Self {
        let tokens = TokenManager::new(http.clone());
        Self {
            http,
            tokens,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Point at a different API base and token endpoint (tests).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.tokens = self
            .tokens
            .clone()
            .with_token_endpoint(format!("{}/token", base));
        self.api_base = base;
        self
    }

    async fn initiate_session(
        &self,
        token: &AccessToken,
        metadata: &UploadMetadata,
    ) -> UploadResult<String> {
        let body = serde_json::json!({
            "snippet": {
                "title": metadata.title,
                "description": metadata.description,
                "tags": metadata.tags,
                "categoryId": metadata.category_id,
            },
            "status": {
                "privacyStatus": "public",
                "selfDeclaredMadeForKids": false,
            },
        });

        let response = self
            .http
            .post(format!(
                "{}{}?uploadType=resumable&part=snippet,status",
                self.api_base, UPLOAD_PATH
            ))
            .header(AUTHORIZATION, token.bearer())
            .header(CONTENT_TYPE, "application/json; charset=UTF-8")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(classify_rejection(response).await);
        }

        let session_url = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                UploadError::upload_failed("initiation response missing Location header")
            })?;

        debug!(%session_url, "Resumable upload session opened");
        Ok(session_url)
    }

    async fn send_bytes(
        &self,
        token: &AccessToken,
        session_url: &str,
        video: &Path,
    ) -> UploadResult<String> {
        let file = fs::File::open(video).await?;
        let size = file.metadata().await?.len();
        let stream = ReaderStream::new(file);

        let response = self
            .http
            .put(session_url)
            .header(AUTHORIZATION, token.bearer())
            .header(CONTENT_TYPE, "video/mp4")
            .header("Content-Length", size)
            .body(reqwest::Body::wrap_stream(stream))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(classify_rejection(response).await);
        }

        let resource: VideoResource = response.json().await?;
        Ok(resource.id)
    }
}

#[async_trait]
impl VideoHost for YoutubeClient {
    async fn authorize(&self, account: &AccountEntry) -> UploadResult<AccessToken> {
        self.tokens.authorize(account).await
    }

    async fn upload(
        &self,
        token: &AccessToken,
        video: &Path,
        metadata: &UploadMetadata,
    ) -> UploadResult<String> {
        let session_url = self.initiate_session(token, metadata).await?;
        let video_id = self.send_bytes(token, session_url.as_str(), video).await?;
        info!(%video_id, "Video published");
        Ok(video_id)
    }
}

/// Map an API rejection to the retry semantics the controller needs.
/// 403/429 with a quota or rate-limit reason means the account is
/// spent for today; everything else is an ordinary upload failure.
async fn classify_rejection(response: reqwest::Response) -> UploadError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let quota_status = status == reqwest::StatusCode::FORBIDDEN
        || status == reqwest::StatusCode::TOO_MANY_REQUESTS;
    let quota_reason = body.contains("quotaExceeded") || body.contains("rateLimitExceeded");

    if quota_status && quota_reason {
        UploadError::QuotaExceeded {
            account: "current".to_string(),
        }
    } else {
        UploadError::upload_failed(format!("API rejected upload with {}: {}", status, body))
    }
}
