//! Fire-and-forget status callbacks.
//!
//! The originating service learns about job completion through a POST
//! back to its own API. Callbacks are advisory: a dead or slow
//! receiver must never fail the job, so every error here is logged and
//! swallowed.

use std::time::Duration;

use newsreel_models::{ArticleId, VideoCompletePayload, VideoFailedPayload};
use serde::Serialize;
use tracing::{debug, warn};

const COMPLETE_PATH: &str = "/api/article/video-complete";
const FAILED_PATH: &str = "/api/article/video-failed";

/// Posts job results back to the originating service.
#[derive(Debug, Clone)]
pub struct StatusNotifier {
    http: reqwest::Client,
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Duration,
}

impl StatusNotifier {
    /// `base_url: None` disables callbacks entirely.
    pub fn new(
        http: reqwest::Client,
        base_url: Option<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            base_url: base_url.map(|b| b.trim_end_matches('/').to_string()),
            api_key,
            timeout,
        }
    }

    pub async fn video_complete(&self, article_id: &ArticleId, video_id: &str) {
        let payload = VideoCompletePayload {
            article_id: article_id.clone(),
            video_id: video_id.to_string(),
        };
        self.post(COMPLETE_PATH, &payload).await;
    }

    pub async fn video_failed(&self, article_id: &ArticleId, error: &str) {
        let payload = VideoFailedPayload {
            article_id: article_id.clone(),
            error: error.to_string(),
        };
        self.post(FAILED_PATH, &payload).await;
    }

    async fn post<T: Serialize>(&self, path: &str, payload: &T) {
        let base = match &self.base_url {
            Some(base) => base,
            None => {
                debug!(path, "callback base URL not configured, skipping");
                return;
            }
        };

        let url = format!("{}{}", base, path);
        let mut request = self.http.post(&url).timeout(self.timeout).json(payload);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                debug!(%url, "callback delivered");
            }
            Ok(response) => {
                warn!(%url, status = %response.status(), "callback rejected");
            }
            Err(e) => {
                warn!(%url, error = %e, "callback delivery failed");
            }
        }
    }
}
