//! Status callback payloads.
//!
//! After a job terminates the worker notifies the main API with one of
//! these fire-and-forget payloads. Field names follow the consuming
//! API's camelCase convention.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::article::ArticleId;

/// Payload for a successful upload notification.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoCompletePayload {
    pub article_id: ArticleId,
    /// Remote id assigned by the video host.
    pub video_id: String,
}

/// Payload for a failed job notification.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoFailedPayload {
    pub article_id: ArticleId,
    /// Human-readable message from the originating error.
    pub error: String,
}
