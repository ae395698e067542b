//! Duplicate-marker ledger.
//!
//! One durable marker per article id, created only after a confirmed
//! successful upload. Marker existence is monotonic: once written, the
//! article is never reprocessed. This is the system's idempotency
//! boundary against caller re-delivery.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::StoreResult;
use newsreel_models::ArticleId;

/// Marker record contents. Informational only; presence of the marker
/// is what carries meaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedMarker {
    /// Remote id assigned by the video host.
    pub remote_id: String,
    /// When the upload completed.
    pub processed_at: DateTime<Utc>,
}

/// Durable set of processed article ids.
#[async_trait]
pub trait ProcessedLedger: Send + Sync {
    /// Whether this article has already been uploaded successfully.
    async fn is_processed(&self, article_id: &ArticleId) -> StoreResult<bool>;

    /// Record a confirmed successful upload. Calling twice for the
    /// same id is a safe overwrite, never a duplicate.
    async fn mark_processed(&self, article_id: &ArticleId, remote_id: &str) -> StoreResult<()>;
}

/// Filesystem ledger: one `{article_id}.done` JSON file per article
/// in a dedicated directory.
#[derive(Debug, Clone)]
pub struct FsLedger {
    dir: PathBuf,
}

impl FsLedger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn marker_path(&self, article_id: &ArticleId) -> PathBuf {
        self.dir.join(format!("{}.done", article_id))
    }
}

#[async_trait]
impl ProcessedLedger for FsLedger {
    async fn is_processed(&self, article_id: &ArticleId) -> StoreResult<bool> {
        Ok(fs::try_exists(self.marker_path(article_id)).await?)
    }

    async fn mark_processed(&self, article_id: &ArticleId, remote_id: &str) -> StoreResult<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).await?;
        }
        let marker = ProcessedMarker {
            remote_id: remote_id.to_string(),
            processed_at: Utc::now(),
        };
        let path = self.marker_path(article_id);
        if path.exists() {
            warn!(article_id = %article_id, "Marker already exists, overwriting");
        }
        fs::write(&path, serde_json::to_vec_pretty(&marker)?).await?;
        debug!(article_id = %article_id, remote_id, "Marked article as processed");
        Ok(())
    }
}

/// In-memory ledger for tests.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    markers: RwLock<HashMap<ArticleId, ProcessedMarker>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded markers, for test assertions.
    pub async fn len(&self) -> usize {
        self.markers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.markers.read().await.is_empty()
    }
}

#[async_trait]
impl ProcessedLedger for MemoryLedger {
    async fn is_processed(&self, article_id: &ArticleId) -> StoreResult<bool> {
        Ok(self.markers.read().await.contains_key(article_id))
    }

    async fn mark_processed(&self, article_id: &ArticleId, remote_id: &str) -> StoreResult<()> {
        self.markers.write().await.insert(
            article_id.clone(),
            ProcessedMarker {
                remote_id: remote_id.to_string(),
                processed_at: Utc::now(),
            },
        );
        Ok(())
    }
}
