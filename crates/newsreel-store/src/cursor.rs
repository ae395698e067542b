//! Account rotation cursor persistence.
//!
//! The cursor is a single integer naming the account index the next
//! job should start its rotation from. It is a fairness heuristic,
//! not a correctness requirement: the failover controller clamps it
//! into range and only persists it after a successful upload.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::fs;
use tracing::debug;

use crate::error::StoreResult;

/// Storage for the rotation cursor. Pure load/save, no business logic.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Load the persisted cursor, defaulting to 0 when no prior state
    /// exists or the stored value is unreadable.
    async fn load(&self) -> StoreResult<usize>;

    /// Persist a new cursor value.
    async fn save(&self, index: usize) -> StoreResult<()>;
}

/// File-backed cursor store: one small text file holding the index.
#[derive(Debug, Clone)]
pub struct FsCursorStore {
    path: PathBuf,
}

impl FsCursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CursorStore for FsCursorStore {
    async fn load(&self) -> StoreResult<usize> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let index = contents.trim().parse().unwrap_or_else(|_| {
                    debug!(
                        path = %self.path.display(),
                        "Cursor file unparseable, defaulting to 0"
                    );
                    0
                });
                Ok(index)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, index: usize) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }
        // Write-then-rename so a crash mid-write never leaves a
        // truncated cursor behind.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, index.to_string()).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!(index, path = %self.path.display(), "Saved rotation cursor");
        Ok(())
    }
}

/// In-memory cursor store for tests.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    index: AtomicUsize,
}

impl MemoryCursorStore {
    pub fn new(index: usize) -> Self {
        Self {
            index: AtomicUsize::new(index),
        }
    }

    /// Current value, for test assertions.
    pub fn current(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CursorStore for MemoryCursorStore {
    async fn load(&self) -> StoreResult<usize> {
        Ok(self.index.load(Ordering::SeqCst))
    }

    async fn save(&self, index: usize) -> StoreResult<()> {
        self.index.store(index, Ordering::SeqCst);
        Ok(())
    }
}
