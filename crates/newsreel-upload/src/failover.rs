//! Account rotation with quota failover.
//!
//! Uploads walk the account pool starting at a persisted cursor. A
//! quota-exhausted or auth-broken account is skipped; the first
//! account that accepts the video wins and the cursor moves past it
//! so the next job starts on a fresh account. Each attempt iterates
//! every account at most once before giving up.

use std::path::Path;

use async_trait::async_trait;
use newsreel_store::CursorStore;
use tracing::{info, warn};

use crate::accounts::{AccountEntry, AccountPool};
use crate::auth::AccessToken;
use crate::error::{UploadError, UploadResult};
use crate::metadata::UploadMetadata;

/// A video hosting backend that authenticates per account.
#[async_trait]
pub trait VideoHost: Send + Sync {
    /// Obtain a usable access token for the account.
    async fn authorize(&self, account: &AccountEntry) -> UploadResult<AccessToken>;

    /// Upload the video, returning the remote video id.
    async fn upload(
        &self,
        token: &AccessToken,
        video: &Path,
        metadata: &UploadMetadata,
    ) -> UploadResult<String>;
}

/// Rotates uploads across the account pool.
pub struct UploadController<H, C> {
    host: H,
    pool: AccountPool,
    cursor: C,
}

impl<H: VideoHost, C: CursorStore> UploadController<H, C> {
    pub fn new(host: H, pool: AccountPool, cursor: C) -> Self {
        Self { host, pool, cursor }
    }

    /// Upload `video`, failing over across accounts on quota or auth
    /// errors. Returns the remote video id on success.
    pub async fn upload(&self, video: &Path, metadata: &UploadMetadata) -> UploadResult<String> {
        let total = self.pool.len();
        if total == 0 {
            return Err(UploadError::NoAccountsConfigured);
        }

        // Stale or hand-edited cursor files may point past the pool.
        let start = self.cursor.load().await? % total;

        for step in 0..total {
            let index = (start + step) % total;
            let account = match self.pool.get(index) {
                Some(account) => account,
                None => continue,
            };

            let token = match self.host.authorize(account).await {
                Ok(token) => token,
                Err(UploadError::AuthUnavailable { account, reason }) => {
                    warn!(account = %account, %reason, "account credentials unusable, skipping");
                    continue;
                }
                Err(other) => return Err(other),
            };

            match self.host.upload(&token, video, metadata).await {
                Ok(video_id) => {
                    info!(account = %account.name, %video_id, "upload accepted");
                    self.cursor.save((index + 1) % total).await?;
                    return Ok(video_id);
                }
                Err(UploadError::QuotaExceeded { .. }) => {
                    warn!(account = %account.name, "quota exhausted, rotating to next account");
                    continue;
                }
                Err(other) => {
                    warn!(account = %account.name, error = %other, "upload failed, trying next account");
                    continue;
                }
            }
        }

        Err(UploadError::AllAccountsExhausted { attempted: total })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use chrono::{Duration, Utc};
    use newsreel_store::MemoryCursorStore;

    use super::*;

    #[derive(Default)]
    struct FakeHost {
        quota_accounts: Vec<usize>,
        broken_accounts: Vec<usize>,
        upload_order: Mutex<Vec<usize>>,
    }

    impl FakeHost {
        fn with_quota_on(mut self, indices: &[usize]) -> Self {
            self.quota_accounts = indices.to_vec();
            self
        }

        fn with_broken_auth_on(mut self, indices: &[usize]) -> Self {
            self.broken_accounts = indices.to_vec();
            self
        }

        fn uploads(&self) -> Vec<usize> {
            self.upload_order.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VideoHost for FakeHost {
        async fn authorize(&self, account: &AccountEntry) -> UploadResult<AccessToken> {
            if self.broken_accounts.contains(&account.index) {
                return Err(UploadError::auth_unavailable(
                    &account.name,
                    "token file missing",
                ));
            }
            Ok(AccessToken::new(
                format!("token-{}", account.index),
                Utc::now() + Duration::hours(1),
            ))
        }

        async fn upload(
            &self,
            token: &AccessToken,
            _video: &Path,
            _metadata: &UploadMetadata,
        ) -> UploadResult<String> {
            let index: usize = token
                .secret()
                .strip_prefix("token-")
                .unwrap()
                .parse()
                .unwrap();
            self.upload_order.lock().unwrap().push(index);
            if self.quota_accounts.contains(&index) {
                return Err(UploadError::QuotaExceeded {
                    account: format!("account_{}", index),
                });
            }
            Ok(format!("vid-{}", index))
        }
    }

    fn pool_of(n: usize) -> AccountPool {
        AccountPool::from_entries(
            (0..n)
                .map(|i| AccountEntry {
                    index: i,
                    name: format!("account_{}", i),
                    client_secret_path: PathBuf::from(format!("client_secret_{}.json", i)),
                    token_path: PathBuf::from(format!("token_{}.json", i)),
                })
                .collect(),
        )
    }

    fn metadata() -> UploadMetadata {
        UploadMetadata::for_article("t", "b", None)
    }

    #[tokio::test]
    async fn test_all_quota_exhausted_tries_each_account_once() {
        let host = FakeHost::default().with_quota_on(&[0, 1, 2, 3]);
        let cursor = MemoryCursorStore::new(2);
        let controller = UploadController::new(host, pool_of(4), cursor);

        let err = controller
            .upload(Path::new("v.mp4"), &metadata())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            UploadError::AllAccountsExhausted { attempted: 4 }
        ));
        // Rotation starts at the persisted cursor and wraps.
        assert_eq!(controller.host.uploads(), vec![2, 3, 0, 1]);
        // Cursor only advances on success.
        assert_eq!(controller.cursor.current(), 2);
    }

    #[tokio::test]
    async fn test_success_mid_rotation_advances_cursor_past_winner() {
        let host = FakeHost::default().with_quota_on(&[0, 1]);
        let cursor = MemoryCursorStore::new(0);
        let controller = UploadController::new(host, pool_of(4), cursor);

        let video_id = controller
            .upload(Path::new("v.mp4"), &metadata())
            .await
            .unwrap();

        assert_eq!(video_id, "vid-2");
        assert_eq!(controller.host.uploads(), vec![0, 1, 2]);
        assert_eq!(controller.cursor.current(), 3);
    }

    #[tokio::test]
    async fn test_broken_auth_skips_upload_entirely() {
        let host = FakeHost::default().with_broken_auth_on(&[0]);
        let cursor = MemoryCursorStore::new(0);
        let controller = UploadController::new(host, pool_of(2), cursor);

        let video_id = controller
            .upload(Path::new("v.mp4"), &metadata())
            .await
            .unwrap();

        assert_eq!(video_id, "vid-1");
        // Account 0 never reached the upload stage.
        assert_eq!(controller.host.uploads(), vec![1]);
    }

    #[tokio::test]
    async fn test_out_of_range_cursor_wraps_into_pool() {
        let host = FakeHost::default();
        let cursor = MemoryCursorStore::new(7);
        let controller = UploadController::new(host, pool_of(3), cursor);

        let video_id = controller
            .upload(Path::new("v.mp4"), &metadata())
            .await
            .unwrap();

        // 7 % 3 == 1, so account 1 goes first.
        assert_eq!(video_id, "vid-1");
        assert_eq!(controller.cursor.current(), 2);
    }

    #[tokio::test]
    async fn test_empty_pool_is_a_configuration_error() {
        let host = FakeHost::default();
        let controller = UploadController::new(host, pool_of(0), MemoryCursorStore::new(0));

        let err = controller
            .upload(Path::new("v.mp4"), &metadata())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::NoAccountsConfigured));
    }
}
