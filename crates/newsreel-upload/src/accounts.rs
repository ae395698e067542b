//! The fixed, ordered account pool.
//!
//! Accounts are discovered once at process start from credential file
//! pairs in the accounts directory: `client_secret_{i}.json` and
//! `token_{i}.json` for index `i`. The numeric index defines rotation
//! order and never changes at runtime; the only mutation is a token
//! refresh written back in place.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One upload account.
#[derive(Debug, Clone)]
pub struct AccountEntry {
    /// Stable index defining rotation order.
    pub index: usize,
    /// Display name for logs.
    pub name: String,
    /// OAuth client secret file.
    pub client_secret_path: PathBuf,
    /// Long-lived refresh token file, rewritten on refresh.
    pub token_path: PathBuf,
}

/// Ordered, fixed-size set of upload accounts.
#[derive(Debug, Clone)]
pub struct AccountPool {
    entries: Vec<AccountEntry>,
}

impl AccountPool {
    /// Discover accounts from `dir`, scanning indices `0..max_accounts`.
    ///
    /// An account exists when its client secret file does; a missing
    /// token file is tolerated here (the account will be skipped at
    /// authorization time until a token is provisioned).
    pub fn discover(dir: &Path, max_accounts: usize) -> Self {
        let mut entries = Vec::new();

        for index in 0..max_accounts {
            let client_secret_path = dir.join(format!("client_secret_{}.json", index));
            if !client_secret_path.is_file() {
                continue;
            }
            let token_path = dir.join(format!("token_{}.json", index));
            if !token_path.is_file() {
                warn!(index, "Account has no token file yet, it will be skipped");
            }
            entries.push(AccountEntry {
                index,
                name: format!("account-{}", index),
                client_secret_path,
                token_path,
            });
        }

        info!(count = entries.len(), dir = %dir.display(), "Discovered upload accounts");
        Self { entries }
    }

    /// Build a pool from explicit entries (tests, custom wiring).
    pub fn from_entries(entries: Vec<AccountEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at pool position `pos` (not account index).
    pub fn get(&self, pos: usize) -> Option<&AccountEntry> {
        self.entries.get(pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccountEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_skips_gaps() {
        let dir = TempDir::new().unwrap();
        for i in [0usize, 2, 3] {
            std::fs::write(dir.path().join(format!("client_secret_{}.json", i)), "{}").unwrap();
            std::fs::write(dir.path().join(format!("token_{}.json", i)), "{}").unwrap();
        }

        let pool = AccountPool::discover(dir.path(), 6);
        assert_eq!(pool.len(), 3);
        // Rotation order preserves the on-disk indices.
        let indices: Vec<_> = pool.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 2, 3]);
    }

    #[test]
    fn test_discover_empty_directory() {
        let dir = TempDir::new().unwrap();
        let pool = AccountPool::discover(dir.path(), 6);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_discover_tolerates_missing_token() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("client_secret_0.json"), "{}").unwrap();

        let pool = AccountPool::discover(dir.path(), 6);
        assert_eq!(pool.len(), 1);
    }
}
