//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Concurrent job slots. One slot means strict single-flight.
    pub gate_capacity: usize,
    /// Scratch directory for per-job artifacts
    pub work_dir: PathBuf,
    /// Directory of bundled anchor images resolvable by filename
    pub anchor_images_dir: PathBuf,
    /// Directory holding processed markers and the rotation cursor
    pub state_dir: PathBuf,
    /// Directory scanned for upload account credential pairs
    pub accounts_dir: PathBuf,
    /// Upper bound on discovered upload accounts
    pub max_accounts: usize,
    /// Image download timeout per attempt
    pub download_timeout: Duration,
    /// Completion/failure callback timeout
    pub callback_timeout: Duration,
    /// Base URL of the service receiving callbacks, if any
    pub callback_base_url: Option<String>,
    /// Shared secret sent on callbacks
    pub callback_api_key: Option<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            gate_capacity: 1,
            work_dir: PathBuf::from("/tmp/newsreel"),
            anchor_images_dir: PathBuf::from("./anchor_images"),
            state_dir: PathBuf::from("./state"),
            accounts_dir: PathBuf::from("."),
            max_accounts: 10,
            download_timeout: Duration::from_secs(15),
            callback_timeout: Duration::from_secs(10),
            callback_base_url: None,
            callback_api_key: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            gate_capacity: std::env::var("WORKER_GATE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(1),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/newsreel")),
            anchor_images_dir: std::env::var("ANCHOR_IMAGES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./anchor_images")),
            state_dir: std::env::var("WORKER_STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./state")),
            accounts_dir: std::env::var("UPLOAD_ACCOUNTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            max_accounts: std::env::var("UPLOAD_MAX_ACCOUNTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            download_timeout: Duration::from_secs(
                std::env::var("DOWNLOAD_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(15),
            ),
            callback_timeout: Duration::from_secs(
                std::env::var("CALLBACK_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            callback_base_url: std::env::var("CALLBACK_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .map(|s| s.trim_end_matches('/').to_string()),
            callback_api_key: std::env::var("CALLBACK_API_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
        }
    }
}
