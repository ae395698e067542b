//! Upload error types.

use thiserror::Error;

pub type UploadResult<T> = Result<T, UploadError>;

#[derive(Debug, Error)]
pub enum UploadError {
    /// The remote service refused the upload for quota/rate reasons.
    /// Retryable by rotating to the next account.
    #[error("Quota exceeded on account '{account}'")]
    QuotaExceeded { account: String },

    /// The account's stored credential is absent or unrefreshable.
    /// The account is skipped without an upload attempt.
    #[error("Credential unusable for account '{account}': {reason}")]
    AuthUnavailable { account: String, reason: String },

    /// Any other upload failure, treated as account-specific.
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// Every configured account was tried once without success.
    #[error("All {attempted} accounts exhausted without a successful upload")]
    AllAccountsExhausted { attempted: usize },

    #[error("No upload accounts configured")]
    NoAccountsConfigured,

    #[error("Store error: {0}")]
    Store(#[from] newsreel_store::StoreError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }

    pub fn auth_unavailable(account: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AuthUnavailable {
            account: account.into(),
            reason: reason.into(),
        }
    }
}
