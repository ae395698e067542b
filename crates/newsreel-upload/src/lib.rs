//! YouTube upload with multi-account rotation.
//!
//! A fixed, ordered pool of accounts shares the upload load. The
//! failover controller starts at the persisted rotation cursor,
//! obtains a usable credential for the selected account, attempts the
//! upload, and moves to the next account on quota exhaustion or any
//! other account-specific failure. Each account is tried at most once
//! per job; exhausting the pool is a job-fatal error.

pub mod accounts;
pub mod auth;
pub mod error;
pub mod failover;
pub mod metadata;
pub mod youtube;

pub use accounts::{AccountEntry, AccountPool};
pub use auth::{AccessToken, TokenManager};
pub use error::{UploadError, UploadResult};
pub use failover::{UploadController, VideoHost};
pub use metadata::UploadMetadata;
pub use youtube::YoutubeClient;
