//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Media error: {0}")]
    Media(#[from] newsreel_media::MediaError),

    #[error("Upload error: {0}")]
    Upload(#[from] newsreel_upload::UploadError),

    #[error("Store error: {0}")]
    Store(#[from] newsreel_store::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    /// Short stage label for callbacks and metrics.
    pub fn stage(&self) -> &'static str {
        match self {
            WorkerError::Media(newsreel_media::MediaError::DownloadFailed { .. }) => "download",
            WorkerError::Media(newsreel_media::MediaError::SynthesisFailed { .. }) => "synthesis",
            WorkerError::Media(newsreel_media::MediaError::TtsEngineNotFound(_)) => "synthesis",
            WorkerError::Media(newsreel_media::MediaError::RenderFailed { .. }) => "render",
            WorkerError::Media(newsreel_media::MediaError::FfmpegNotFound) => "render",
            WorkerError::Media(_) => "media",
            WorkerError::Upload(_) => "upload",
            WorkerError::Store(_) => "store",
            WorkerError::Io(_) => "io",
        }
    }
}
