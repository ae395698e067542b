//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while producing the video artifacts.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("curl not found in PATH")]
    CurlNotFound,

    #[error("TTS engine '{0}' not found in PATH")]
    TtsEngineNotFound(String),

    #[error("Download failed: {message}")]
    DownloadFailed { message: String },

    #[error("Speech synthesis failed: {message}")]
    SynthesisFailed { message: String },

    #[error("Render failed: {message}")]
    RenderFailed {
        message: String,
        exit_code: Option<i32>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl MediaError {
    /// Create a download failure error.
    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            message: message.into(),
        }
    }

    /// Create a synthesis failure error.
    pub fn synthesis_failed(message: impl Into<String>) -> Self {
        Self::SynthesisFailed {
            message: message.into(),
        }
    }

    /// Create a render failure error.
    pub fn render_failed(message: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::RenderFailed {
            message: message.into(),
            exit_code,
        }
    }
}
