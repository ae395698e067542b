//! External-tool plumbing for the Newsreel pipeline.
//!
//! This crate wraps the three unreliable external operations the
//! pipeline depends on:
//! - image download via an ordered ladder of fetch strategies,
//! - narration synthesis via CLI TTS engines with a fallback voice,
//! - video compositing via a single FFmpeg invocation.
//!
//! All retry/fallback behavior goes through the shared [`retry`]
//! policy so each collaborator expresses the same "ordered fallback
//! list" shape.

pub mod download;
pub mod error;
pub mod render;
pub mod retry;
pub mod text;
pub mod tts;

pub use download::{FetchStrategy, ImageDownloader};
pub use error::{MediaError, MediaResult};
pub use render::{render_news_video, FfmpegCommand, RenderSettings};
pub use retry::{retry_async, RetryConfig, RetryResult};
pub use text::prepare_title_overlay;
pub use tts::{NarrationSynthesizer, TtsEngine, VoiceProfile};
