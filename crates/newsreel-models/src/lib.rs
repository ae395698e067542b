//! Shared data models for the Newsreel backend.
//!
//! This crate defines the job request accepted at the HTTP boundary,
//! article identity, image source resolution, and the callback payloads
//! sent back to the main API after a job terminates.

pub mod article;
pub mod callback;

pub use article::{ArticleId, ArticleIdError, ImageSource, JobRequest};
pub use callback::{VideoCompletePayload, VideoFailedPayload};
