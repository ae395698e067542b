//! Job pipeline for narrated news videos.
//!
//! A job takes an article, fetches or resolves its image, synthesizes
//! a narration track, renders a composited video and publishes it,
//! then reports the result back to the originating service. One job
//! runs at a time per admission gate slot; duplicates are rejected by
//! the processed ledger before any work starts.

pub mod artifacts;
pub mod callback;
pub mod config;
pub mod error;
pub mod gate;
pub mod pipeline;

pub use artifacts::JobArtifacts;
pub use callback::StatusNotifier;
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use gate::{AdmissionGate, AdmissionPermit};
pub use pipeline::{
    ImageFetcher, JobOutcome, JobPipeline, Narrator, Publisher, Renderer, StatusSink,
};
