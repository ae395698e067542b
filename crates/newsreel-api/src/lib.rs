//! Axum HTTP server for the Newsreel video service.
//!
//! One route does the work: a validated, authenticated job submission
//! that either admits a background video job or answers immediately
//! (busy, duplicate, invalid). The rest is the operational surface:
//! health, readiness and Prometheus metrics.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
