//! Application state.

use std::sync::Arc;

use newsreel_media::{ImageDownloader, NarrationSynthesizer, RenderSettings, VoiceProfile};
use newsreel_store::{FsCursorStore, FsLedger, ProcessedLedger};
use newsreel_upload::{AccountPool, UploadController, YoutubeClient};
use newsreel_worker::pipeline::{
    FfmpegRenderer, MediaImageFetcher, RotatingPublisher, TtsNarrator,
};
use newsreel_worker::{AdmissionGate, JobPipeline, StatusNotifier, WorkerConfig};
use tracing::info;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub worker_config: WorkerConfig,
    pub gate: AdmissionGate,
    pub pipeline: Arc<JobPipeline>,
    pub ledger: Arc<dyn ProcessedLedger>,
    /// Configured upload accounts, surfaced by the readiness probe.
    pub account_count: usize,
}

impl AppState {
    /// Wire the real pipeline from configuration.
    pub fn new(
        config: ApiConfig,
        worker_config: WorkerConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let http = reqwest::Client::new();

        let fetcher = MediaImageFetcher::new(ImageDownloader::new(
            worker_config.download_timeout,
        )?);
        let narrator = TtsNarrator::new(NarrationSynthesizer::new(
            VoiceProfile::default_primary(),
            VoiceProfile::default_fallback(),
        ));
        let renderer = FfmpegRenderer::new(RenderSettings::default());

        let pool = AccountPool::discover(&worker_config.accounts_dir, worker_config.max_accounts);
        let account_count = pool.len();
        info!(accounts = account_count, "discovered upload accounts");

        let cursor = FsCursorStore::new(worker_config.state_dir.join("upload_cursor"));
        let publisher = RotatingPublisher::new(UploadController::new(
            YoutubeClient::new(http.clone()),
            pool,
            cursor,
        ));

        let notifier = StatusNotifier::new(
            http,
            worker_config.callback_base_url.clone(),
            worker_config.callback_api_key.clone(),
            worker_config.callback_timeout,
        );

        let ledger: Arc<dyn ProcessedLedger> =
            Arc::new(FsLedger::new(worker_config.state_dir.join("processed")));

        let pipeline = Arc::new(JobPipeline::new(
            Arc::new(fetcher),
            Arc::new(narrator),
            Arc::new(renderer),
            Arc::new(publisher),
            Arc::new(notifier),
            Arc::clone(&ledger),
            worker_config.work_dir.clone(),
        ));

        Ok(Self {
            gate: AdmissionGate::new(worker_config.gate_capacity),
            config,
            worker_config,
            pipeline,
            ledger,
            account_count,
        })
    }
}
