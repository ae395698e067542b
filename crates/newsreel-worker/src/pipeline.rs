//! The job pipeline: fetch, narrate, render, publish, notify.
//!
//! Collaborators sit behind traits so the sequencing logic is testable
//! without ffmpeg, TTS engines or a network. The pipeline owns the
//! invariants: the duplicate check runs before any work, the admission
//! permit is held until the job reaches a terminal state, scratch
//! files are removed on every exit path, and the ledger is only marked
//! after a successful upload.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use newsreel_media::{render_news_video, ImageDownloader, NarrationSynthesizer, RenderSettings};
use newsreel_models::{ArticleId, ImageSource, JobRequest};
use newsreel_store::{CursorStore, ProcessedLedger};
use newsreel_upload::{UploadController, UploadMetadata, VideoHost};
use tracing::{error, info, warn};

use crate::artifacts::JobArtifacts;
use crate::callback::StatusNotifier;
use crate::error::{WorkerError, WorkerResult};
use crate::gate::AdmissionPermit;

/// Produces the background image for a job.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, source: &ImageSource, dest: &Path) -> WorkerResult<()>;
}

/// Produces the narration audio track.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, text: &str, dest: &Path) -> WorkerResult<()>;
}

/// Composites image, title and narration into the final video.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(
        &self,
        image: &Path,
        audio: &Path,
        title: &str,
        dest: &Path,
    ) -> WorkerResult<()>;
}

/// Pushes the finished video to the hosting platform.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Returns the remote video id.
    async fn publish(&self, video: &Path, request: &JobRequest) -> WorkerResult<String>;
}

/// Receives terminal job notifications.
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn video_complete(&self, article_id: &ArticleId, video_id: &str);
    async fn video_failed(&self, article_id: &ArticleId, error: &str);
}

#[async_trait]
impl StatusSink for StatusNotifier {
    async fn video_complete(&self, article_id: &ArticleId, video_id: &str) {
        StatusNotifier::video_complete(self, article_id, video_id).await;
    }

    async fn video_failed(&self, article_id: &ArticleId, error: &str) {
        StatusNotifier::video_failed(self, article_id, error).await;
    }
}

/// Terminal state of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed { video_id: String },
    AlreadyProcessed,
    Failed { error: String },
}

/// Sequences one article through the full pipeline.
pub struct JobPipeline {
    fetcher: Arc<dyn ImageFetcher>,
    narrator: Arc<dyn Narrator>,
    renderer: Arc<dyn Renderer>,
    publisher: Arc<dyn Publisher>,
    status: Arc<dyn StatusSink>,
    ledger: Arc<dyn ProcessedLedger>,
    work_dir: PathBuf,
}

impl JobPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fetcher: Arc<dyn ImageFetcher>,
        narrator: Arc<dyn Narrator>,
        renderer: Arc<dyn Renderer>,
        publisher: Arc<dyn Publisher>,
        status: Arc<dyn StatusSink>,
        ledger: Arc<dyn ProcessedLedger>,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            fetcher,
            narrator,
            renderer,
            publisher,
            status,
            ledger,
            work_dir,
        }
    }

    /// Run one job to a terminal state. The admission permit is held
    /// for the whole call and released when it returns.
    pub async fn run(&self, permit: AdmissionPermit, request: JobRequest) -> JobOutcome {
        // Held until every exit path below has finished.
        let _permit = permit;
        let article_id = request.article_id.clone();

        match self.ledger.is_processed(&article_id).await {
            Ok(true) => {
                info!(article = %article_id, "article already processed, skipping");
                counter!("newsreel_jobs_duplicate_total").increment(1);
                return JobOutcome::AlreadyProcessed;
            }
            Ok(false) => {}
            Err(e) => {
                return self.fail(&article_id, None, WorkerError::from(e)).await;
            }
        }

        let artifacts = match JobArtifacts::create(&self.work_dir, &article_id).await {
            Ok(artifacts) => artifacts,
            Err(e) => return self.fail(&article_id, None, e).await,
        };

        match self.execute(&request, &artifacts).await {
            Ok(video_id) => {
                info!(article = %article_id, %video_id, "job completed");
                counter!("newsreel_jobs_completed_total").increment(1);
                self.status.video_complete(&article_id, &video_id).await;
                artifacts.cleanup().await;
                JobOutcome::Completed { video_id }
            }
            Err(e) => self.fail(&article_id, Some(&artifacts), e).await,
        }
    }

    async fn execute(
        &self,
        request: &JobRequest,
        artifacts: &JobArtifacts,
    ) -> WorkerResult<String> {
        self.fetcher.fetch(&request.image, artifacts.image()).await?;
        self.narrator
            .narrate(request.narration_text(), artifacts.audio())
            .await?;
        self.renderer
            .render(
                artifacts.image(),
                artifacts.audio(),
                &request.title,
                artifacts.video(),
            )
            .await?;
        let video_id = self.publisher.publish(artifacts.video(), request).await?;

        // Marked only once the upload is confirmed.
        if let Err(e) = self
            .ledger
            .mark_processed(&request.article_id, &video_id)
            .await
        {
            warn!(article = %request.article_id, error = %e, "failed to write processed marker");
        }
        Ok(video_id)
    }

    async fn fail(
        &self,
        article_id: &ArticleId,
        artifacts: Option<&JobArtifacts>,
        e: WorkerError,
    ) -> JobOutcome {
        let stage = e.stage();
        error!(article = %article_id, stage, error = %e, "job failed");
        counter!("newsreel_jobs_failed_total", "stage" => stage).increment(1);

        let message = e.to_string();
        self.status.video_failed(article_id, &message).await;
        if let Some(artifacts) = artifacts {
            artifacts.cleanup().await;
        }
        JobOutcome::Failed { error: message }
    }
}

/// [`ImageFetcher`] backed by the download ladder, with local anchor
/// images copied into the job's scratch space.
pub struct MediaImageFetcher {
    downloader: ImageDownloader,
}

impl MediaImageFetcher {
    pub fn new(downloader: ImageDownloader) -> Self {
        Self { downloader }
    }
}

#[async_trait]
impl ImageFetcher for MediaImageFetcher {
    async fn fetch(&self, source: &ImageSource, dest: &Path) -> WorkerResult<()> {
        match source {
            ImageSource::Remote(url) => Ok(self.downloader.fetch(url, dest).await?),
            ImageSource::Local(path) => {
                tokio::fs::copy(path, dest).await?;
                Ok(())
            }
        }
    }
}

/// [`Narrator`] backed by the CLI TTS ladder.
pub struct TtsNarrator {
    synthesizer: NarrationSynthesizer,
}

impl TtsNarrator {
    pub fn new(synthesizer: NarrationSynthesizer) -> Self {
        Self { synthesizer }
    }
}

#[async_trait]
impl Narrator for TtsNarrator {
    async fn narrate(&self, text: &str, dest: &Path) -> WorkerResult<()> {
        Ok(self.synthesizer.synthesize(text, dest).await?)
    }
}

/// [`Renderer`] backed by a single FFmpeg invocation.
pub struct FfmpegRenderer {
    settings: RenderSettings,
}

impl FfmpegRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Renderer for FfmpegRenderer {
    async fn render(
        &self,
        image: &Path,
        audio: &Path,
        title: &str,
        dest: &Path,
    ) -> WorkerResult<()> {
        Ok(render_news_video(image, audio, title, dest, &self.settings).await?)
    }
}

/// [`Publisher`] backed by the rotating multi-account controller.
pub struct RotatingPublisher<H, C> {
    controller: UploadController<H, C>,
}

impl<H: VideoHost, C: CursorStore> RotatingPublisher<H, C> {
    pub fn new(controller: UploadController<H, C>) -> Self {
        Self { controller }
    }
}

#[async_trait]
impl<H: VideoHost, C: CursorStore> Publisher for RotatingPublisher<H, C> {
    async fn publish(&self, video: &Path, request: &JobRequest) -> WorkerResult<String> {
        let metadata = UploadMetadata::for_article(
            &request.title,
            &request.text,
            request.article_url.as_deref(),
        );
        Ok(self.controller.upload(video, &metadata).await?)
    }
}
