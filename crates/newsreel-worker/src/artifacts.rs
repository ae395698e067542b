//! Per-job scratch files.
//!
//! Artifact names carry the article id plus a short random tag so a
//! crashed job's leftovers can never collide with a retry of the same
//! article. Cleanup is best-effort; a file that refuses to delete is
//! logged and left for the next tmpwatch pass.

use std::path::{Path, PathBuf};

use newsreel_models::ArticleId;
use tokio::fs;
use tracing::warn;
use uuid::Uuid;

use crate::error::WorkerResult;

/// Paths for one job's intermediate and final files.
#[derive(Debug, Clone)]
pub struct JobArtifacts {
    image: PathBuf,
    audio: PathBuf,
    video: PathBuf,
}

impl JobArtifacts {
    /// Allocate artifact paths under `work_dir`, creating it if needed.
    pub async fn create(work_dir: &Path, article_id: &ArticleId) -> WorkerResult<Self> {
        fs::create_dir_all(work_dir).await?;

        let tag = Uuid::new_v4().simple().to_string();
        let stem = format!("{}-{}", article_id, &tag[..8]);
        Ok(Self {
            image: work_dir.join(format!("{}.jpg", stem)),
            audio: work_dir.join(format!("{}.mp3", stem)),
            video: work_dir.join(format!("{}.mp4", stem)),
        })
    }

    pub fn image(&self) -> &Path {
        &self.image
    }

    pub fn audio(&self) -> &Path {
        &self.audio
    }

    pub fn video(&self) -> &Path {
        &self.video
    }

    /// Remove whatever was produced. Runs on every job exit path.
    pub async fn cleanup(&self) {
        for path in [&self.image, &self.audio, &self.video] {
            match fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove artifact"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn article() -> ArticleId {
        ArticleId::new("nota-42").unwrap()
    }

    #[tokio::test]
    async fn test_paths_are_namespaced_per_job() {
        let dir = TempDir::new().unwrap();

        let a = JobArtifacts::create(dir.path(), &article()).await.unwrap();
        let b = JobArtifacts::create(dir.path(), &article()).await.unwrap();

        assert_ne!(a.image(), b.image());
        assert!(a
            .video()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("nota-42-"));
    }

    #[tokio::test]
    async fn test_cleanup_removes_existing_and_tolerates_missing() {
        let dir = TempDir::new().unwrap();
        let artifacts = JobArtifacts::create(dir.path(), &article()).await.unwrap();

        // Only the image ever got produced.
        fs::write(artifacts.image(), b"jpeg").await.unwrap();

        artifacts.cleanup().await;
        assert!(!artifacts.image().exists());

        // No artifacts at all is also fine.
        artifacts.cleanup().await;
    }

    #[tokio::test]
    async fn test_create_makes_missing_work_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b");

        let artifacts = JobArtifacts::create(&nested, &article()).await.unwrap();
        assert!(nested.exists());
        assert_eq!(artifacts.audio().parent().unwrap(), nested);
    }
}
