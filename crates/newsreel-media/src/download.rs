//! Robust image download.
//!
//! Image hosts frequently block naive fetches, so the downloader walks
//! an ordered ladder of strategies: a plain HTTP GET, a GET disguised
//! with browser headers and a spoofed referrer to defeat hotlink
//! protection, and finally the system `curl` binary. Each strategy is
//! retried a fixed number of times with a short delay before falling
//! through to the next one.
//!
//! A fetch only counts as successful when the destination file exists,
//! exceeds a minimum byte size, and does not look like an HTML/JSON
//! error page served with a 200 status.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{MediaError, MediaResult};
use crate::retry::{retry_async, RetryConfig};

/// Minimum image file size in bytes. Anything smaller is a tracking
/// pixel or an error stub, not a usable background.
const DEFAULT_MIN_IMAGE_BYTES: u64 = 512;

/// How many leading bytes to inspect for the error-page heuristic.
const SNIFF_BYTES: usize = 64;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// One rung of the download ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Plain GET with reqwest's default headers.
    Direct,
    /// GET with a browser user-agent, image Accept header, and the
    /// URL's own origin as referrer (defeats hotlink protection).
    BrowserHeaders,
    /// System `curl -L -k` as a last resort.
    Curl,
}

impl FetchStrategy {
    fn name(&self) -> &'static str {
        match self {
            FetchStrategy::Direct => "direct",
            FetchStrategy::BrowserHeaders => "browser_headers",
            FetchStrategy::Curl => "curl",
        }
    }
}

/// Downloads images across the strategy ladder.
pub struct ImageDownloader {
    client: reqwest::Client,
    strategies: Vec<FetchStrategy>,
    retry: RetryConfig,
    min_bytes: u64,
}

impl ImageDownloader {
    /// Create a downloader with the full default ladder.
    ///
    /// Certificate validation is disabled: news-image CDNs routinely
    /// serve mismatched or expired certificates and the payload is a
    /// public image, not a secret.
    pub fn new(timeout: Duration) -> MediaResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self {
            client,
            strategies: vec![
                FetchStrategy::Direct,
                FetchStrategy::BrowserHeaders,
                FetchStrategy::Curl,
            ],
            retry: RetryConfig::new("image_fetch")
                .with_max_retries(2)
                .with_base_delay(Duration::from_secs(1))
                .with_fixed_delay(),
            min_bytes: DEFAULT_MIN_IMAGE_BYTES,
        })
    }

    /// Override the strategy ladder.
    pub fn with_strategies(mut self, strategies: Vec<FetchStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Override the per-strategy retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Override the minimum accepted file size.
    pub fn with_min_bytes(mut self, min_bytes: u64) -> Self {
        self.min_bytes = min_bytes;
        self
    }

    /// Fetch `url` into `dest`, walking the strategy ladder.
    pub async fn fetch(&self, url: &str, dest: &Path) -> MediaResult<()> {
        info!(url, dest = %dest.display(), "Downloading image");

        let mut last_error = String::from("no strategies configured");

        for strategy in &self.strategies {
            let result = retry_async(&self.retry, || self.attempt(*strategy, url, dest)).await;

            match result.into_result() {
                Ok(()) => {
                    let size = fs::metadata(dest).await?.len();
                    info!(
                        url,
                        strategy = strategy.name(),
                        size_bytes = size,
                        "Image downloaded"
                    );
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        url,
                        strategy = strategy.name(),
                        error = %e,
                        "Download strategy exhausted, falling through"
                    );
                    last_error = format!("{}: {}", strategy.name(), e);
                    // Leave no partial file behind for the next strategy
                    // to mistake for a success.
                    let _ = fs::remove_file(dest).await;
                }
            }
        }

        Err(MediaError::download_failed(format!(
            "all strategies exhausted, last error: {}",
            last_error
        )))
    }

    /// One attempt with one strategy, including artifact validation.
    async fn attempt(&self, strategy: FetchStrategy, url: &str, dest: &Path) -> MediaResult<()> {
        match strategy {
            FetchStrategy::Direct => self.fetch_http(url, dest, false).await?,
            FetchStrategy::BrowserHeaders => self.fetch_http(url, dest, true).await?,
            FetchStrategy::Curl => fetch_via_curl(url, dest).await?,
        }
        self.validate(dest).await
    }

    async fn fetch_http(&self, url: &str, dest: &Path, spoof: bool) -> MediaResult<()> {
        let mut request = self.client.get(url);

        if spoof {
            request = request
                .header("User-Agent", BROWSER_USER_AGENT)
                .header("Accept", "image/avif,image/webp,image/*,*/*;q=0.8");
            if let Some(referrer) = origin_of(url) {
                request = request.header("Referer", referrer);
            }
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(MediaError::download_failed(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        fs::write(dest, &bytes).await?;
        Ok(())
    }

    /// Validate the downloaded artifact: present, big enough, and not
    /// an error page masquerading as an image.
    async fn validate(&self, dest: &Path) -> MediaResult<()> {
        let metadata = fs::metadata(dest)
            .await
            .map_err(|_| MediaError::download_failed("destination file not created"))?;

        if metadata.len() < self.min_bytes {
            return Err(MediaError::download_failed(format!(
                "file too small: {} bytes (minimum {})",
                metadata.len(),
                self.min_bytes
            )));
        }

        let contents = fs::read(dest).await?;
        let head = &contents[..contents.len().min(SNIFF_BYTES)];
        if looks_like_error_page(head) {
            return Err(MediaError::download_failed(
                "response body looks like markup/JSON, not an image",
            ));
        }

        Ok(())
    }
}

/// Heuristic: an "image" whose first non-whitespace byte opens markup
/// or JSON is an error page served with a 200 status.
fn looks_like_error_page(head: &[u8]) -> bool {
    match head.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'<') | Some(b'{') | Some(b'[') => true,
        _ => false,
    }
}

/// Scheme + host (+ non-default port) of a URL, used as a spoofed
/// referrer. Hotlink checks compare the full origin, so a dropped
/// port would defeat the spoof.
fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    match parsed.port() {
        Some(port) => Some(format!("{}://{}:{}/", parsed.scheme(), host, port)),
        None => Some(format!("{}://{}/", parsed.scheme(), host)),
    }
}

/// Fetch via the system curl binary.
async fn fetch_via_curl(url: &str, dest: &Path) -> MediaResult<()> {
    which::which("curl").map_err(|_| MediaError::CurlNotFound)?;

    let output = Command::new("curl")
        .args([
            "-L",
            "-k",
            "--fail",
            "--silent",
            "--show-error",
            "--user-agent",
            BROWSER_USER_AGENT,
            "--retry",
            "2",
            "-o",
        ])
        .arg(dest)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("curl stderr: {}", stderr);
        return Err(MediaError::download_failed(format!(
            "curl exited with {}: {}",
            output.status,
            stderr.lines().last().unwrap_or("unknown error")
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_downloader() -> ImageDownloader {
        ImageDownloader::new(Duration::from_secs(5))
            .unwrap()
            .with_retry(
                RetryConfig::new("test_fetch")
                    .with_max_retries(0)
                    .with_base_delay(Duration::from_millis(1)),
            )
            .with_min_bytes(16)
    }

    fn fake_jpeg() -> Vec<u8> {
        let mut body = vec![0xFF, 0xD8, 0xFF, 0xE0];
        body.extend(std::iter::repeat(0xAB).take(128));
        body
    }

    #[test]
    fn test_error_page_heuristic() {
        assert!(looks_like_error_page(b"<html><body>404"));
        assert!(looks_like_error_page(b"  \n\t{\"error\": true}"));
        assert!(looks_like_error_page(b"[{\"oops\":1}]"));
        assert!(!looks_like_error_page(&[0xFF, 0xD8, 0xFF]));
        assert!(!looks_like_error_page(b""));
    }

    #[test]
    fn test_origin_of() {
        assert_eq!(
            origin_of("https://cdn.example.com/a/b.jpg?x=1"),
            Some("https://cdn.example.com/".to_string())
        );
        // Non-default ports are part of the origin.
        assert_eq!(
            origin_of("http://127.0.0.1:8123/img.jpg"),
            Some("http://127.0.0.1:8123/".to_string())
        );
        // Default ports are elided.
        assert_eq!(
            origin_of("https://cdn.example.com:443/b.jpg"),
            Some("https://cdn.example.com/".to_string())
        );
        assert_eq!(origin_of("not a url"), None);
    }

    #[tokio::test]
    async fn test_direct_fetch_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(fake_jpeg()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("img.jpg");

        let downloader = fast_downloader().with_strategies(vec![FetchStrategy::Direct]);
        downloader
            .fetch(&format!("{}/img.jpg", server.uri()), &dest)
            .await
            .unwrap();

        assert!(dest.exists());
        assert_eq!(std::fs::read(&dest).unwrap(), fake_jpeg());
    }

    #[tokio::test]
    async fn test_hotlink_protection_falls_through_to_browser_headers() {
        let server = MockServer::start().await;
        // With a referrer the host serves the image.
        Mock::given(method("GET"))
            .and(path("/img.jpg"))
            .and(header("Referer", format!("{}/", server.uri()).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(fake_jpeg()))
            .mount(&server)
            .await;
        // Without one it refuses.
        Mock::given(method("GET"))
            .and(path("/img.jpg"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("img.jpg");

        let downloader = fast_downloader()
            .with_strategies(vec![FetchStrategy::Direct, FetchStrategy::BrowserHeaders]);
        downloader
            .fetch(&format!("{}/img.jpg", server.uri()), &dest)
            .await
            .unwrap();

        assert!(dest.exists());
    }

    #[tokio::test]
    async fn test_error_page_body_is_rejected() {
        let server = MockServer::start().await;
        let body = format!("<html>{}</html>", "x".repeat(64));
        Mock::given(method("GET"))
            .and(path("/img.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("img.jpg");

        let downloader = fast_downloader().with_strategies(vec![FetchStrategy::Direct]);
        let err = downloader
            .fetch(&format!("{}/img.jpg", server.uri()), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::DownloadFailed { .. }));
        assert!(!dest.exists(), "failed fetch must not leave a partial file");
    }

    #[tokio::test]
    async fn test_undersized_body_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8]))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("img.jpg");

        let downloader = fast_downloader().with_strategies(vec![FetchStrategy::Direct]);
        let err = downloader
            .fetch(&format!("{}/img.jpg", server.uri()), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::DownloadFailed { .. }));
    }

    #[tokio::test]
    async fn test_all_strategies_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("img.jpg");

        let downloader = fast_downloader()
            .with_strategies(vec![FetchStrategy::Direct, FetchStrategy::BrowserHeaders]);
        let err = downloader
            .fetch(&format!("{}/img.jpg", server.uri()), &dest)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("all strategies exhausted"));
    }
}
