//! Article identity and job request types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use validator::Validate;

/// Errors produced when validating an article identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArticleIdError {
    #[error("article id is empty")]
    Empty,
    #[error("article id exceeds {0} characters")]
    TooLong(usize),
    #[error("article id contains invalid characters")]
    InvalidCharacters,
}

/// Maximum accepted article id length.
///
/// The id becomes part of on-disk marker and artifact file names, so it
/// is restricted to a filesystem-safe alphabet.
const MAX_ARTICLE_ID_LEN: usize = 128;

/// Caller-supplied unique identifier for an article.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ArticleId(String);

impl ArticleId {
    /// Validate and wrap a raw article id.
    pub fn new(raw: impl Into<String>) -> Result<Self, ArticleIdError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ArticleIdError::Empty);
        }
        if raw.len() > MAX_ARTICLE_ID_LEN {
            return Err(ArticleIdError::TooLong(MAX_ARTICLE_ID_LEN));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ArticleIdError::InvalidCharacters);
        }
        Ok(Self(raw))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the background image for a job comes from.
///
/// Deployments either pass a remote URL straight from the article feed
/// or name a file in the configured anchor-image directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ImageSource {
    /// Remote image fetched through the download ladder.
    Remote(String),
    /// Local file, already resolved against the anchor-image directory.
    Local(PathBuf),
}

impl ImageSource {
    /// Resolve a raw image reference against the anchor-image directory.
    ///
    /// References starting with `http://` or `https://` are remote;
    /// anything else is treated as a file name inside `anchor_dir`.
    /// Returns `None` when the local file does not exist.
    pub fn resolve(image_ref: &str, anchor_dir: &Path) -> Option<Self> {
        if image_ref.starts_with("http://") || image_ref.starts_with("https://") {
            return Some(Self::Remote(image_ref.to_string()));
        }
        // Reject path traversal in local references.
        let name = Path::new(image_ref);
        if name.components().count() != 1 {
            return None;
        }
        let path = anchor_dir.join(name);
        if path.is_file() {
            Some(Self::Local(path))
        } else {
            None
        }
    }
}

/// A video-generation job request, immutable once accepted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct JobRequest {
    /// Caller-supplied unique article id.
    pub article_id: ArticleId,

    /// Narration text (full article body).
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub text: String,

    /// Display title, also used for the upload title.
    #[validate(length(min = 1, max = 500, message = "title must be 1-500 characters"))]
    pub title: String,

    /// Resolved background image source.
    pub image: ImageSource,

    /// Optional link back to the full article, appended to the
    /// upload description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_url: Option<String>,
}

impl JobRequest {
    /// Pick the text the narration should read.
    ///
    /// Falls back to the title when the article body is too short to
    /// make a sensible voiceover.
    pub fn narration_text(&self) -> &str {
        if self.text.trim().len() > 10 {
            &self.text
        } else {
            &self.title
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_id_validation() {
        assert!(ArticleId::new("abc123").is_ok());
        assert!(ArticleId::new("abc-123_x").is_ok());
        assert_eq!(ArticleId::new(""), Err(ArticleIdError::Empty));
        assert_eq!(
            ArticleId::new("has space"),
            Err(ArticleIdError::InvalidCharacters)
        );
        assert_eq!(
            ArticleId::new("has/slash"),
            Err(ArticleIdError::InvalidCharacters)
        );
        assert!(matches!(
            ArticleId::new("a".repeat(200)),
            Err(ArticleIdError::TooLong(_))
        ));
    }

    #[test]
    fn test_image_source_remote() {
        let src = ImageSource::resolve("https://example.com/img.jpg", Path::new("/nowhere"));
        assert_eq!(
            src,
            Some(ImageSource::Remote("https://example.com/img.jpg".into()))
        );
    }

    #[test]
    fn test_image_source_local_missing() {
        assert_eq!(ImageSource::resolve("missing.jpg", Path::new("/nowhere")), None);
    }

    #[test]
    fn test_image_source_rejects_traversal() {
        assert_eq!(
            ImageSource::resolve("../etc/passwd", Path::new("/anchors")),
            None
        );
    }

    #[test]
    fn test_narration_text_fallback() {
        let request = JobRequest {
            article_id: ArticleId::new("abc123").unwrap(),
            text: "short".to_string(),
            title: "Big Story".to_string(),
            image: ImageSource::Remote("https://example.com/img.jpg".into()),
            article_url: None,
        };
        assert_eq!(request.narration_text(), "Big Story");

        let request = JobRequest {
            text: "A much longer article body worth narrating.".to_string(),
            ..request
        };
        assert_eq!(
            request.narration_text(),
            "A much longer article body worth narrating."
        );
    }
}
