//! Upload metadata with hard length limits.
//!
//! YouTube rejects the whole upload call when the title exceeds 100
//! characters or the description exceeds 5000, so truncation here is a
//! contract, not cosmetics. Truncated fields end with an ellipsis
//! marker; the fixed channel suffix on the title survives truncation.

/// Remote title limit, including our fixed suffix.
const TITLE_LIMIT: usize = 100;

/// Remote description limit.
const DESCRIPTION_LIMIT: usize = 5000;

/// Article body budget inside the description, leaving room for the
/// title block, URL line and hashtags.
const BODY_BUDGET: usize = 4000;

/// Fixed suffix appended to every upload title.
const TITLE_SUFFIX: &str = " | Newsreel";

const ELLIPSIS: char = '…';

const HASHTAG_LINE: &str = "#noticias #actualidad #ultimahora";

const SEPARATOR: &str = "------------------------------------------------";

/// YouTube category 25, News & Politics.
const NEWS_CATEGORY_ID: &str = "25";

/// Assembled, limit-respecting upload metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: String,
}

impl UploadMetadata {
    /// Build metadata for a news article upload.
    pub fn for_article(title: &str, body: &str, article_url: Option<&str>) -> Self {
        let mut description = format!("{}\n\n{}\n", title, SEPARATOR);
        description.push_str(&truncate_chars(body, BODY_BUDGET));
        description.push_str("\n\n");
        if let Some(url) = article_url {
            description.push_str(&format!("Nota completa: {}\n\n", url));
        }
        description.push_str(SEPARATOR);
        description.push('\n');
        description.push_str(HASHTAG_LINE);

        Self {
            title: build_title(title),
            description: truncate_chars(&description, DESCRIPTION_LIMIT),
            tags: vec![
                "noticias".to_string(),
                "actualidad".to_string(),
                "ultimahora".to_string(),
            ],
            category_id: NEWS_CATEGORY_ID.to_string(),
        }
    }
}

/// Append the channel suffix, truncating the title portion so the
/// whole thing fits the remote limit.
fn build_title(title: &str) -> String {
    let budget = TITLE_LIMIT - TITLE_SUFFIX.chars().count();
    format!("{}{}", truncate_chars(title, budget), TITLE_SUFFIX)
}

/// Truncate to at most `limit` characters, replacing the tail with an
/// ellipsis when anything was cut. Operates on characters, never
/// splitting a multi-byte sequence.
fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let kept: String = text.chars().take(limit.saturating_sub(1)).collect();
    format!("{}{}", kept.trim_end(), ELLIPSIS)
}
