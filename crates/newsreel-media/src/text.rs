//! On-screen title preparation.
//!
//! FFmpeg's drawtext filter chokes on quotes, colons and backslashes,
//! and a lower-third only has room for a few short lines. This module
//! turns a raw article title into a sanitized, wrapped overlay string.

/// Maximum characters per overlay line. Leaves room for the presenter
/// on the right side of the frame.
const WRAP_WIDTH: usize = 45;

/// Maximum overlay lines before the title is cut with an ellipsis.
const MAX_LINES: usize = 3;

/// Sanitize and wrap a title for the lower-third overlay.
pub fn prepare_title_overlay(title: &str) -> String {
    let cleaned = sanitize(title);
    let lines = wrap(&cleaned, WRAP_WIDTH);

    if lines.len() > MAX_LINES {
        let mut text = lines[..MAX_LINES].join("\n");
        text.push_str("...");
        text
    } else {
        lines.join("\n")
    }
}

/// Drop characters drawtext cannot safely render.
///
/// Keeps letters (including accented ones), digits, whitespace, and
/// basic punctuation. Quotes and colons are removed outright since
/// they terminate drawtext arguments.
fn sanitize(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || ".,!?-".contains(*c))
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Greedy word wrap at `width` columns. Words longer than the width
/// get their own line rather than being split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
