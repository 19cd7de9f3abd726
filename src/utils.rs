//! Text helpers shared by the feed parser and the page extractor.
//!
//! - Summary truncation for API output
//! - Whitespace collapsing and markup stripping for scraped text
//! - Log-friendly truncation of long strings

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

/// Maximum summary length, in characters, before the ellipsis.
pub const SUMMARY_MAX_CHARS: usize = 300;

const ELLIPSIS: &str = "...";

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Cut a summary to [`SUMMARY_MAX_CHARS`] characters, appending `...` when
/// anything was removed.
///
/// Counts characters rather than bytes, so Persian text is never split
/// inside a code point.
///
/// # Arguments
///
/// * `summary` - Plain-text summary taken from the feed
///
/// # Returns
///
/// The summary unchanged if it has at most [`SUMMARY_MAX_CHARS`] characters,
/// otherwise its first [`SUMMARY_MAX_CHARS`] characters followed by `...`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_summary("short"), "short");
/// assert_eq!(truncate_summary(&"a".repeat(301)).len(), 303);
/// ```
pub fn truncate_summary(summary: &str) -> String {
    match summary.char_indices().nth(SUMMARY_MAX_CHARS) {
        Some((cut, _)) => format!("{}{}", &summary[..cut], ELLIPSIS),
        None => summary.to_string(),
    }
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Reduce an HTML fragment to its visible text.
///
/// Tags are dropped and entities such as `&amp;` and `&nbsp;` are decoded,
/// whether or not the fragment contains any markup.
pub fn strip_html(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    let text = parsed.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with `"…(+N chars)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…(+{} chars)", &s[..cut], s[cut..].chars().count()),
        None => s.to_string(),
    }
}
