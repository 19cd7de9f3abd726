//! Keyword matching for feed entries.
//!
//! Matching is a plain case-insensitive substring test. There is no
//! tokenization, so `"dam"` also matches `"Amsterdam"`. Persian keywords
//! work the same way, since lowercasing leaves them unchanged.

/// Returns `true` if any keyword occurs in `text`, ignoring case.
///
/// Empty text never matches.
pub fn matches<S: AsRef<str>>(text: &str, keywords: &[S]) -> bool {
    if text.is_empty() {
        return false;
    }
    let text_lower = text.to_lowercase();
    keywords
        .iter()
        .any(|keyword| text_lower.contains(&keyword.as_ref().to_lowercase()))
}
