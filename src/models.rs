//! Data models for feed entries, enriched articles, and API responses.
//!
//! - [`RawEntry`]: one item parsed out of an RSS or Atom feed
//! - [`PageMetadata`]: what article-page extraction produced
//! - [`ArticleRecord`]: the unit returned by `/news`
//! - [`NewsDigest`]: the `/news` response body

use crate::config::Source;
use crate::utils::truncate_summary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single feed item before filtering and enrichment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub summary: Option<String>,
    /// Link to the full article page.
    pub link: String,
    /// The feed's published value, verbatim.
    pub published_raw: Option<String>,
}

impl RawEntry {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn summary(&self) -> &str {
        self.summary.as_deref().unwrap_or_default()
    }
}

/// Best-effort metadata extracted from an article page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub authors: Vec<String>,
    /// Publish date already rendered as a string.
    pub published: Option<String>,
}

/// A matched article as served by the API.
///
/// Records are built once per matching entry and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleRecord {
    pub title: String,
    /// Feed summary, cut to 300 characters plus `...` when longer.
    pub summary: String,
    pub url: String,
    /// Name of the source the entry came from.
    pub source: String,
    pub region: String,
    /// Extracted date, else the feed's published value, else empty.
    pub publish_date: String,
    pub authors: Vec<String>,
}

impl ArticleRecord {
    /// Build a record from feed-supplied fields only.
    ///
    /// This is the degraded form used when the article page can't be
    /// fetched.
    pub fn from_feed(entry: &RawEntry, source: &Source) -> Self {
        Self {
            title: entry.title().to_string(),
            summary: truncate_summary(entry.summary()),
            url: entry.link.clone(),
            source: source.name.clone(),
            region: source.region.clone(),
            publish_date: entry.published_raw.clone().unwrap_or_default(),
            authors: Vec::new(),
        }
    }

    /// Overlay extracted page metadata, keeping feed values where the page
    /// yielded nothing.
    pub fn with_page(mut self, page: PageMetadata) -> Self {
        if let Some(title) = page.title.filter(|t| !t.is_empty()) {
            self.title = title;
        }
        if let Some(published) = page.published.filter(|p| !p.is_empty()) {
            self.publish_date = published;
        }
        self.authors = page.authors;
        self
    }
}

/// Response body for `/news`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewsDigest {
    pub count: usize,
    pub articles: Vec<ArticleRecord>,
    pub fetched_at: DateTime<Utc>,
}

/// Response body for `/`.
#[derive(Debug, Deserialize, Serialize)]
pub struct ApiInfo {
    pub name: String,
    pub version: String,
    pub endpoints: BTreeMap<String, String>,
}

/// Response body for `/health`.
#[derive(Debug, Deserialize, Serialize)]
pub struct Health {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Public view of a source; the feed URL is not exposed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceSummary {
    pub name: String,
    pub region: String,
}

/// Response body for `/sources`.
#[derive(Debug, Deserialize, Serialize)]
pub struct SourceListing {
    pub sources: Vec<SourceSummary>,
    pub keywords: Vec<String>,
}
