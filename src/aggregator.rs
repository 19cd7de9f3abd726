//! News aggregation across the configured sources.
//!
//! For each selected source the aggregator fetches the feed, keeps entries
//! whose title or summary matches a keyword, enriches at most `limit` of
//! them, and finally merges everything into one list.
//!
//! # Ordering and Cap
//!
//! The merged list is sorted by `publish_date` as a plain string,
//! descending. Feeds mix date formats, so this is not a chronological
//! order; records without a date end up last. The list is then cut to
//! `limit × configured sources`, regardless of how many sources the
//! filters selected.

use crate::config::{Catalog, Source};
use crate::enrich::enrich;
use crate::keywords::matches;
use crate::models::{ArticleRecord, NewsDigest, RawEntry};
use crate::scrapers::{FeedReader, PageExtractor};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Per-source limit used when the caller gives none.
pub const DEFAULT_LIMIT: i64 = 10;

/// Parameters of a single `/news` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    /// Maximum matched articles per source. Not clamped; zero or negative
    /// selects nothing.
    pub limit: i64,
    /// Only sources whose region equals this, ignoring case.
    pub region: Option<String>,
    /// Only sources whose name equals this, ignoring case.
    pub source: Option<String>,
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            region: None,
            source: None,
        }
    }
}

fn same_label(filter: Option<&str>, value: &str) -> bool {
    match filter.filter(|f| !f.is_empty()) {
        Some(filter) => filter.to_lowercase() == value.to_lowercase(),
        None => true,
    }
}

impl NewsQuery {
    fn selects(&self, source: &Source) -> bool {
        same_label(self.region.as_deref(), &source.region)
            && same_label(self.source.as_deref(), &source.name)
    }
}

/// Runs the fetch, filter, enrich, and merge pipeline.
pub struct Aggregator<R, X> {
    catalog: Arc<Catalog>,
    reader: R,
    extractor: X,
}

impl<R, X> Aggregator<R, X>
where
    R: FeedReader,
    X: PageExtractor,
{
    pub fn new(catalog: Arc<Catalog>, reader: R, extractor: X) -> Self {
        Self {
            catalog,
            reader,
            extractor,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Collect, sort and cap matching articles from every selected source.
    #[instrument(level = "info", skip(self), fields(limit = query.limit))]
    pub async fn get_news(&self, query: &NewsQuery) -> NewsDigest {
        let per_source = usize::try_from(query.limit).unwrap_or(0);
        let selected: Vec<&Source> = self
            .catalog
            .sources
            .iter()
            .filter(|source| query.selects(source))
            .collect();
        debug!(selected = selected.len(), "Selected sources");

        let mut articles = Vec::new();
        for source in selected {
            articles.extend(self.collect_source(source, per_source).await);
        }

        sort_by_publish_date(&mut articles);
        articles.truncate(per_source.saturating_mul(self.catalog.sources.len()));

        info!(count = articles.len(), "Aggregated news");
        NewsDigest {
            count: articles.len(),
            articles,
            fetched_at: Utc::now(),
        }
    }

    /// Matching, enriched records from one source, in feed order.
    #[instrument(level = "info", skip(self, source), fields(source = %source.name))]
    async fn collect_source(&self, source: &Source, limit: usize) -> Vec<ArticleRecord> {
        if limit == 0 {
            return Vec::new();
        }

        let entries = self.reader.fetch_entries(source).await;
        let total = entries.len();
        let matched: Vec<RawEntry> = entries
            .into_iter()
            .filter(|entry| self.is_relevant(entry))
            .take(limit)
            .collect();

        let records: Vec<ArticleRecord> = stream::iter(matched.iter())
            .then(|entry| enrich(&self.extractor, entry, source))
            .collect()
            .await;

        info!(entries = total, matched = records.len(), "Collected source");
        records
    }

    fn is_relevant(&self, entry: &RawEntry) -> bool {
        let keywords = self.catalog.keywords.as_slice();
        matches(entry.title(), keywords) || matches(entry.summary(), keywords)
    }
}

/// Stable descending sort on the raw `publish_date` string.
fn sort_by_publish_date(articles: &mut [ArticleRecord]) {
    articles.sort_by(|a, b| b.publish_date.cmp(&a.publish_date));
}
