//! Best-effort enrichment of matching feed entries.
//!
//! [`enrich`] returns an [`ArticleRecord`] rather than a `Result`, so a
//! matching entry can never be lost to an extraction failure: the worst
//! case is a record built from feed fields alone.

use crate::config::Source;
use crate::models::{ArticleRecord, RawEntry};
use crate::scrapers::PageExtractor;
use tracing::{debug, instrument};

/// Build the record for `entry`, overlaying metadata from its article page
/// when the page can be fetched.
///
/// On failure the record keeps the feed title and published value and has
/// no authors.
#[instrument(level = "debug", skip_all, fields(url = %entry.link, source = %source.name))]
pub async fn enrich<X: PageExtractor>(
    extractor: &X,
    entry: &RawEntry,
    source: &Source,
) -> ArticleRecord {
    let record = ArticleRecord::from_feed(entry, source);
    match extractor.extract(&entry.link).await {
        Ok(page) => record.with_page(page),
        Err(e) => {
            debug!(error = %e, "Article extraction failed; keeping feed fields");
            record
        }
    }
}
