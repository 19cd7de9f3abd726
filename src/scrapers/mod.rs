//! Network-facing collaborators: feed reading and article-page extraction.
//!
//! The aggregator only sees the two traits defined here, so each side can
//! be swapped out (the tests use in-memory stubs). Each trait has an HTTP
//! implementation built on a shared `reqwest::Client`:
//!
//! | Trait | Implementation | Module | Failure policy |
//! |-------|----------------|--------|----------------|
//! | [`FeedReader`] | [`HttpFeedReader`] | [`feed`] | logged, empty entry list |
//! | [`PageExtractor`] | [`HttpPageExtractor`] | [`article`] | error returned, degraded by [`crate::enrich`] |
//!
//! Both implementations rely on the client's timeout, so a stalled upstream
//! cannot hold a request open indefinitely.

use crate::config::Source;
use crate::error::ExtractError;
use crate::models::{PageMetadata, RawEntry};
use reqwest::Client;
use std::future::Future;
use std::time::Duration;

pub mod article;
pub mod feed;

pub use article::HttpPageExtractor;
pub use feed::HttpFeedReader;

/// Produces the entries of a source's feed.
pub trait FeedReader: Send + Sync {
    /// Fetch and parse the feed for `source`.
    ///
    /// Never fails: a feed that can't be fetched or parsed yields no
    /// entries, and the failure is logged.
    fn fetch_entries(&self, source: &Source) -> impl Future<Output = Vec<RawEntry>> + Send;
}

/// Extracts article metadata from a linked page.
pub trait PageExtractor: Send + Sync {
    fn extract(&self, url: &str) -> impl Future<Output = Result<PageMetadata, ExtractError>> + Send;
}

/// Build the HTTP client shared by the feed reader and page extractor.
pub fn build_client(timeout: Duration, user_agent: &str) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(user_agent)
        .build()
}
