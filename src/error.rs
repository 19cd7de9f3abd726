//! Error types for feed fetching, page extraction, and catalog loading.
//!
//! None of these reach an HTTP client: feed and page failures are caught
//! and degraded by the aggregator, and catalog failures abort startup.

use thiserror::Error;

/// Failure while fetching or parsing a source's feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} when fetching {url}")]
    Status { status: u16, url: String },

    #[error("Failed to parse feed: {0}")]
    Parse(String),
}

/// Failure while downloading an article page.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} when fetching {url}")]
    Status { status: u16, url: String },
}

/// Failure while loading a catalog file at startup.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Catalog defines no sources")]
    NoSources,
}
