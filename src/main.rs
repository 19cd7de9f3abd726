//! # Water News API
//!
//! A small HTTP service that aggregates water-management news from RSS and
//! Atom feeds covering Iran and the Middle East.
//!
//! ## Usage
//!
//! ```sh
//! water_news_api --port 10000 --catalog ./catalog.yaml
//! ```
//!
//! ## Architecture
//!
//! Every `/news` request runs the whole pipeline:
//! 1. **Selection**: pick configured sources matching the `region`/`source` filters
//! 2. **Fetching**: download and parse each source's feed, one source at a time
//! 3. **Matching**: keep entries whose title or summary contains a keyword
//! 4. **Enrichment**: fetch each match's article page for title, authors and date
//! 5. **Merge**: sort by publish date string, cap, and return JSON

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregator;
mod api;
mod cli;
mod config;
mod enrich;
mod error;
mod keywords;
mod models;
mod scrapers;
#[cfg(test)]
mod testing;
mod utils;

use aggregator::Aggregator;
use cli::Cli;
use config::Catalog;
use scrapers::{HttpFeedReader, HttpPageExtractor, build_client};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let catalog = Arc::new(Catalog::load(args.catalog.as_deref()).await?);
    info!(
        sources = catalog.sources.len(),
        keywords = catalog.keywords.len(),
        "Loaded source catalog"
    );

    let client = build_client(Duration::from_secs(args.timeout_secs), &args.user_agent)?;
    let aggregator = Aggregator::new(
        catalog,
        HttpFeedReader::new(client.clone()),
        HttpPageExtractor::new(client),
    );
    let app = api::router(Arc::new(aggregator));

    let addr = args.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "Water news API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
