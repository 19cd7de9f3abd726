//! Test doubles: a throwaway HTTP server and in-memory collaborators.

use crate::config::Source;
use crate::error::ExtractError;
use crate::models::{PageMetadata, RawEntry};
use crate::scrapers::{FeedReader, PageExtractor};
use axum::Router;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::routing::get;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::net::TcpListener;

/// A canned response served by [`spawn_stub`].
pub struct StubRoute {
    path: &'static str,
    status: StatusCode,
    content_type: &'static str,
    body: String,
    delay: Duration,
}

impl StubRoute {
    pub fn xml(path: &'static str, body: &str) -> Self {
        Self {
            path,
            status: StatusCode::OK,
            content_type: "application/rss+xml; charset=utf-8",
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn html(path: &'static str, body: &str) -> Self {
        Self {
            path,
            status: StatusCode::OK,
            content_type: "text/html; charset=utf-8",
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(path: &'static str, status: StatusCode) -> Self {
        Self {
            path,
            status,
            content_type: "text/plain",
            body: String::new(),
            delay: Duration::ZERO,
        }
    }

    /// Hold the response back for `delay` before answering.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Serve `routes` on an ephemeral localhost port and return its base URL.
///
/// Unknown paths answer 404.
pub async fn spawn_stub(routes: Vec<StubRoute>) -> String {
    let mut router = Router::new();
    for StubRoute {
        path,
        status,
        content_type,
        body,
        delay,
    } in routes
    {
        router = router.route(
            path,
            get(move || {
                let body = body.clone();
                async move {
                    tokio::time::sleep(delay).await;
                    (status, [(CONTENT_TYPE, content_type)], body)
                }
            }),
        );
    }

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub listener address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    format!("http://{addr}")
}

/// Feed entries keyed by source name. Unknown sources yield nothing, the
/// same as a feed that failed to load.
#[derive(Default)]
pub struct StubFeeds {
    feeds: HashMap<String, Vec<RawEntry>>,
    fetched: Mutex<Vec<String>>,
}

impl StubFeeds {
    pub fn with(mut self, source: &str, entries: Vec<RawEntry>) -> Self {
        self.feeds.insert(source.to_string(), entries);
        self
    }

    /// Names of the sources fetched so far, in call order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().expect("fetch log").clone()
    }
}

impl FeedReader for StubFeeds {
    async fn fetch_entries(&self, source: &Source) -> Vec<RawEntry> {
        self.fetched
            .lock()
            .expect("fetch log")
            .push(source.name.clone());
        self.feeds.get(&source.name).cloned().unwrap_or_default()
    }
}

/// Page metadata keyed by URL. Unknown URLs fail like an unreachable page.
#[derive(Default)]
pub struct StubPages {
    pages: HashMap<String, PageMetadata>,
}

impl StubPages {
    pub fn with(mut self, url: &str, page: PageMetadata) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }
}

impl PageExtractor for StubPages {
    async fn extract(&self, url: &str) -> Result<PageMetadata, ExtractError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ExtractError::Status {
                status: 503,
                url: url.to_string(),
            })
    }
}

/// A feed entry with the given title, link and date and an empty summary.
pub fn entry(title: &str, link: &str, published: &str) -> RawEntry {
    RawEntry {
        title: Some(title.to_string()),
        summary: Some(String::new()),
        link: link.to_string(),
        published_raw: Some(published.to_string()).filter(|p| !p.is_empty()),
    }
}
