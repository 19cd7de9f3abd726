//! JSON HTTP API.
//!
//! # Endpoints
//!
//! | Method | Path | Query | Body |
//! |--------|------|-------|------|
//! | GET | `/` | | name, version, endpoint descriptions |
//! | GET | `/health` | | `{"status": "healthy", "timestamp": ..}` |
//! | GET | `/sources` | | configured sources (name, region) and keywords |
//! | GET | `/news` | `limit`, `region`, `source` | [`NewsDigest`] |
//!
//! All endpoints are unauthenticated and CORS-permissive. `/news` does all
//! of its fetching inside the request; nothing is cached between requests.

use crate::aggregator::{Aggregator, DEFAULT_LIMIT, NewsQuery};
use crate::models::{ApiInfo, Health, NewsDigest, SourceListing, SourceSummary};
use crate::scrapers::{FeedReader, PageExtractor};
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, instrument};

const API_NAME: &str = "Water Management News API";

/// Build the application router around a shared aggregator.
pub fn router<R, X>(aggregator: Arc<Aggregator<R, X>>) -> Router
where
    R: FeedReader + 'static,
    X: PageExtractor + 'static,
{
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/sources", get(sources::<R, X>))
        .route("/news", get(news::<R, X>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(aggregator)
}

async fn index() -> Json<ApiInfo> {
    let endpoints = [
        ("/news", "Get water management news from Iran and Middle East"),
        ("/sources", "List available news sources"),
        ("/health", "API health check"),
    ]
    .into_iter()
    .map(|(path, description)| (path.to_string(), description.to_string()))
    .collect::<BTreeMap<_, _>>();

    Json(ApiInfo {
        name: API_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints,
    })
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
    })
}

async fn sources<R, X>(State(aggregator): State<Arc<Aggregator<R, X>>>) -> Json<SourceListing>
where
    R: FeedReader,
    X: PageExtractor,
{
    let catalog = aggregator.catalog();
    Json(SourceListing {
        sources: catalog
            .sources
            .iter()
            .map(|s| SourceSummary {
                name: s.name.clone(),
                region: s.region.clone(),
            })
            .collect(),
        keywords: catalog.keywords.clone(),
    })
}

/// Raw `/news` query string.
///
/// `limit` is kept as text so that a malformed value falls back to the
/// default instead of rejecting the request.
#[derive(Debug, Default)]
pub struct NewsParams {
    pub limit: Option<String>,
    pub region: Option<String>,
    pub source: Option<String>,
}

impl NewsParams {
    /// Take the first value of each known key. Repeated and unknown keys
    /// never fail the request.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "limit" => &mut params.limit,
                "region" => &mut params.region,
                "source" => &mut params.source,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }
}

impl From<NewsParams> for NewsQuery {
    fn from(params: NewsParams) -> Self {
        NewsQuery {
            limit: params
                .limit
                .and_then(|l| l.trim().parse().ok())
                .unwrap_or(DEFAULT_LIMIT),
            region: params.region,
            source: params.source,
        }
    }
}

#[instrument(level = "info", skip_all)]
async fn news<R, X>(
    State(aggregator): State<Arc<Aggregator<R, X>>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Json<NewsDigest>
where
    R: FeedReader,
    X: PageExtractor,
{
    let params = NewsParams::from_pairs(pairs);
    debug!(?params, "News query");
    let query = NewsQuery::from(params);
    Json(aggregator.get_news(&query).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BUILTIN_CATALOG, Catalog};
    use crate::models::ArticleRecord;
    use crate::testing::{StubFeeds, StubPages, entry};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app(feeds: StubFeeds) -> Router {
        let catalog = Arc::new(BUILTIN_CATALOG.clone());
        router(Arc::new(Aggregator::new(catalog, feeds, StubPages::default())))
    }

    fn feeds() -> StubFeeds {
        StubFeeds::default()
            .with(
                "IRNA Environment",
                (0..7)
                    .map(|i| entry(&format!("Drought report {i}"), &format!("http://irna/{i}"), "2024-01-01"))
                    .collect(),
            )
            .with(
                "Al Jazeera",
                vec![
                    entry("Gaza water crisis deepens", "http://aj/1", "2024-01-03"),
                    entry("Election results", "http://aj/2", "2024-01-04"),
                ],
            )
            .with(
                "Tehran Times",
                vec![entry("City announces new desalination plant", "http://x/1", "2024-01-01")],
            )
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_index() {
        let (status, body) = get_json(app(StubFeeds::default()), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], API_NAME);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(body["endpoints"].as_object().unwrap().len(), 3);
        assert!(body["endpoints"]["/news"].is_string());
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(app(StubFeeds::default()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        let timestamp = body["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_sources_lists_catalog() {
        let (status, body) = get_json(app(StubFeeds::default()), "/sources?region=Iran").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["sources"],
            serde_json::json!([
                {"name": "IRNA Environment", "region": "Iran"},
                {"name": "Al Jazeera", "region": "Middle East"},
                {"name": "Tehran Times", "region": "Iran"},
            ])
        );
        assert_eq!(body["keywords"].as_array().unwrap().len(), 15);
    }

    #[tokio::test]
    async fn test_news_defaults() {
        let (status, body) = get_json(app(feeds()), "/news").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 9);
        let articles: Vec<ArticleRecord> = serde_json::from_value(body["articles"].clone()).unwrap();
        assert_eq!(articles.len(), 9);
        assert_eq!(articles[0].url, "http://aj/1");
        assert!(chrono::DateTime::parse_from_rfc3339(body["fetched_at"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_news_degraded_record_shape() {
        let (_, body) = get_json(app(feeds()), "/news?source=Tehran%20Times").await;
        assert_eq!(body["count"], 1);
        assert_eq!(
            body["articles"][0],
            serde_json::json!({
                "title": "City announces new desalination plant",
                "summary": "",
                "url": "http://x/1",
                "source": "Tehran Times",
                "region": "Iran",
                "publish_date": "2024-01-01",
                "authors": [],
            })
        );
    }

    #[tokio::test]
    async fn test_news_limit() {
        let (_, body) = get_json(app(feeds()), "/news?limit=5").await;
        let articles: Vec<ArticleRecord> = serde_json::from_value(body["articles"].clone()).unwrap();
        assert!(articles.len() <= 15);
        assert_eq!(articles.iter().filter(|a| a.source == "IRNA Environment").count(), 5);
        assert_eq!(body["count"], 7);
    }

    #[tokio::test]
    async fn test_news_invalid_limit_uses_default() {
        let (status, body) = get_json(app(feeds()), "/news?limit=lots").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 9);
    }

    #[tokio::test]
    async fn test_news_region_filter() {
        let (_, body) = get_json(app(feeds()), "/news?region=iran").await;
        let articles: Vec<ArticleRecord> = serde_json::from_value(body["articles"].clone()).unwrap();
        assert_eq!(articles.len(), 8);
        assert!(articles.iter().all(|a| a.region.eq_ignore_ascii_case("Iran")));
    }

    #[tokio::test]
    async fn test_news_unknown_region() {
        let (status, body) = get_json(app(feeds()), "/news?region=Atlantis").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 0);
        assert_eq!(body["articles"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let response = app(StubFeeds::default())
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("Origin", "https://dashboard.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.headers().contains_key("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn test_news_repeated_keys_use_first_value() {
        let (status, body) = get_json(
            app(feeds()),
            "/news?region=Middle%20East&region=Iran&limit=1&limit=oops&utm_source=x",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["articles"][0]["source"], "Al Jazeera");
    }

    #[test]
    fn test_news_params_from_pairs() {
        let pair = |k: &str, v: &str| (k.to_string(), v.to_string());
        let params = NewsParams::from_pairs(vec![
            pair("region", "Iran"),
            pair("region", "Iran"),
            pair("source", ""),
            pair("page", "2"),
        ]);
        assert_eq!(params.region.as_deref(), Some("Iran"));
        assert_eq!(params.source.as_deref(), Some(""));
        assert_eq!(params.limit, None);
    }

    #[test]
    fn test_news_params_conversion() {
        let query = NewsQuery::from(NewsParams {
            limit: Some(" 3 ".to_string()),
            region: Some("Iran".to_string()),
            source: None,
        });
        assert_eq!(query.limit, 3);
        assert_eq!(query.region.as_deref(), Some("Iran"));

        assert_eq!(NewsQuery::from(NewsParams::default()).limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_custom_catalog_state() {
        let catalog = Arc::new(Catalog {
            sources: vec![],
            keywords: vec!["water".to_string()],
        });
        let aggregator = Aggregator::new(catalog, StubFeeds::default(), StubPages::default());
        assert!(aggregator.catalog().sources.is_empty());
    }
}
