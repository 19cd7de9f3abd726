//! Article-page metadata extraction.
//!
//! Downloads a linked article and pulls out the headline, bylines and
//! publish date. Extraction never fails once a page is in hand: each field
//! is best-effort and absent fields stay empty. Only the download itself can
//! fail, and [`crate::enrich`] turns that into a degraded record.
//!
//! # Lookup Order
//!
//! - **Title**: `og:title`, `twitter:title`, `<title>`, first `<h1>`
//! - **Authors**: JSON-LD `author`, `meta[name=author]`,
//!   `meta[property=article:author]`, `[rel=author]`, `[itemprop=author]`
//! - **Date**: `article:published_time`, `og:published_time`,
//!   `itemprop=datePublished`, JSON-LD `datePublished`, `pubdate`/`date`
//!   meta tags, `time[datetime]`

use super::PageExtractor;
use crate::error::ExtractError;
use crate::models::PageMetadata;
use crate::utils::collapse_whitespace;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::{debug, instrument};

const AWARE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";
const NAIVE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid CSS selector")
}

static JSON_LD: Lazy<Selector> = Lazy::new(|| selector("script[type='application/ld+json']"));

static TITLE_SELECTORS: Lazy<Vec<(Selector, Option<&'static str>)>> = Lazy::new(|| {
    vec![
        (selector("meta[property='og:title']"), Some("content")),
        (selector("meta[name='twitter:title']"), Some("content")),
        (selector("title"), None),
        (selector("h1"), None),
    ]
});

static AUTHOR_SELECTORS: Lazy<Vec<(Selector, Option<&'static str>)>> = Lazy::new(|| {
    vec![
        (selector("meta[name='author']"), Some("content")),
        (selector("meta[property='article:author']"), Some("content")),
        (selector("[rel='author']"), None),
        (selector("[itemprop='author']"), None),
    ]
});

static DATE_META_BEFORE_JSON_LD: Lazy<Vec<(Selector, &'static str)>> = Lazy::new(|| {
    vec![
        (selector("meta[property='article:published_time']"), "content"),
        (selector("meta[property='og:published_time']"), "content"),
        (selector("meta[itemprop='datePublished']"), "content"),
    ]
});

static DATE_META_AFTER_JSON_LD: Lazy<Vec<(Selector, &'static str)>> = Lazy::new(|| {
    vec![
        (selector("meta[name='pubdate']"), "content"),
        (selector("meta[name='publishdate']"), "content"),
        (selector("meta[name='date']"), "content"),
        (selector("time[datetime]"), "datetime"),
    ]
});

/// Downloads article pages over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPageExtractor {
    client: Client,
}

impl HttpPageExtractor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl PageExtractor for HttpPageExtractor {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn extract(&self, url: &str) -> Result<PageMetadata, ExtractError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let page = extract_metadata(&body);
        debug!(
            has_title = page.title.is_some(),
            authors = page.authors.len(),
            has_date = page.published.is_some(),
            "Extracted page metadata"
        );
        Ok(page)
    }
}

/// Extract title, authors and publish date from an HTML document.
pub fn extract_metadata(html: &str) -> PageMetadata {
    let document = Html::parse_document(html);
    let json_ld = json_ld_objects(&document);

    PageMetadata {
        title: extract_title(&document),
        authors: extract_authors(&document, &json_ld),
        published: extract_published(&document, &json_ld),
    }
}

/// Text of an element, or one of its attributes when `attr` is given.
fn element_value(element: ElementRef<'_>, attr: Option<&str>) -> String {
    let raw = match attr {
        Some(attr) => element.value().attr(attr).unwrap_or_default().to_string(),
        None => element.text().collect::<Vec<_>>().join(" "),
    };
    collapse_whitespace(&raw)
}

fn extract_title(document: &Html) -> Option<String> {
    TITLE_SELECTORS.iter().find_map(|(selector, attr)| {
        document
            .select(selector)
            .map(|el| element_value(el, *attr))
            .find(|title| !title.is_empty())
    })
}

/// All JSON-LD objects on the page, with arrays and `@graph` flattened.
fn json_ld_objects(document: &Html) -> Vec<Value> {
    let mut objects = Vec::new();
    for script in document.select(&JSON_LD) {
        let text = script.text().collect::<String>();
        let Ok(json) = serde_json::from_str::<Value>(text.trim()) else {
            continue;
        };
        flatten_json_ld(json, &mut objects);
    }
    objects
}

fn flatten_json_ld(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_json_ld(item, out);
            }
        }
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                flatten_json_ld(graph, out);
            }
            out.push(Value::Object(map));
        }
        _ => {}
    }
}

fn json_ld_author_names(author: &Value, names: &mut Vec<String>) {
    match author {
        Value::Array(items) => {
            for item in items {
                json_ld_author_names(item, names);
            }
        }
        Value::Object(obj) => {
            if let Some(name) = obj.get("name").and_then(Value::as_str) {
                names.push(name.to_string());
            }
        }
        Value::String(name) => names.push(name.clone()),
        _ => {}
    }
}

/// Normalize a byline; profile URLs and empty strings are not names.
fn clean_author(raw: &str) -> Option<String> {
    let name = collapse_whitespace(raw);
    let has_byline_prefix = name
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("by "));
    let name = if has_byline_prefix {
        name[3..].trim().to_string()
    } else {
        name
    };
    if name.is_empty() || name.starts_with("http://") || name.starts_with("https://") {
        return None;
    }
    Some(name)
}

fn extract_authors(document: &Html, json_ld: &[Value]) -> Vec<String> {
    let mut raw = Vec::new();
    for object in json_ld {
        if let Some(author) = object.get("author") {
            json_ld_author_names(author, &mut raw);
        }
    }
    for (selector, attr) in AUTHOR_SELECTORS.iter() {
        raw.extend(document.select(selector).map(|el| element_value(el, *attr)));
    }

    let mut authors: Vec<String> = Vec::new();
    for name in raw.iter().filter_map(|r| clean_author(r)) {
        if !authors.contains(&name) {
            authors.push(name);
        }
    }
    authors
}

fn extract_published(document: &Html, json_ld: &[Value]) -> Option<String> {
    let meta = |selectors: &[(Selector, &'static str)]| -> Vec<String> {
        selectors
            .iter()
            .flat_map(|(selector, attr)| {
                document
                    .select(selector)
                    .filter_map(|el| el.value().attr(attr).map(str::to_string))
                    .collect::<Vec<_>>()
            })
            .collect()
    };

    let mut candidates = meta(&DATE_META_BEFORE_JSON_LD);
    candidates.extend(
        json_ld
            .iter()
            .filter_map(|obj| obj.get("datePublished").and_then(Value::as_str))
            .map(str::to_string),
    );
    candidates.extend(meta(&DATE_META_AFTER_JSON_LD));

    candidates.iter().find_map(|c| render_date(c))
}

/// Parse a date in one of the common web formats and render it as
/// `YYYY-MM-DD HH:MM:SS` with a `±HH:MM` suffix when the input had an offset.
///
/// Accepted inputs, tried in order: RFC 3339, RFC 2822, ISO 8601 with a
/// compact `±HHMM` offset, ISO 8601 without offset, and a bare `YYYY-MM-DD`.
///
/// # Arguments
///
/// * `raw` - Date text from a meta tag, JSON-LD or `<time datetime>`
///
/// # Returns
///
/// The rendered date, or `None` when the value is not a recognizable date.
/// Offsets are kept as given, not converted to UTC.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(render_date("2024-01-01T10:00:00+03:30").unwrap(), "2024-01-01 10:00:00+03:30");
/// assert_eq!(render_date("2024-01-01").unwrap(), "2024-01-01 00:00:00");
/// assert_eq!(render_date("yesterday"), None);
/// ```
pub fn render_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.format(AWARE_DATE_FORMAT).to_string());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.format(AWARE_DATE_FORMAT).to_string());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.format(AWARE_DATE_FORMAT).to_string());
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.format(NAIVE_DATE_FORMAT).to_string());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.format(NAIVE_DATE_FORMAT).to_string())
}
