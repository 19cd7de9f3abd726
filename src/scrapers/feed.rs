//! RSS and Atom feed reader.
//!
//! Feeds are parsed with `quick-xml` in a single streaming pass. The parser
//! understands RSS 2.0 `<item>`, RSS 1.0 (RDF) `<item>`, and Atom `<entry>`
//! elements, matching on local names so namespace prefixes are irrelevant.
//!
//! # Field Mapping
//!
//! | Entry field | RSS | Atom |
//! |-------------|-----|------|
//! | title | `title` | `title` |
//! | summary | `description`, else `content:encoded` | `summary`, else `content` |
//! | link | `link`, else an http(s) `guid` | `link[href]` (alternate) |
//! | published | `pubDate`, else `dc:date` | `published`, else `updated` |
//!
//! The `dc:date` and `updated` fallbacks go beyond a strict `published`
//! lookup: RDF feeds and many Atom feeds carry no other date, and an empty
//! date sorts last.

use super::FeedReader;
use crate::config::Source;
use crate::error::FeedError;
use crate::models::RawEntry;
use crate::utils::{strip_html, truncate_for_log};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use reqwest::Client;
use reqwest::header::ACCEPT;
use tracing::{debug, info, instrument, warn};
use url::Url;

const FEED_ACCEPT: &str =
    "application/rss+xml, application/atom+xml, application/xml;q=0.9, text/xml;q=0.9, */*;q=0.8";

/// Fetches feeds over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFeedReader {
    client: Client,
}

impl HttpFeedReader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetch and parse one feed, surfacing every failure.
    #[instrument(level = "info", skip_all, fields(source = %source.name))]
    pub async fn try_fetch(&self, source: &Source) -> Result<Vec<RawEntry>, FeedError> {
        debug!(url = %source.url, "Fetching feed");
        let response = self
            .client
            .get(&source.url)
            .header(ACCEPT, FEED_ACCEPT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
                url: source.url.clone(),
            });
        }

        let bytes = response.bytes().await?;
        let mut entries = parse_feed(&bytes)?;
        resolve_links(&mut entries, &source.url);
        info!(count = entries.len(), "Parsed feed entries");
        Ok(entries)
    }
}

/// Make relative entry links absolute against the feed URL.
///
/// Absolute links are kept byte-for-byte; links that cannot be joined are
/// left as they are.
pub fn resolve_links(entries: &mut [RawEntry], feed_url: &str) {
    let Ok(base) = Url::parse(feed_url) else {
        return;
    };
    for entry in entries {
        if Url::parse(&entry.link).is_ok() {
            continue;
        }
        if let Ok(resolved) = base.join(&entry.link) {
            entry.link = resolved.to_string();
        }
    }
}

impl FeedReader for HttpFeedReader {
    async fn fetch_entries(&self, source: &Source) -> Vec<RawEntry> {
        match self.try_fetch(source).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    source = %source.name,
                    url = %source.url,
                    error = %e,
                    "Feed unavailable; continuing without it"
                );
                Vec::new()
            }
        }
    }
}

/// Child elements of an item that carry a value we keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Summary,
    Content,
    Link,
    Guid,
    Published,
    DcDate,
    Updated,
}

impl Field {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Field::Title),
            b"description" | b"summary" => Some(Field::Summary),
            b"encoded" | b"content" => Some(Field::Content),
            b"link" => Some(Field::Link),
            b"guid" | b"id" => Some(Field::Guid),
            b"pubDate" | b"published" | b"issued" => Some(Field::Published),
            b"date" => Some(Field::DcDate),
            b"updated" | b"modified" => Some(Field::Updated),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct EntryBuilder {
    title: Option<String>,
    summary: Option<String>,
    content: Option<String>,
    link: Option<String>,
    href: Option<String>,
    guid: Option<String>,
    published: Option<String>,
    dc_date: Option<String>,
    updated: Option<String>,
}

impl EntryBuilder {
    fn set(&mut self, field: Field, text: String) {
        let text = text.trim().to_string();
        if text.is_empty() {
            return;
        }
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Summary => &mut self.summary,
            Field::Content => &mut self.content,
            Field::Link => &mut self.link,
            Field::Guid => &mut self.guid,
            Field::Published => &mut self.published,
            Field::DcDate => &mut self.dc_date,
            Field::Updated => &mut self.updated,
        };
        slot.get_or_insert(text);
    }

    /// Record an Atom-style `<link href=".." rel="..">`.
    ///
    /// Only alternate links (or links without `rel`) point at the article;
    /// the first one wins.
    fn take_link_href(&mut self, element: &BytesStart<'_>) {
        if self.href.is_some() {
            return;
        }
        let mut href = None;
        let mut rel = None;
        for attr in element.attributes().flatten() {
            let value = decode_escaped(&String::from_utf8_lossy(&attr.value));
            match attr.key.local_name().as_ref() {
                b"href" => href = Some(value),
                b"rel" => rel = Some(value),
                _ => {}
            }
        }
        if matches!(rel.as_deref(), None | Some("alternate")) {
            self.href = href.filter(|h| !h.trim().is_empty());
        }
    }

    fn build(self) -> Option<RawEntry> {
        let link = self
            .link
            .or(self.href)
            .or(self.guid.filter(|g| looks_like_url(g)))?;

        Some(RawEntry {
            title: self.title.map(|t| strip_html(&t)),
            summary: self.summary.or(self.content).map(|s| strip_html(&s)),
            link: link.trim().to_string(),
            published_raw: self.published.or(self.dc_date).or(self.updated),
        })
    }
}

fn looks_like_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

fn decode_escaped(raw: &str) -> String {
    quick_xml::escape::unescape(raw)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// Parse RSS or Atom XML into entries, in document order.
///
/// Entries without a usable link are dropped. A document with no items
/// yields an empty list rather than an error.
///
/// # Arguments
///
/// * `xml` - Raw feed body as downloaded; the declared encoding is ignored
///   and the bytes are read as UTF-8
///
/// # Returns
///
/// One [`RawEntry`] per `<item>` or `<entry>` that has a link. Titles and
/// summaries are plain text with markup stripped and entities decoded.
///
/// # Examples
///
/// ```ignore
/// let xml = b"<rss><channel><item><title>Dam &amp; reservoir</title>\
///             <link>https://example.com/1</link></item></channel></rss>";
/// let entries = parse_feed(xml)?;
/// assert_eq!(entries[0].title(), "Dam & reservoir");
/// ```
///
/// # Errors
///
/// Returns [`FeedError::Parse`] when the XML itself is malformed.
pub fn parse_feed(xml: &[u8]) -> Result<Vec<RawEntry>, FeedError> {
    let mut reader = Reader::from_reader(xml);

    let mut entries = Vec::new();
    let mut buf = Vec::new();

    let mut depth = 0usize;
    // Depth of the open <item>/<entry> element and its collected fields.
    let mut current: Option<(usize, EntryBuilder)> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                let local = e.local_name();
                let item_depth = current.as_ref().map(|(d, _)| *d);
                match item_depth {
                    None if matches!(local.as_ref(), b"item" | b"entry") => {
                        current = Some((depth, EntryBuilder::default()));
                    }
                    Some(d) if depth == d + 1 => {
                        if let (b"link", Some((_, builder))) = (local.as_ref(), current.as_mut()) {
                            builder.take_link_href(&e);
                        }
                        field = Field::from_local_name(local.as_ref());
                        text.clear();
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some((item_depth, builder)) = current.as_mut() {
                    if depth == *item_depth && e.local_name().as_ref() == b"link" {
                        builder.take_link_href(&e);
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if field.is_some() {
                    text.push_str(&decode_escaped(&String::from_utf8_lossy(&e)));
                }
            }
            Ok(Event::CData(e)) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if field.is_some() {
                    let reference = format!("&{};", String::from_utf8_lossy(&e));
                    text.push_str(&decode_escaped(&reference));
                }
            }
            Ok(Event::End(_)) => {
                let item_depth = current.as_ref().map(|(d, _)| *d);
                if item_depth.is_some_and(|d| depth == d + 1) {
                    if let (Some(f), Some((_, builder))) = (field.take(), current.as_mut()) {
                        builder.set(f, std::mem::take(&mut text));
                    }
                } else if item_depth == Some(depth) {
                    if let Some((_, builder)) = current.take() {
                        match builder.build() {
                            Some(entry) => entries.push(entry),
                            None => debug!("Skipping feed entry without a link"),
                        }
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                let preview = String::from_utf8_lossy(xml);
                debug!(preview = %truncate_for_log(&preview, 200), "Unparseable feed body");
                return Err(FeedError::Parse(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}
