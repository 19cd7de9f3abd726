//! The source and keyword catalog.
//!
//! The catalog is loaded once at startup and shared read-only behind an
//! `Arc` for the lifetime of the process. Without a catalog file the
//! built-in [`BUILTIN_CATALOG`] is used.
//!
//! # File Format
//!
//! ```yaml
//! sources:
//!   - name: Tehran Times
//!     url: https://www.tehrantimes.com/rss
//!     region: Iran
//! keywords:
//!   - water
//!   - drought
//! ```

use crate::error::CatalogError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};

/// A configured news feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Source {
    /// Display name, copied into every article from this feed.
    pub name: String,
    /// RSS or Atom feed URL.
    pub url: String,
    /// Region label used by the `region` filter.
    pub region: String,
}

impl Source {
    pub fn new(name: &str, url: &str, region: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            region: region.to_string(),
        }
    }
}

/// The full set of feeds and keywords the service works with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Catalog {
    pub sources: Vec<Source>,
    pub keywords: Vec<String>,
}

/// Water-management feeds for Iran and the Middle East.
pub static BUILTIN_CATALOG: Lazy<Catalog> = Lazy::new(|| Catalog {
    sources: vec![
        Source::new(
            "IRNA Environment",
            "https://www.irna.ir/rss/environment",
            "Iran",
        ),
        Source::new(
            "Al Jazeera",
            "https://www.aljazeera.com/xml/rss/all.xml",
            "Middle East",
        ),
        Source::new("Tehran Times", "https://www.tehrantimes.com/rss", "Iran"),
    ],
    keywords: [
        "water",
        "waste",
        "water management",
        "drought",
        "aquifer",
        "groundwater",
        "irrigation",
        "dam",
        "subsidence",
        "desalination",
        "آب",
        "خشکسالی",
        "سفره آب",
        "فرونشست",
        "مدیریت آب",
    ]
    .iter()
    .map(|k| k.to_string())
    .collect(),
});

impl Catalog {
    /// Parse a catalog from YAML text.
    ///
    /// A catalog without sources is rejected; an empty keyword list is
    /// allowed and simply matches nothing.
    pub fn from_yaml(text: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_yaml::from_str(text)?;
        if catalog.sources.is_empty() {
            return Err(CatalogError::NoSources);
        }
        Ok(catalog)
    }

    /// Load the catalog from `path`, or fall back to the built-in one.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        let Some(path) = path else {
            info!(
                sources = BUILTIN_CATALOG.sources.len(),
                keywords = BUILTIN_CATALOG.keywords.len(),
                "Using built-in catalog"
            );
            return Ok(BUILTIN_CATALOG.clone());
        };

        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CatalogError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let catalog = Self::from_yaml(&text)?;
        info!(
            path = %path.display(),
            sources = catalog.sources.len(),
            keywords = catalog.keywords.len(),
            "Loaded catalog file"
        );
        Ok(catalog)
    }
}
