//! Command-line interface definitions for the Water News API server.
//!
//! Every option can also be set from an environment variable, so the
//! binary runs unchanged on hosts that only provide `PORT`.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the server.
///
/// # Examples
///
/// ```sh
/// # Listen on the default 0.0.0.0:10000 with the built-in feeds
/// water_news_api
///
/// # Custom port and catalog
/// PORT=8080 water_news_api --catalog ./catalog.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 10000)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "NEWS_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Optional YAML file replacing the built-in sources and keywords
    #[arg(short, long, env = "NEWS_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Timeout in seconds for every feed and article request
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// User-Agent header sent to news sites
    #[arg(
        long,
        env = "NEWS_USER_AGENT",
        default_value = "Mozilla/5.0 (compatible; WaterNewsBot/1.0)"
    )]
    pub user_agent: String,
}

impl Cli {
    /// The `host:port` pair to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
