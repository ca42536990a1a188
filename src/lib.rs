//! linkmap - map the link structure of a single web domain
//!
//! Starting from one URL, linkmap crawls every reachable page on that
//! URL's domain and streams back, for each page, the full set of URLs
//! discovered on it. Politeness is built in: robots.txt rules are
//! honored, requests to a host are rate limited, and redirects that
//! leave the start domain are reported but never followed further.
//!
//! The library entry point is [`crawl`]; the `linkmap` binary wraps it
//! with a command line interface.

pub mod config;
pub mod crawler;
pub mod robots;
pub mod url;

use thiserror::Error;

/// Main error type for linkmap operations
#[derive(Debug, Error)]
pub enum LinkmapError {
    /// Configuration loading or validation failed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// URL parsing or canonicalization failed
    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    /// HTTP client construction failed
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// The start URL's host could not be reached at all
    #[error("start URL {url} is unreachable: {source}")]
    StartUnreachable {
        url: String,
        source: crawler::FetchError,
    },

    /// A worker task panicked
    #[error("worker panicked: {message}")]
    WorkerPanic { message: String },

    /// A worker task failed for a reason other than a panic
    #[error("worker failed: {0}")]
    Worker(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for linkmap operations
pub type Result<T> = std::result::Result<T, LinkmapError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, CrawlOptions, HttpSettings};
pub use crawler::{
    crawl, crawl_with, CrawlStream, FetchError, FetchedPage, Fetcher, HtmlLinkExtractor,
    HttpFetcher, LinkExtractor, PageOutcome, PageResult,
};
pub use url::{extract_domain, is_same_domain, CanonicalUrl};
