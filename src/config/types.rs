use serde::Deserialize;

/// Main configuration structure for linkmap
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawl: CrawlOptions,

    #[serde(default)]
    pub http: HttpSettings,
}

/// Crawl behavior options
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlOptions {
    /// Number of worker tasks pulling from the frontier
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Maximum number of simultaneously in-flight fetches
    #[serde(rename = "fetch-concurrency", default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    /// Per-host request budget in requests per second
    #[serde(rename = "requests-per-second", default = "default_requests_per_second")]
    pub requests_per_second: f64,

    /// User-Agent header value, also the identity robots.txt rules are
    /// matched against
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Stop dispatching new pages after this many, unlimited when unset
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<usize>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            fetch_concurrency: default_fetch_concurrency(),
            requests_per_second: default_requests_per_second(),
            user_agent: default_user_agent(),
            max_pages: None,
        }
    }
}

/// HTTP client settings for the production fetcher
#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    /// Total per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: f64,

    /// How many times a transport failure is retried
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff between retries in seconds, scaled by attempt number
    #[serde(rename = "retry-backoff", default = "default_retry_backoff")]
    pub retry_backoff: f64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            retry_backoff: default_retry_backoff(),
        }
    }
}

fn default_concurrency() -> usize {
    5
}

fn default_fetch_concurrency() -> usize {
    5
}

fn default_requests_per_second() -> f64 {
    10.0
}

fn default_user_agent() -> String {
    format!("linkmap/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout() -> f64 {
    30.0
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff() -> f64 {
    0.5
}
