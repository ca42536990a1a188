//! Crawler module for web page fetching and link mapping
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - HTML parsing and link extraction
//! - Per-host rate limiting and crawl-delay handling
//! - The shared URL frontier with visited tracking
//! - Overall crawl coordination and the result stream

mod coordinator;
mod extract;
mod fetcher;
mod frontier;
mod limiter;
mod stream;

pub use coordinator::{run_crawl, Coordinator};
pub use extract::{HtmlLinkExtractor, LinkExtractor};
pub use fetcher::{build_http_client, FetchError, FetchedPage, Fetcher, HttpFetcher};
pub use frontier::{Frontier, FrontierLease};
pub use limiter::{HostRateLimiter, TokenBucket};
pub use stream::{CrawlStream, PageOutcome, PageResult};

use crate::config::{CrawlOptions, HttpSettings};
use crate::Result;
use std::sync::Arc;

/// Crawls a site over HTTP and streams one result per reachable page
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the options and the start URL
/// 2. Fetch the start host's robots.txt, failing fast if the host is
///    unreachable
/// 3. Spawn the worker pool and begin fetching
/// 4. Stream page results as they are produced
///
/// The crawl stays within the start URL's domain. Dropping the returned
/// stream cancels the run.
///
/// # Arguments
///
/// * `start_url` - Where the crawl begins; must be http or https
/// * `options` - Concurrency, rate and page limits
///
/// # Returns
///
/// * `Ok(CrawlStream)` - The running crawl's result stream
/// * `Err(LinkmapError)` - Invalid input or unreachable start host
///
/// # Example
///
/// ```no_run
/// use linkmap::{crawl, CrawlOptions};
///
/// #[tokio::main]
/// async fn main() -> linkmap::Result<()> {
///     let mut stream = crawl("https://example.com", CrawlOptions::default()).await?;
///     while let Some(result) = stream.recv().await {
///         let page = result?;
///         println!("{}: {} links", page.url, page.links.len());
///     }
///     Ok(())
/// }
/// ```
pub async fn crawl(start_url: &str, options: CrawlOptions) -> Result<CrawlStream> {
    let fetcher = HttpFetcher::new(&options.user_agent, HttpSettings::default())?;
    crawl_with(
        start_url,
        options,
        Arc::new(fetcher),
        Arc::new(HtmlLinkExtractor),
    )
    .await
}

/// Crawls with caller-supplied fetcher and extractor implementations
///
/// Useful for tests and for embedding the engine behind a different
/// transport. [`crawl`] is this with the HTTP fetcher and the HTML
/// extractor plugged in.
pub async fn crawl_with(
    start_url: &str,
    options: CrawlOptions,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
) -> Result<CrawlStream> {
    run_crawl(start_url, options, fetcher, extractor).await
}
