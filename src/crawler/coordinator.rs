//! Crawl run coordination
//!
//! This module owns the lifecycle of a crawl, including:
//! - Validating the start URL and options before anything runs
//! - Probing the start host via its robots.txt fetch
//! - Spawning the worker pool and the supervisor that watches it
//! - The per-page pipeline each worker runs: robots check, rate limit,
//!   bounded fetch, link extraction, frontier updates, result emission
//! - Turning a worker defect into one final stream error after every
//!   sibling has been stopped and awaited

use crate::config::{validate_crawl_options, CrawlOptions};
use crate::crawler::extract::LinkExtractor;
use crate::crawler::fetcher::{FetchedPage, Fetcher};
use crate::crawler::frontier::{Frontier, FrontierLease};
use crate::crawler::limiter::HostRateLimiter;
use crate::crawler::stream::{CrawlStream, PageOutcome, PageResult};
use crate::robots::RobotsCache;
use crate::url::{authority, extract_domain, is_same_domain, CanonicalUrl};
use crate::{LinkmapError, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Result channel capacity; workers backpressure on a slow consumer
const RESULT_BUFFER: usize = 64;

/// Everything a worker needs for one run
struct CrawlContext {
    start: CanonicalUrl,
    /// Product token robots.txt groups are matched against
    agent: String,
    frontier: Frontier,
    robots: RobotsCache,
    limiter: HostRateLimiter,
    fetch_slots: Semaphore,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
    results: mpsc::Sender<Result<PageResult>>,
    cancel: CancellationToken,
}

/// Sets up and launches one crawl run
pub struct Coordinator {
    start: CanonicalUrl,
    options: CrawlOptions,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
}

impl Coordinator {
    /// Creates a coordinator, rejecting invalid options or an invalid
    /// start URL before any network traffic happens.
    pub fn new(
        start_url: &str,
        options: CrawlOptions,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn LinkExtractor>,
    ) -> Result<Self> {
        validate_crawl_options(&options)?;
        let start = CanonicalUrl::parse(start_url)?;
        Ok(Self {
            start,
            options,
            fetcher,
            extractor,
        })
    }

    /// Starts the run and hands back the result stream.
    ///
    /// The start host's robots.txt is fetched first and doubles as the
    /// reachability check: a host that cannot be reached at all fails
    /// here, before any worker spawns. An error status for robots.txt
    /// is fine and simply yields a permissive policy.
    pub async fn run(self) -> Result<CrawlStream> {
        let robots = RobotsCache::new(Arc::clone(&self.fetcher));
        let policy = robots
            .prefetch(self.start.url())
            .await
            .map_err(|source| LinkmapError::StartUnreachable {
                url: self.start.to_string(),
                source,
            })?;

        let agent = robots_agent(&self.options.user_agent);
        if let Some(delay) = policy.crawl_delay(&agent) {
            tracing::info!(
                "robots.txt of {} requests a {}s crawl delay",
                extract_domain(self.start.url()).unwrap_or_default(),
                delay
            );
        }

        let cancel = CancellationToken::new();
        let (results, rx) = mpsc::channel(RESULT_BUFFER);

        let context = Arc::new(CrawlContext {
            start: self.start.clone(),
            agent,
            frontier: Frontier::new(self.options.max_pages),
            robots,
            limiter: HostRateLimiter::new(self.options.requests_per_second),
            fetch_slots: Semaphore::new(self.options.fetch_concurrency),
            fetcher: self.fetcher,
            extractor: self.extractor,
            results,
            cancel: cancel.clone(),
        });

        context.frontier.seed(self.start.clone());
        tracing::info!(
            "starting crawl of {} with {} workers, {} fetch slots",
            extract_domain(self.start.url()).unwrap_or_default(),
            self.options.concurrency,
            self.options.fetch_concurrency
        );

        let mut workers = JoinSet::new();
        for id in 0..self.options.concurrency {
            let context = Arc::clone(&context);
            workers.spawn(worker_loop(id, context));
        }
        tokio::spawn(supervise(workers, context));

        Ok(CrawlStream::new(rx, cancel))
    }
}

/// Runs a crawl and returns its result stream
///
/// # Arguments
///
/// * `start_url` - Where the crawl begins; its domain bounds the crawl
/// * `options` - Concurrency, rate and page limits
/// * `fetcher` - Page retrieval implementation
/// * `extractor` - Link extraction implementation
pub async fn run_crawl(
    start_url: &str,
    options: CrawlOptions,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
) -> Result<CrawlStream> {
    Coordinator::new(start_url, options, fetcher, extractor)?
        .run()
        .await
}

/// Pulls URLs from the frontier until the crawl completes or is
/// cancelled. An `Err` return is a defect that aborts the whole run.
async fn worker_loop(id: usize, context: Arc<CrawlContext>) -> Result<()> {
    loop {
        let lease = tokio::select! {
            _ = context.cancel.cancelled() => return Ok(()),
            lease = context.frontier.next_url() => match lease {
                Some(lease) => lease,
                None => {
                    tracing::debug!("worker {} finished, frontier drained", id);
                    return Ok(());
                }
            },
        };

        tracing::debug!("worker {} processing {}", id, lease.url());
        process_page(&context, &lease).await?;
    }
}

/// Runs one URL through the pipeline.
///
/// Returning early on cancellation is fine at any point: the lease's
/// drop keeps the frontier's in-progress accounting right, and the
/// worker loop exits on its next iteration.
async fn process_page(context: &CrawlContext, lease: &FrontierLease<'_>) -> Result<()> {
    let url = lease.url();

    // Robots verdict comes first so a disallowed page never spends
    // rate budget or a fetch slot
    let policy = tokio::select! {
        _ = context.cancel.cancelled() => return Ok(()),
        policy = context.robots.policy_for(url.url()) => policy,
    };
    if !policy.is_allowed(url.as_str(), &context.agent) {
        tracing::info!("robots.txt disallows {}", url);
        return Ok(());
    }

    let host = authority(url.url());
    let crawl_delay = policy.crawl_delay(&context.agent);
    tokio::select! {
        _ = context.cancel.cancelled() => return Ok(()),
        _ = context.limiter.acquire(&host, crawl_delay) => {}
    }

    let permit = tokio::select! {
        _ = context.cancel.cancelled() => return Ok(()),
        permit = context.fetch_slots.acquire() => permit
            .map_err(|e| LinkmapError::Worker(format!("fetch slots closed: {}", e)))?,
    };
    let fetched = tokio::select! {
        _ = context.cancel.cancelled() => return Ok(()),
        fetched = context.fetcher.fetch(url.url()) => fetched,
    };
    // Parsing happens outside the fetch slot
    drop(permit);

    match fetched {
        Ok(page) => handle_fetched(context, url, page).await,
        Err(e) => {
            tracing::warn!("fetch failed for {}: {}", url, e);
            emit(
                context,
                PageResult {
                    url: url.clone(),
                    links: Vec::new(),
                    outcome: PageOutcome::FetchFailed {
                        message: e.to_string(),
                    },
                },
            )
            .await;
            Ok(())
        }
    }
}

/// Classifies a fetched response, feeds the frontier, emits the result
async fn handle_fetched(
    context: &CrawlContext,
    requested: &CanonicalUrl,
    page: FetchedPage,
) -> Result<()> {
    let final_url = CanonicalUrl::from_url(page.final_url.clone())?;

    // A page reachable under several names is reported once, under the
    // name the server settled on
    if final_url != *requested && !context.frontier.mark_visited(&final_url) {
        tracing::debug!("{} redirected to already-claimed {}", requested, final_url);
        return Ok(());
    }

    if !page.is_success() {
        tracing::debug!("{} answered HTTP {}", final_url, page.status);
        emit(
            context,
            PageResult {
                url: final_url,
                links: Vec::new(),
                outcome: PageOutcome::HttpError {
                    status: page.status,
                },
            },
        )
        .await;
        return Ok(());
    }

    if !page.is_html() {
        tracing::debug!("{} is {}, not parsing", final_url, page.content_type);
        emit(
            context,
            PageResult {
                url: final_url,
                links: Vec::new(),
                outcome: PageOutcome::Skipped {
                    content_type: page.content_type,
                },
            },
        )
        .await;
        return Ok(());
    }

    let links = context.extractor.extract(&page.body, &page.final_url);

    if is_same_domain(final_url.url(), context.start.url()) {
        let mut queued = 0;
        for link in &links {
            if is_same_domain(link.url(), context.start.url()) && context.frontier.try_enqueue(link)
            {
                queued += 1;
            }
        }
        tracing::debug!(
            "{}: {} links found, {} newly queued",
            final_url,
            links.len(),
            queued
        );
    } else {
        // A redirect walked off the crawl domain: report what the page
        // linked to, but never schedule anything from it
        tracing::info!("{} redirected off-domain to {}", requested, final_url);
    }

    emit(
        context,
        PageResult {
            url: final_url,
            links,
            outcome: PageOutcome::Success,
        },
    )
    .await;
    Ok(())
}

/// Sends one result to the consumer. A closed channel means the
/// consumer dropped the stream; cancellation is already under way via
/// the stream's drop guard, so the send error itself is ignored.
async fn emit(context: &CrawlContext, result: PageResult) {
    let _ = context.results.send(Ok(result)).await;
}

/// Awaits every worker and closes out the run.
///
/// Workers are joined in the order they settle, so the first defect is
/// seen while its siblings are still running; they are cancelled right
/// away, and each remaining worker is still awaited before the error
/// goes out as the stream's final item. Dropping the last context
/// reference here is what closes the stream.
async fn supervise(mut workers: JoinSet<Result<()>>, context: Arc<CrawlContext>) {
    let mut fatal: Option<LinkmapError> = None;
    while let Some(joined) = workers.join_next().await {
        let failure = match joined {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(join_err) if join_err.is_panic() => Some(LinkmapError::WorkerPanic {
                message: panic_message(join_err),
            }),
            Err(join_err) => Some(LinkmapError::Worker(join_err.to_string())),
        };
        if let Some(e) = failure {
            tracing::error!("worker failed: {}", e);
            context.cancel.cancel();
            if fatal.is_none() {
                fatal = Some(e);
            }
        }
    }

    if let Some(e) = fatal {
        let _ = context.results.send(Err(e)).await;
    } else if context.cancel.is_cancelled() {
        tracing::info!(
            "crawl cancelled after {} pages",
            context.frontier.dispatched()
        );
    } else {
        tracing::info!(
            "crawl complete: {} pages dispatched, {} URLs seen",
            context.frontier.dispatched(),
            context.frontier.seen()
        );
    }
}

/// robots.txt groups name a bare product token, not a full header value
fn robots_agent(user_agent: &str) -> String {
    user_agent
        .split(['/', ' '])
        .next()
        .unwrap_or(user_agent)
        .to_string()
}

fn panic_message(err: JoinError) -> String {
    match err.try_into_panic() {
        Ok(panic) => {
            if let Some(s) = panic.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_string()
            }
        }
        Err(e) => e.to_string(),
    }
}
