//! linkmap main entry point
//!
//! This is the command-line interface for the linkmap site crawler.

use anyhow::Context;
use clap::Parser;
use linkmap::config::{apply_env_overrides, load_config, validate};
use linkmap::{crawl_with, Config, HtmlLinkExtractor, HttpFetcher, PageOutcome};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// linkmap: map the link structure of a website
///
/// linkmap crawls a site starting from one URL, staying within that
/// URL's domain, and prints every reachable page together with the
/// links found on it. robots.txt rules and crawl delays are honored.
#[derive(Parser, Debug)]
#[command(name = "linkmap")]
#[command(version)]
#[command(about = "Map the link structure of a website", long_about = None)]
struct Cli {
    /// URL the crawl starts from; its domain bounds the crawl
    #[arg(value_name = "URL")]
    start_url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of crawl workers
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Maximum number of simultaneous HTTP requests
    #[arg(long, value_name = "N")]
    fetch_concurrency: Option<usize>,

    /// Request rate cap in requests per second
    #[arg(short = 'r', long, value_name = "RATE")]
    requests_per_second: Option<f64>,

    /// User-Agent header to send
    #[arg(long, value_name = "AGENT")]
    user_agent: Option<String>,

    /// Stop after this many pages
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<f64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    match run(&cli.start_url, config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("linkmap=info,warn"),
            1 => EnvFilter::new("linkmap=debug,info"),
            2 => EnvFilter::new("linkmap=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds the effective configuration.
///
/// Precedence, lowest to highest: built-in defaults, the config file,
/// LINKMAP_* environment variables, command-line flags.
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path).with_context(|| format!("failed to load {}", path.display()))?
        }
        None => Config::default(),
    };

    apply_env_overrides(&mut config)?;

    if let Some(concurrency) = cli.concurrency {
        config.crawl.concurrency = concurrency;
    }
    if let Some(fetch_concurrency) = cli.fetch_concurrency {
        config.crawl.fetch_concurrency = fetch_concurrency;
    }
    if let Some(rate) = cli.requests_per_second {
        config.crawl.requests_per_second = rate;
    }
    if let Some(user_agent) = &cli.user_agent {
        config.crawl.user_agent = user_agent.clone();
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawl.max_pages = Some(max_pages);
    }
    if let Some(timeout) = cli.timeout {
        config.http.timeout = timeout;
    }

    // Flags can break what the file satisfied, so validate the merge
    validate(&config)?;
    Ok(config)
}

/// Runs the crawl, printing each successfully mapped page with the
/// links found on it
async fn run(start_url: &str, config: Config) -> anyhow::Result<()> {
    let fetcher = HttpFetcher::new(&config.crawl.user_agent, config.http.clone())
        .context("failed to build HTTP client")?;
    let mut stream = crawl_with(
        start_url,
        config.crawl,
        Arc::new(fetcher),
        Arc::new(HtmlLinkExtractor),
    )
    .await?;

    let mut pages = 0usize;
    let mut failures = 0usize;
    let mut first = true;
    while let Some(result) = stream.recv().await {
        let page = result?;
        pages += 1;
        match &page.outcome {
            PageOutcome::Success => {
                if !first {
                    println!();
                }
                first = false;
                println!("{}", page.url);
                for link in &page.links {
                    println!("  {}", link);
                }
            }
            PageOutcome::Skipped { content_type } => {
                tracing::info!("skipped {} ({})", page.url, content_type);
            }
            PageOutcome::HttpError { status } => {
                failures += 1;
                tracing::warn!("{} answered HTTP {}", page.url, status);
            }
            PageOutcome::FetchFailed { message } => {
                failures += 1;
                tracing::warn!("could not fetch {}: {}", page.url, message);
            }
        }
    }

    tracing::info!("mapped {} pages ({} unreachable or failed)", pages, failures);
    Ok(())
}
