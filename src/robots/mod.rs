//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching
//! robots.txt policies. Each host's robots.txt is fetched at most once
//! per crawl run, and a fetch failure yields a permissive policy so a
//! missing or broken robots.txt never stalls the crawl.

mod parser;

pub use parser::RobotsPolicy;

use crate::crawler::{FetchError, Fetcher};
use crate::url::authority;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

/// Per-host robots.txt policy store
///
/// Policies are fetched through the crawl's [`Fetcher`], so the same
/// retry behavior and user agent apply to robots.txt as to pages.
pub struct RobotsCache {
    fetcher: Arc<dyn Fetcher>,
    policies: Mutex<HashMap<String, Arc<RobotsPolicy>>>,
}

impl RobotsCache {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            policies: Mutex::new(HashMap::new()),
        }
    }

    /// The robots.txt location for a URL's authority
    fn robots_url(url: &Url) -> Url {
        let mut robots = url.clone();
        robots.set_path("/robots.txt");
        robots.set_query(None);
        robots.set_fragment(None);
        robots
    }

    /// Fetches and caches the policy for `url`'s authority, propagating
    /// transport failures to the caller.
    ///
    /// Used at startup, where failing to reach the start host at all
    /// must abort the run before any worker spawns. An HTTP error status
    /// still produces a permissive policy; only transport errors are
    /// reported.
    pub async fn prefetch(&self, url: &Url) -> Result<Arc<RobotsPolicy>, FetchError> {
        let key = authority(url);
        let mut policies = self.policies.lock().await;
        if let Some(policy) = policies.get(&key) {
            return Ok(Arc::clone(policy));
        }

        let page = self.fetcher.fetch(&Self::robots_url(url)).await?;
        let policy = Arc::new(Self::parse_response(&key, page.status, &page.body));
        policies.insert(key, Arc::clone(&policy));
        Ok(policy)
    }

    /// The cached policy for `url`'s authority, fetching it on first use.
    ///
    /// Any failure, transport or HTTP, falls back to the permissive
    /// policy. The cache lock is held across the fetch so each authority
    /// is fetched exactly once even under concurrent callers.
    pub async fn policy_for(&self, url: &Url) -> Arc<RobotsPolicy> {
        let key = authority(url);
        let mut policies = self.policies.lock().await;
        if let Some(policy) = policies.get(&key) {
            return Arc::clone(policy);
        }

        let policy = match self.fetcher.fetch(&Self::robots_url(url)).await {
            Ok(page) => Arc::new(Self::parse_response(&key, page.status, &page.body)),
            Err(e) => {
                tracing::warn!("robots.txt fetch failed for {}: {}, allowing all", key, e);
                Arc::new(RobotsPolicy::allow_all())
            }
        };
        policies.insert(key, Arc::clone(&policy));
        policy
    }

    fn parse_response(key: &str, status: u16, body: &str) -> RobotsPolicy {
        if (200..300).contains(&status) {
            tracing::debug!("parsed robots.txt for {}", key);
            RobotsPolicy::from_content(body)
        } else {
            tracing::debug!("robots.txt for {} returned HTTP {}, allowing all", key, status);
            RobotsPolicy::allow_all()
        }
    }
}
