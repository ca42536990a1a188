//! Per-host request pacing
//!
//! Each host gets a token bucket: a fetch costs one token, tokens refill
//! continuously at the host's rate, and a worker that finds the bucket
//! empty waits for the refill. Waiting is the only outcome of an empty
//! bucket; requests are never rejected.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration, Instant};

/// Token bucket with continuous refill
///
/// Capacity is one second of budget (floored at a single token so rates
/// below 1/s still make progress), which allows a short burst after idle
/// time while holding the long-run rate.
#[derive(Debug)]
pub struct TokenBucket {
    rate: f64,
    capacity: f64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// `rate` is tokens per second and must be positive; config
    /// validation enforces that upstream.
    pub fn new(rate: f64) -> Self {
        Self::with_capacity(rate, rate.max(1.0))
    }

    /// A bucket that never holds more than one token, for rates where
    /// bursting would violate a host's requested spacing.
    pub fn strict(rate: f64) -> Self {
        Self::with_capacity(rate, 1.0)
    }

    fn with_capacity(rate: f64, capacity: f64) -> Self {
        Self {
            rate,
            capacity,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    fn try_take(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rate).min(self.capacity);
        state.last_refill = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Takes one token, suspending until the refill provides it
    pub async fn acquire(&self) {
        while !self.try_take() {
            sleep(Duration::from_secs_f64(1.0 / self.rate)).await;
        }
    }
}

/// Per-authority token buckets sharing one configured base rate
///
/// A host's robots.txt crawl-delay tightens its bucket when the delay
/// implies a slower rate than the configured one; the stricter of the
/// two always wins. The delay is applied when the authority's bucket is
/// first created, which is before the first request to it.
pub struct HostRateLimiter {
    base_rate: f64,
    buckets: Mutex<HashMap<String, Arc<TokenBucket>>>,
}

impl HostRateLimiter {
    pub fn new(requests_per_second: f64) -> Self {
        Self {
            base_rate: requests_per_second,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Waits for a request slot for `authority`.
    ///
    /// # Arguments
    ///
    /// * `authority` - Host-and-port key, see [`crate::url::authority`]
    /// * `crawl_delay` - The host's robots.txt crawl delay, if any
    pub async fn acquire(&self, authority: &str, crawl_delay: Option<f64>) {
        let bucket = self.bucket(authority, crawl_delay);
        bucket.acquire().await;
    }

    fn bucket(&self, authority: &str, crawl_delay: Option<f64>) -> Arc<TokenBucket> {
        let mut buckets = self.buckets.lock().unwrap();
        if let Some(bucket) = buckets.get(authority) {
            return Arc::clone(bucket);
        }

        let rate = effective_rate(self.base_rate, crawl_delay);
        let bucket = if rate < self.base_rate {
            tracing::info!(
                "crawl-delay caps {} at {:.3} requests per second",
                authority,
                rate
            );
            Arc::new(TokenBucket::strict(rate))
        } else {
            Arc::new(TokenBucket::new(rate))
        };
        buckets.insert(authority.to_string(), Arc::clone(&bucket));
        bucket
    }
}

/// The stricter of the configured rate and the crawl-delay-derived rate
fn effective_rate(base: f64, crawl_delay: Option<f64>) -> f64 {
    match crawl_delay {
        Some(delay) if delay > 0.0 => base.min(1.0 / delay),
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[test]
    fn test_effective_rate_prefers_stricter() {
        assert_eq!(effective_rate(10.0, None), 10.0);
        assert_eq!(effective_rate(10.0, Some(2.0)), 0.5);
        assert_eq!(effective_rate(10.0, Some(0.05)), 10.0);
        assert_eq!(effective_rate(10.0, Some(0.0)), 10.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_up_to_capacity_then_wait() {
        let bucket = TokenBucket::new(2.0);
        let start = Instant::now();

        bucket.acquire().await;
        bucket.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        bucket.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(450));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokens_refill_over_time() {
        let bucket = TokenBucket::new(2.0);
        bucket.acquire().await;
        bucket.acquire().await;

        // A second of idle time restores the full two-token budget
        sleep(Duration::from_secs(1)).await;
        let start = Instant::now();
        bucket.acquire().await;
        bucket.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_bucket_blocks_instead_of_rejecting() {
        let bucket = TokenBucket::new(1.0);
        bucket.acquire().await;

        let blocked = timeout(Duration::from_millis(100), bucket.acquire()).await;
        assert!(blocked.is_err());

        // The same wait eventually succeeds rather than erroring
        bucket.acquire().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_unit_rate_still_progresses() {
        let bucket = TokenBucket::new(0.5);
        let start = Instant::now();
        bucket.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        bucket.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(1900));
    }

    #[tokio::test(start_paused = true)]
    async fn test_strict_bucket_never_bursts() {
        let bucket = TokenBucket::strict(2.0);
        let start = Instant::now();
        bucket.acquire().await;
        bucket.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(450));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hosts_limited_independently() {
        let limiter = HostRateLimiter::new(1.0);
        let start = Instant::now();

        limiter.acquire("a.test:443", None).await;
        limiter.acquire("b.test:443", None).await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        limiter.acquire("a.test:443", None).await;
        assert!(start.elapsed() >= Duration::from_millis(900));
    }

    #[tokio::test(start_paused = true)]
    async fn test_crawl_delay_tightens_rate() {
        let limiter = HostRateLimiter::new(100.0);
        let start = Instant::now();

        limiter.acquire("slow.test:443", Some(1.0)).await;
        limiter.acquire("slow.test:443", Some(1.0)).await;
        assert!(start.elapsed() >= Duration::from_millis(900));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loose_crawl_delay_keeps_configured_rate() {
        // A 10ms crawl-delay would allow 100/s, the configured 2/s wins
        let limiter = HostRateLimiter::new(2.0);
        let start = Instant::now();

        limiter.acquire("fast.test:443", Some(0.01)).await;
        limiter.acquire("fast.test:443", Some(0.01)).await;
        limiter.acquire("fast.test:443", Some(0.01)).await;
        assert!(start.elapsed() >= Duration::from_millis(450));
    }
}
