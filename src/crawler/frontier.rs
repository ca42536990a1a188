//! Shared crawl frontier
//!
//! The frontier is the single authority on which URLs have been
//! scheduled during a run. One mutex guards the pending queue, the
//! visited set and the in-progress count, so every scheduling decision
//! is one critical section. Idle workers park on a [`Notify`] and
//! re-evaluate the queue after every wakeup; completion is re-checked
//! after every in-progress decrement, because the last finishing page
//! is what proves no further work can appear.

use crate::url::CanonicalUrl;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use tokio::sync::Notify;

/// Pending-URL queue plus visited set for one crawl run
pub struct Frontier {
    state: Mutex<FrontierState>,
    wake: Notify,
    max_pages: Option<usize>,
}

struct FrontierState {
    queue: VecDeque<CanonicalUrl>,
    visited: HashSet<CanonicalUrl>,
    in_progress: usize,
    dispatched: usize,
    drained: bool,
}

/// A dequeued URL
///
/// Holding the lease keeps the frontier's in-progress count raised;
/// dropping it releases the slot exactly once, whatever happened to the
/// page, and lets waiting workers re-check for completion.
pub struct FrontierLease<'a> {
    url: CanonicalUrl,
    frontier: &'a Frontier,
}

impl FrontierLease<'_> {
    pub fn url(&self) -> &CanonicalUrl {
        &self.url
    }
}

impl Drop for FrontierLease<'_> {
    fn drop(&mut self) {
        self.frontier.release();
    }
}

impl Frontier {
    pub fn new(max_pages: Option<usize>) -> Self {
        Self {
            state: Mutex::new(FrontierState {
                queue: VecDeque::new(),
                visited: HashSet::new(),
                in_progress: 0,
                dispatched: 0,
                drained: false,
            }),
            wake: Notify::new(),
            max_pages,
        }
    }

    /// Queues the start URL and marks it visited
    pub fn seed(&self, url: CanonicalUrl) {
        {
            let mut state = self.state.lock().unwrap();
            state.visited.insert(url.clone());
            state.queue.push_back(url);
        }
        self.wake.notify_waiters();
    }

    /// Schedules `url` unless it was ever scheduled before.
    ///
    /// The visited check and the insert happen under one lock, so when
    /// several workers discover the same URL at once exactly one of
    /// them sees `true`.
    pub fn try_enqueue(&self, url: &CanonicalUrl) -> bool {
        {
            let mut state = self.state.lock().unwrap();
            if state.drained || !state.visited.insert(url.clone()) {
                return false;
            }
            state.queue.push_back(url.clone());
        }
        self.wake.notify_waiters();
        true
    }

    /// Marks `url` visited without queueing it, returning true when the
    /// entry is new. Used to claim the final URL of a redirect so the
    /// landing page is reported at most once.
    pub fn mark_visited(&self, url: &CanonicalUrl) -> bool {
        self.state.lock().unwrap().visited.insert(url.clone())
    }

    /// The next URL to process, or `None` once the crawl is complete.
    ///
    /// Blocks while the queue is empty but pages are still in progress,
    /// since any of them may enqueue more work. Returns `None` when the
    /// queue is empty with nothing in progress, or once the dispatch
    /// limit is reached.
    pub async fn next_url(&self) -> Option<FrontierLease<'_>> {
        loop {
            // Register for wakeups before checking, so a notify between
            // the check and the await is not lost
            let notified = self.wake.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock().unwrap();
                if state.drained {
                    return None;
                }
                if let Some(limit) = self.max_pages {
                    if state.dispatched >= limit {
                        state.drained = true;
                        drop(state);
                        self.wake.notify_waiters();
                        return None;
                    }
                }
                if let Some(url) = state.queue.pop_front() {
                    state.in_progress += 1;
                    state.dispatched += 1;
                    return Some(FrontierLease {
                        url,
                        frontier: self,
                    });
                }
                if state.in_progress == 0 {
                    state.drained = true;
                    drop(state);
                    self.wake.notify_waiters();
                    return None;
                }
            }

            notified.await;
        }
    }

    /// True when no pending or in-progress work remains
    pub fn is_drained(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.drained || (state.queue.is_empty() && state.in_progress == 0)
    }

    /// How many URLs have been handed to workers
    pub fn dispatched(&self) -> usize {
        self.state.lock().unwrap().dispatched
    }

    /// How many distinct URLs have been scheduled or claimed
    pub fn seen(&self) -> usize {
        self.state.lock().unwrap().visited.len()
    }

    fn release(&self) {
        {
            let mut state = self.state.lock().unwrap();
            state.in_progress -= 1;
            if state.queue.is_empty() && state.in_progress == 0 {
                state.drained = true;
            }
        }
        self.wake.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::{timeout, Duration};

    fn canon(s: &str) -> CanonicalUrl {
        CanonicalUrl::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_seed_then_next() {
        let frontier = Frontier::new(None);
        frontier.seed(canon("https://a.test/"));

        let lease = frontier.next_url().await.unwrap();
        assert_eq!(lease.url().as_str(), "https://a.test");
        assert!(!frontier.is_drained());

        drop(lease);
        assert!(frontier.is_drained());
        assert!(frontier.next_url().await.is_none());
    }

    #[tokio::test]
    async fn test_enqueue_once_per_url() {
        let frontier = Frontier::new(None);
        assert!(frontier.try_enqueue(&canon("https://a.test/page")));
        assert!(!frontier.try_enqueue(&canon("https://a.test/page")));
        // Canonical twins count as the same URL
        assert!(!frontier.try_enqueue(&canon("https://a.test/page/")));
        assert!(!frontier.try_enqueue(&canon("https://a.test/page#top")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_enqueue_single_winner() {
        let frontier = Arc::new(Frontier::new(None));
        let wins = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let frontier = Arc::clone(&frontier);
            let wins = Arc::clone(&wins);
            handles.push(tokio::spawn(async move {
                if frontier.try_enqueue(&canon("https://a.test/contended")) {
                    wins.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(wins.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mark_visited_blocks_enqueue() {
        let frontier = Frontier::new(None);
        assert!(frontier.mark_visited(&canon("https://a.test/landing")));
        assert!(!frontier.mark_visited(&canon("https://a.test/landing")));
        assert!(!frontier.try_enqueue(&canon("https://a.test/landing")));
    }

    #[tokio::test]
    async fn test_waiter_wakes_on_new_work() {
        let frontier = Arc::new(Frontier::new(None));
        frontier.seed(canon("https://a.test/"));
        let lease = frontier.next_url().await.unwrap();

        // Queue is now empty but one page is in progress, so this call
        // must wait rather than give up
        let waiter = tokio::spawn({
            let frontier = Arc::clone(&frontier);
            async move {
                frontier
                    .next_url()
                    .await
                    .map(|lease| lease.url().clone())
            }
        });
        tokio::task::yield_now().await;

        assert!(frontier.try_enqueue(&canon("https://a.test/next")));
        drop(lease);

        let got = timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert_eq!(got.unwrap().as_str(), "https://a.test/next");
    }

    #[tokio::test]
    async fn test_waiter_released_when_last_lease_drops() {
        let frontier = Arc::new(Frontier::new(None));
        frontier.seed(canon("https://a.test/"));
        let lease = frontier.next_url().await.unwrap();

        let waiter = tokio::spawn({
            let frontier = Arc::clone(&frontier);
            async move { frontier.next_url().await.is_none() }
        });
        tokio::task::yield_now().await;

        // No new work arrives; dropping the only lease completes the run
        drop(lease);

        let got_none = timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert!(got_none);
    }

    #[tokio::test]
    async fn test_max_pages_caps_dispatch() {
        let frontier = Frontier::new(Some(2));
        frontier.seed(canon("https://a.test/"));
        assert!(frontier.try_enqueue(&canon("https://a.test/1")));
        assert!(frontier.try_enqueue(&canon("https://a.test/2")));

        let first = frontier.next_url().await.unwrap();
        let second = frontier.next_url().await.unwrap();
        // Work remains queued, but the dispatch budget is spent
        assert!(frontier.next_url().await.is_none());
        assert_eq!(frontier.dispatched(), 2);

        drop(first);
        drop(second);
        assert!(frontier.next_url().await.is_none());
    }

    #[tokio::test]
    async fn test_enqueue_after_drain_is_refused() {
        let frontier = Frontier::new(None);
        frontier.seed(canon("https://a.test/"));
        drop(frontier.next_url().await.unwrap());
        assert!(frontier.next_url().await.is_none());

        assert!(!frontier.try_enqueue(&canon("https://a.test/late")));
    }
}
