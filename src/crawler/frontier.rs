//! Shared crawl frontier
//!
//! The frontier owns the FIFO queue of URLs waiting to be visited, the set of
//! URLs already claimed by a worker, and the count of workers currently holding
//! a claim. All three live under one mutex so that "queue empty and nobody
//! busy" is observed atomically: a worker may only conclude the crawl is over
//! when no sibling can still enqueue more work.
//!
//! Dedup happens at claim time. `enqueue` never checks the claimed set, so a
//! URL may sit in the queue several times; only the first pop claims it.

use crate::url::strip_fragment;
use std::collections::{HashSet, VecDeque};
use std::pin::pin;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use url::Url;

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<Url>,
    claimed: HashSet<String>,
    busy: usize,
}

impl FrontierState {
    fn is_drained(&self) -> bool {
        self.queue.is_empty() && self.busy == 0
    }
}

/// Concurrency-safe URL queue with exactly-once claim semantics
#[derive(Debug)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    changed: Notify,
    shutdown: CancellationToken,
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}

impl Frontier {
    /// Creates an empty frontier with its own shutdown token
    pub fn new() -> Self {
        Self::with_shutdown(CancellationToken::new())
    }

    /// Creates an empty frontier that stops handing out work once `shutdown` fires
    pub fn with_shutdown(shutdown: CancellationToken) -> Self {
        Self {
            state: Mutex::new(FrontierState::default()),
            changed: Notify::new(),
            shutdown,
        }
    }

    /// Appends a URL to the queue, dropping its fragment
    ///
    /// Duplicates are accepted; they are discarded when popped.
    pub fn enqueue(&self, url: Url) {
        let url = strip_fragment(url);
        self.lock().queue.push_back(url);
        self.changed.notify_waiters();
    }

    /// Claims the next unclaimed URL
    ///
    /// Waits while the queue is empty but another worker still holds a claim,
    /// since that worker may enqueue more links. Returns `None` once the queue
    /// is empty with no busy workers, or after shutdown.
    ///
    /// The returned [`Claim`] marks the caller busy until it is dropped.
    pub async fn claim(&self) -> Option<Claim<'_>> {
        loop {
            if self.shutdown.is_cancelled() {
                return None;
            }

            // Register interest before inspecting state so a wakeup between the
            // check and the await is not lost
            let mut changed = pin!(self.changed.notified());
            changed.as_mut().enable();

            {
                let mut state = self.lock();
                while let Some(url) = state.queue.pop_front() {
                    if state.claimed.insert(url.as_str().to_owned()) {
                        state.busy += 1;
                        return Some(Claim {
                            frontier: self,
                            url,
                        });
                    }
                    tracing::trace!("Skipping already claimed {}", url);
                }

                if state.busy == 0 {
                    return None;
                }
            }

            tokio::select! {
                _ = changed => {}
                _ = self.shutdown.cancelled() => return None,
            }
        }
    }

    /// Stops the frontier; pending and future claims return `None`
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Token that fires when the frontier is shut down
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Returns true once shutdown was requested
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Number of queue entries, duplicates included
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Number of distinct URLs claimed so far
    pub fn claimed_count(&self) -> usize {
        self.lock().claimed.len()
    }

    /// Number of claims currently held by workers
    pub fn busy(&self) -> usize {
        self.lock().busy
    }

    /// Returns true if the URL (ignoring its fragment) has been claimed
    pub fn is_claimed(&self, url: &Url) -> bool {
        let url = strip_fragment(url.clone());
        self.lock().claimed.contains(url.as_str())
    }

    /// Returns true if no work is queued and no claim is outstanding
    pub fn is_drained(&self) -> bool {
        self.lock().is_drained()
    }

    fn release(&self) {
        let drained = {
            let mut state = self.lock();
            state.busy -= 1;
            state.is_drained()
        };

        if drained {
            tracing::debug!("Frontier drained");
            self.changed.notify_waiters();
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        // The state is a plain queue and set with no cross-field invariant a
        // panicking holder could break, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A URL owned by exactly one worker
///
/// Dropping the claim marks the worker idle again. Keep it alive until every
/// link discovered from the page has been enqueued.
#[derive(Debug)]
pub struct Claim<'a> {
    frontier: &'a Frontier,
    url: Url,
}

impl Claim<'_> {
    /// The claimed URL
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.frontier.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_empty_frontier_returns_none() {
        let frontier = Frontier::new();
        assert!(frontier.claim().await.is_none());
        assert!(frontier.is_drained());
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let frontier = Frontier::new();
        frontier.enqueue(url("http://host/a"));
        frontier.enqueue(url("http://host/b"));

        let first = frontier.claim().await.unwrap();
        assert_eq!(first.url().as_str(), "http://host/a");
        let second = frontier.claim().await.unwrap();
        assert_eq!(second.url().as_str(), "http://host/b");
    }

    #[tokio::test]
    async fn test_duplicates_claimed_once() {
        let frontier = Frontier::new();
        frontier.enqueue(url("http://host/a"));
        frontier.enqueue(url("http://host/a"));
        frontier.enqueue(url("http://host/b"));

        let a = frontier.claim().await.unwrap();
        let b = frontier.claim().await.unwrap();
        assert_eq!(a.url().as_str(), "http://host/a");
        assert_eq!(b.url().as_str(), "http://host/b");
        drop((a, b));

        assert!(frontier.claim().await.is_none());
        assert_eq!(frontier.claimed_count(), 2);
    }

    #[tokio::test]
    async fn test_fragment_variants_share_identity() {
        let frontier = Frontier::new();
        frontier.enqueue(url("http://host/page#section"));
        frontier.enqueue(url("http://host/page"));

        let claim = frontier.claim().await.unwrap();
        assert_eq!(claim.url().as_str(), "http://host/page");
        drop(claim);

        assert!(frontier.claim().await.is_none());
        assert!(frontier.is_claimed(&url("http://host/page#other")));
        assert_eq!(frontier.claimed_count(), 1);
    }

    #[tokio::test]
    async fn test_reenqueue_after_claim_is_ignored() {
        let frontier = Frontier::new();
        frontier.enqueue(url("http://host/a"));

        let claim = frontier.claim().await.unwrap();
        frontier.enqueue(url("http://host/a"));
        drop(claim);

        assert!(frontier.claim().await.is_none());
        assert_eq!(frontier.pending(), 0);
    }

    #[tokio::test]
    async fn test_busy_tracks_outstanding_claims() {
        let frontier = Frontier::new();
        frontier.enqueue(url("http://host/a"));
        frontier.enqueue(url("http://host/b"));

        let a = frontier.claim().await.unwrap();
        let b = frontier.claim().await.unwrap();
        assert_eq!(frontier.busy(), 2);
        drop(a);
        assert_eq!(frontier.busy(), 1);
        assert!(!frontier.is_drained());
        drop(b);
        assert!(frontier.is_drained());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_claim_waits_for_busy_sibling() {
        let frontier = Arc::new(Frontier::new());
        frontier.enqueue(url("http://host/seed"));

        let seed = frontier.claim().await.unwrap();

        // A second claimer must not give up while the seed is in flight
        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move {
                frontier
                    .claim()
                    .await
                    .map(|claim| claim.url().to_string())
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        frontier.enqueue(url("http://host/child"));
        drop(seed);

        let got = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake up")
            .unwrap();
        assert_eq!(got.as_deref(), Some("http://host/child"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_waiters_released_when_last_claim_drops() {
        let frontier = Arc::new(Frontier::new());
        frontier.enqueue(url("http://host/only"));
        let only = frontier.claim().await.unwrap();

        let mut waiters = Vec::new();
        for _ in 0..3 {
            let frontier = Arc::clone(&frontier);
            waiters.push(tokio::spawn(async move { frontier.claim().await.is_none() }));
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(only);

        for waiter in waiters {
            let empty = tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .expect("waiter should observe the drain")
                .unwrap();
            assert!(empty);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_claims_of_duplicates() {
        for _ in 0..20 {
            let frontier = Arc::new(Frontier::new());
            for _ in 0..32 {
                frontier.enqueue(url("http://host/same"));
            }

            let mut tasks = Vec::new();
            for _ in 0..16 {
                let frontier = Arc::clone(&frontier);
                tasks.push(tokio::spawn(async move {
                    let claim = frontier.claim().await;
                    let got = claim.as_ref().map(|c| c.url().to_string());
                    tokio::task::yield_now().await;
                    drop(claim);
                    got
                }));
            }

            let mut winners = 0;
            for task in tasks {
                match task.await.unwrap() {
                    Some(u) => {
                        assert_eq!(u, "http://host/same");
                        winners += 1;
                    }
                    None => {}
                }
            }
            assert_eq!(winners, 1);
            assert_eq!(frontier.pending(), 0);
        }
    }

    #[tokio::test]
    async fn test_shutdown_releases_waiters() {
        let frontier = Arc::new(Frontier::new());
        frontier.enqueue(url("http://host/a"));
        frontier.enqueue(url("http://host/b"));
        let held = frontier.claim().await.unwrap();

        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move {
                // b is available, but take it first so the next claim must wait
                let b = frontier.claim().await;
                assert!(b.is_some());
                frontier.claim().await.is_none()
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        frontier.shutdown();

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("shutdown should wake waiters")
            .unwrap();
        assert!(result);
        assert!(frontier.is_shut_down());
        drop(held);
    }

    #[tokio::test]
    async fn test_no_claims_after_shutdown() {
        let frontier = Frontier::new();
        frontier.enqueue(url("http://host/a"));
        frontier.shutdown();

        assert!(frontier.claim().await.is_none());
        assert_eq!(frontier.pending(), 1);
    }
}
