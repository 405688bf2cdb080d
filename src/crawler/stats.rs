//! Crawl counters and the final summary
//!
//! Workers share a single [`CrawlCounters`]; increments are atomic and the
//! counts only ever grow. Every [`PROGRESS_INTERVAL`]th fetch emits a progress
//! event.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Fetches between two progress events
pub const PROGRESS_INTERVAL: u64 = 50;

/// Shared, monotonically increasing crawl counters
#[derive(Debug, Default)]
pub struct CrawlCounters {
    fetched: AtomicU64,
    discovered: AtomicU64,
}

impl CrawlCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one fetch attempt and returns the new fetched count
    ///
    /// Emits a progress event when the new count is a multiple of
    /// [`PROGRESS_INTERVAL`].
    pub fn record_fetch(&self) -> u64 {
        let fetched = self.fetched.fetch_add(1, Ordering::Relaxed) + 1;
        if fetched % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                fetched,
                discovered = self.discovered(),
                "Progress: {} pages fetched, {} links discovered",
                fetched,
                self.discovered()
            );
        }
        fetched
    }

    /// Records links that passed the host filter
    pub fn record_discovered(&self, count: u64) {
        self.discovered.fetch_add(count, Ordering::Relaxed);
    }

    /// Fetch attempts so far
    pub fn fetched(&self) -> u64 {
        self.fetched.load(Ordering::Relaxed)
    }

    /// In-scope links discovered so far
    pub fn discovered(&self) -> u64 {
        self.discovered.load(Ordering::Relaxed)
    }
}

/// Final report of a crawl
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSummary {
    /// Fetch attempts, successful or not
    pub fetched: u64,

    /// Links that passed the host filter, duplicates included
    pub discovered: u64,

    /// Distinct URLs claimed by workers
    pub unique_urls: usize,

    /// Queue entries left unprocessed (only after a shutdown)
    pub pending: usize,

    /// Number of workers that ran
    pub workers: usize,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,

    /// Whether the crawl was stopped before draining
    pub cancelled: bool,
}

impl CrawlSummary {
    /// Average fetch throughput
    pub fn pages_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.fetched as f64 / secs
        } else {
            0.0
        }
    }
}
