//! Crawler coordinator - main crawl orchestration logic
//!
//! This module wires the crawl together:
//! - Building the fetcher (HTTP client and response cache) from configuration
//! - Seeding the frontier
//! - Spawning the worker pool and waiting for it to drain
//! - Exposing a shutdown hook and reporting final counts

use crate::config::{validate, Config};
use crate::crawler::fetcher::{Fetch, HttpFetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::stats::{CrawlCounters, CrawlSummary};
use crate::crawler::worker::Worker;
use crate::url::{normalize_url, HostFilter};
use crate::CrawlError;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Main crawler coordinator structure
pub struct Coordinator {
    seed: Url,
    worker_count: usize,
    fetcher: Arc<dyn Fetch>,
    filter: Arc<HostFilter>,
    shutdown: CancellationToken,
}

impl Coordinator {
    /// Creates a coordinator that fetches over HTTP
    ///
    /// Builds the HTTP client and opens the response cache, if configured.
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to crawl
    /// * `Err(CrawlError)` - Invalid configuration, client or cache setup failed
    pub async fn new(config: Config) -> Result<Self, CrawlError> {
        // Nothing touches the network or the cache directory before this passes
        validate(&config)?;
        let fetcher = HttpFetcher::from_config(&config).await?;
        if let Some(cache) = fetcher.cache() {
            tracing::info!("Using response cache at {}", cache.directory().display());
        }
        Self::assemble(config, Arc::new(fetcher))
    }

    /// Creates a coordinator around any page source
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetch>) -> Result<Self, CrawlError> {
        validate(&config)?;
        Self::assemble(config, fetcher)
    }

    /// Builds the coordinator from an already-validated configuration
    fn assemble(config: Config, fetcher: Arc<dyn Fetch>) -> Result<Self, CrawlError> {
        let seed = normalize_url(&config.crawler.seed_url)?;
        let filter = HostFilter::new(&config.crawler.domain_suffix, config.crawler.host_match);
        if !filter.accepts(&seed) {
            // The seed is always fetched; only its links are filtered
            tracing::warn!(
                "Seed {} is outside domain suffix '{}'",
                seed,
                filter.suffix()
            );
        }

        Ok(Self {
            seed,
            worker_count: config.crawler.worker_count as usize,
            fetcher,
            filter: Arc::new(filter),
            shutdown: CancellationToken::new(),
        })
    }

    /// Token that stops the crawl when cancelled
    ///
    /// Workers stop claiming new URLs and abandon in-flight fetches.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// The normalized seed URL
    pub fn seed(&self) -> &Url {
        &self.seed
    }

    /// Runs the crawl until the frontier drains or shutdown is requested
    pub async fn run(&self) -> Result<CrawlSummary, CrawlError> {
        let start_time = Instant::now();
        let frontier = Arc::new(Frontier::with_shutdown(self.shutdown.clone()));
        let counters = Arc::new(CrawlCounters::new());

        tracing::info!(
            "Starting crawl from {} with {} workers (domain suffix '{}', {:?} match)",
            self.seed,
            self.worker_count,
            self.filter.suffix(),
            self.filter.mode()
        );
        frontier.enqueue(self.seed.clone());

        let mut workers = JoinSet::new();
        for id in 0..self.worker_count {
            let worker = Worker::new(
                id,
                Arc::clone(&frontier),
                Arc::clone(&self.fetcher),
                Arc::clone(&counters),
                Arc::clone(&self.filter),
            );
            workers.spawn(worker.run());
        }

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(report) => {
                    tracing::debug!("Worker {} processed {} pages", report.id, report.pages)
                }
                // A panicking worker released its claim while unwinding
                Err(e) => tracing::error!("Worker task failed: {}", e),
            }
        }

        let summary = CrawlSummary {
            fetched: counters.fetched(),
            discovered: counters.discovered(),
            unique_urls: frontier.claimed_count(),
            pending: frontier.pending(),
            workers: self.worker_count,
            elapsed: start_time.elapsed(),
            cancelled: frontier.is_shut_down(),
        };

        if summary.cancelled {
            tracing::warn!(
                "Crawl stopped early: {} pages fetched, {} URLs left in queue",
                summary.fetched,
                summary.pending
            );
        } else {
            tracing::info!(
                "Crawl completed: {} pages fetched, {} links discovered in {:?}",
                summary.fetched,
                summary.discovered,
                summary.elapsed
            );
        }

        Ok(summary)
    }
}

/// Convenience entry point for running a complete crawl
///
/// # Example
///
/// ```no_run
/// use fence_crawl::config::load_config;
/// use fence_crawl::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("crawl.toml"))?;
/// let summary = run_crawl(config).await?;
/// println!("{} pages fetched", summary.fetched);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlSummary, CrawlError> {
    Coordinator::new(config).await?.run().await
}
