//! Crawl worker
//!
//! A worker repeatedly claims a URL from the frontier, fetches it, extracts
//! in-scope links from HTML pages and feeds them back into the frontier. Page
//! failures are logged and never stop the loop; a failed URL is not retried.

use crate::crawler::fetcher::Fetch;
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::extract_links;
use crate::crawler::stats::CrawlCounters;
use crate::url::HostFilter;
use std::sync::Arc;
use tracing::Instrument;
use url::Url;

/// What happened to a single claimed URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// HTML page; `extracted` links found, `enqueued` passed the host filter
    Crawled { extracted: usize, enqueued: usize },
    /// Status other than 200, or no content type
    Unsuccessful { status_code: u16 },
    /// 200 response that is not HTML
    NotHtml { content_type: String },
    /// The request failed at the network/IO layer
    TransportError { error: String },
    /// Shutdown was requested while the fetch was in flight
    Cancelled,
}

/// Summary of one worker's run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub id: usize,
    pub pages: u64,
}

/// One member of the worker pool
pub struct Worker {
    id: usize,
    frontier: Arc<Frontier>,
    fetcher: Arc<dyn Fetch>,
    counters: Arc<CrawlCounters>,
    filter: Arc<HostFilter>,
}

impl Worker {
    pub fn new(
        id: usize,
        frontier: Arc<Frontier>,
        fetcher: Arc<dyn Fetch>,
        counters: Arc<CrawlCounters>,
        filter: Arc<HostFilter>,
    ) -> Self {
        Self {
            id,
            frontier,
            fetcher,
            counters,
            filter,
        }
    }

    /// Drains the frontier until it is empty or shut down
    pub async fn run(self) -> WorkerReport {
        tracing::debug!(worker = self.id, "Worker started");
        let mut pages = 0;

        while let Some(claim) = self.frontier.claim().await {
            let span = tracing::info_span!("page", worker = self.id, url = %claim.url());
            let outcome = self.process(claim.url()).instrument(span).await;

            // The claim is released only after the page's links are enqueued
            drop(claim);

            if outcome == PageOutcome::Cancelled {
                break;
            }
            pages += 1;
        }

        tracing::debug!(worker = self.id, pages, "Worker finished");
        WorkerReport { id: self.id, pages }
    }

    /// Fetches one URL and enqueues the in-scope links it contains
    pub async fn process(&self, url: &Url) -> PageOutcome {
        self.counters.record_fetch();

        let fetched = tokio::select! {
            biased;
            _ = self.frontier.shutdown_token().cancelled() => return PageOutcome::Cancelled,
            result = self.fetcher.fetch(url) => result,
        };

        let page = match fetched {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Exception: {} {}", url, e);
                return PageOutcome::TransportError {
                    error: e.to_string(),
                };
            }
        };

        if !page.is_successful() {
            tracing::info!(
                "{} - Error (status: {}, {})",
                url,
                page.status_code,
                page.source_label()
            );
            return PageOutcome::Unsuccessful {
                status_code: page.status_code,
            };
        }
        tracing::info!("{} - Successful ({})", url, page.source_label());

        if !page.is_html() {
            let content_type = page.content_type.unwrap_or_default();
            tracing::debug!("Skipping non-HTML content: {}", content_type);
            return PageOutcome::NotHtml { content_type };
        }

        // Relative links resolve against where the redirects ended
        let body = page.body.as_deref().unwrap_or_default();
        let links = extract_links(body, &page.final_url);
        let extracted = links.len();

        let mut enqueued = 0;
        for link in links {
            if self.filter.accepts(&link) {
                self.frontier.enqueue(link);
                enqueued += 1;
            } else {
                tracing::trace!("Out of scope: {}", link);
            }
        }
        self.counters.record_discovered(enqueued as u64);

        tracing::debug!(extracted, enqueued, "Links extracted");
        PageOutcome::Crawled {
            extracted,
            enqueued,
        }
    }
}
