//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with an optional on-disk response cache
//! - HTML parsing and link extraction
//! - The shared frontier with exactly-once claims
//! - The worker pool and overall crawl coordination

mod cache;
mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod stats;
mod worker;

pub use cache::ResponseCache;
pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{
    build_http_client, is_html_type, media_subtype, Fetch, FetchResult, HttpFetcher,
};
pub use frontier::{Claim, Frontier};
pub use parser::extract_links;
pub use stats::{CrawlCounters, CrawlSummary, PROGRESS_INTERVAL};
pub use worker::{PageOutcome, Worker, WorkerReport};
