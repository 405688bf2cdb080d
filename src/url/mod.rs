//! URL handling module for Fence-Crawl
//!
//! This module provides URL normalization, host extraction and the host
//! filter that decides whether a discovered link stays inside the crawl.

mod filter;
mod host;
mod normalize;

// Re-export main functions
pub use filter::{accept, HostFilter, HostMatch};
pub use host::extract_host;
pub use normalize::{normalize_url, strip_fragment};
