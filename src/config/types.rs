use crate::url::HostMatch;
use serde::Deserialize;

/// Main configuration structure for Fence-Crawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub cache: Option<CacheConfig>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// URL the crawl starts from
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// Host fragment that discovered links must match to be followed
    #[serde(rename = "domain-suffix")]
    pub domain_suffix: String,

    /// Number of workers draining the frontier
    #[serde(rename = "worker-count")]
    pub worker_count: u32,

    /// How the domain suffix is matched against link hosts
    #[serde(rename = "host-match", default)]
    pub host_match: HostMatch,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

/// Identifying header sent with every request
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Literal `User-Agent` header value
    pub value: String,
}

/// On-disk response cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Directory holding cached responses
    pub directory: String,

    /// Upper bound on the total size of cached entries (bytes)
    #[serde(rename = "max-bytes", default = "default_cache_max_bytes")]
    pub max_bytes: u64,
}

fn default_cache_max_bytes() -> u64 {
    100 * 1024 * 1024
}
