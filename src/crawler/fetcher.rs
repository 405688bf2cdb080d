//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the identifying user agent
//! - GET requests that follow redirects and report the final URL
//! - Serving and storing responses through the optional response cache

use crate::config::Config;
use crate::crawler::cache::ResponseCache;
use crate::CrawlError;
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Maximum redirect hops followed for a single fetch
const MAX_REDIRECTS: usize = 10;

/// Result of a completed HTTP exchange
///
/// Any status code is a completed exchange; only transport failures are errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// Final URL after redirects; relative links resolve against this
    pub final_url: Url,
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value, if the server sent one
    pub content_type: Option<String>,
    /// Page body, present only for 200 responses with an HTML content type
    pub body: Option<Vec<u8>>,
    /// Whether the response was served from the local cache
    pub from_cache: bool,
}

impl FetchResult {
    /// Returns true for a 200 response that carries a content type
    pub fn is_successful(&self) -> bool {
        self.status_code == StatusCode::OK.as_u16() && self.content_type.is_some()
    }

    /// Returns true if the content type's subtype names HTML (`html`, `xhtml+xml`, `htm`)
    pub fn is_html(&self) -> bool {
        self.content_type.as_deref().map_or(false, is_html_type)
    }

    /// Short provenance label used in log lines
    pub fn source_label(&self) -> &'static str {
        if self.from_cache {
            "cache"
        } else {
            "network"
        }
    }
}

/// Extracts the lowercase subtype from a media type (`text/html; charset=utf-8` → `html`)
pub fn media_subtype(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next()?.trim();
    let (kind, subtype) = essence.split_once('/')?;
    if kind.trim().is_empty() || subtype.trim().is_empty() {
        return None;
    }
    Some(subtype.trim().to_ascii_lowercase())
}

/// Returns true if a Content-Type header value names an HTML document
pub fn is_html_type(content_type: &str) -> bool {
    media_subtype(content_type).map_or(false, |subtype| subtype.contains("htm"))
}

/// A source of pages for the crawler
///
/// The worker pool only depends on this trait, so the HTTP transport can be
/// swapped out (tests use in-memory link graphs).
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetches a URL, returning the completed exchange or a transport error
    async fn fetch(&self, url: &Url) -> Result<FetchResult, CrawlError>;
}

/// Builds an HTTP client with the configured identifying header
///
/// # Arguments
///
/// * `user_agent` - Literal `User-Agent` value sent with every request
/// * `timeout` - Whole-request timeout
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher backed by reqwest, with an optional on-disk response cache
pub struct HttpFetcher {
    client: Client,
    cache: Option<ResponseCache>,
}

impl HttpFetcher {
    /// Creates a fetcher from an already-built client
    pub fn new(client: Client, cache: Option<ResponseCache>) -> Self {
        Self { client, cache }
    }

    /// Builds the client and opens the cache described by the configuration
    pub async fn from_config(config: &Config) -> Result<Self, CrawlError> {
        let client = build_http_client(
            &config.user_agent.value,
            Duration::from_secs(config.crawler.request_timeout_secs),
        )?;

        let cache = match &config.cache {
            Some(cache_config) => Some(
                ResponseCache::open(&cache_config.directory, cache_config.max_bytes).await?,
            ),
            None => None,
        };

        Ok(Self::new(client, cache))
    }

    /// The response cache, if one is configured
    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    /// Performs the network request, skipping the cache
    pub async fn fetch_network(&self, url: &Url) -> Result<FetchResult, CrawlError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| CrawlError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Only HTML pages are ever parsed; other bodies are left unread
        let wants_body = status == StatusCode::OK
            && content_type.as_deref().map_or(false, is_html_type);
        let body = if wants_body {
            let bytes = response.bytes().await.map_err(|source| CrawlError::Http {
                url: url.to_string(),
                source,
            })?;
            Some(bytes.to_vec())
        } else {
            None
        };

        Ok(FetchResult {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
            from_cache: false,
        })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchResult, CrawlError> {
        if let Some(cache) = &self.cache {
            match cache.get(url).await {
                Ok(Some(hit)) => return Ok(hit),
                Ok(None) => {}
                Err(e) => tracing::warn!("Response cache read failed for {}: {}", url, e),
            }
        }

        let result = self.fetch_network(url).await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(url, &result).await {
                tracing::warn!("Response cache write failed for {}: {}", url, e);
            }
        }

        Ok(result)
    }
}
