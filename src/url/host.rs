use url::Url;

/// Extracts the host from a URL
///
/// The host is lowercased. Ports are not part of the host. Returns `None` for
/// URLs without a host (`data:`, `mailto:` and the like).
///
/// # Examples
///
/// ```
/// use url::Url;
/// use fence_crawl::url::extract_host;
///
/// let url = Url::parse("https://WWW2.SCUT.EDU.CN/gzic/").unwrap();
/// assert_eq!(extract_host(&url), Some("www2.scut.edu.cn".to_string()));
///
/// let url = Url::parse("mailto:someone@example.com").unwrap();
/// assert_eq!(extract_host(&url), None);
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
