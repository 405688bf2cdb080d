use crate::UrlError;
use url::Url;

/// Normalizes a URL into the form used as frontier identity
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an `http` or `https` scheme
/// 3. Require a host
/// 4. Remove the fragment (everything after `#`)
///
/// Host case and dot segments are already normalized by the URL parser. The
/// scheme, path and query are otherwise left exactly as the server will see
/// them.
///
/// # Examples
///
/// ```
/// use fence_crawl::url::normalize_url;
///
/// let url = normalize_url("http://WWW2.SCUT.EDU.CN/gzic/./index.htm#top").unwrap();
/// assert_eq!(url.as_str(), "http://www2.scut.edu.cn/gzic/index.htm");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(strip_fragment(url))
}

/// Drops the fragment identifier, leaving everything else untouched
pub fn strip_fragment(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}
