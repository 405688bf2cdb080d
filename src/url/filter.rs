use crate::url::extract_host;
use serde::Deserialize;
use url::Url;

/// How a domain suffix is matched against a link's host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostMatch {
    /// The host contains the suffix anywhere (literal substring match)
    #[default]
    Contains,
    /// The host equals the suffix or ends with `.` + suffix
    Suffix,
}

/// Checks whether a URL is inside the crawl boundary
///
/// Returns true iff the URL's host contains `domain_suffix`. Only the host is
/// examined, so a path that happens to mention the suffix does not count.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use fence_crawl::url::accept;
///
/// let inside = Url::parse("http://sub.scut.edu.cn/x").unwrap();
/// let outside = Url::parse("http://evil.com/scut.edu.cn").unwrap();
///
/// assert!(accept(&inside, "scut.edu.cn"));
/// assert!(!accept(&outside, "scut.edu.cn"));
/// ```
pub fn accept(url: &Url, domain_suffix: &str) -> bool {
    HostFilter::new(domain_suffix, HostMatch::Contains).accepts(url)
}

/// Host filter bound to a configured suffix and match policy
#[derive(Debug, Clone)]
pub struct HostFilter {
    suffix: String,
    mode: HostMatch,
}

impl HostFilter {
    /// Creates a filter; the suffix is compared case-insensitively
    pub fn new(suffix: &str, mode: HostMatch) -> Self {
        Self {
            suffix: suffix.to_lowercase(),
            mode,
        }
    }

    /// The lowercased suffix this filter matches against
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// The match policy in effect
    pub fn mode(&self) -> HostMatch {
        self.mode
    }

    /// Returns true if the URL's host is in scope
    pub fn accepts(&self, url: &Url) -> bool {
        match extract_host(url) {
            Some(host) => self.matches_host(&host),
            None => false,
        }
    }

    /// Matches a bare (lowercase) host
    pub fn matches_host(&self, host: &str) -> bool {
        match self.mode {
            HostMatch::Contains => host.contains(&self.suffix),
            HostMatch::Suffix => {
                let base = self.suffix.trim_start_matches('.');
                host == base || host.ends_with(&format!(".{}", base))
            }
        }
    }
}
