//! HTML parser for extracting links
//!
//! Every `<a href>` on a page is resolved against the page's final URL. Links
//! that do not resolve to an HTTP(S) URL (`javascript:`, `mailto:`, `tel:`,
//! `data:`, unparsable references) are dropped. Fragments are removed, so a
//! same-page anchor resolves to the page itself.

use crate::url::strip_fragment;
use scraper::{Html, Selector};
use url::Url;

/// Extracts every HTTP(S) link on a page, in document order
///
/// Parsing is best-effort: malformed markup yields whatever the HTML5 parser
/// recovers, possibly no links at all. Non-UTF-8 bytes are replaced.
///
/// # Example
///
/// ```
/// use fence_crawl::crawler::extract_links;
/// use url::Url;
///
/// let html = br#"<html><body><a href="/page#top">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, &base_url);
/// assert_eq!(links[0].as_str(), "https://example.com/page");
/// ```
pub fn extract_links(body: &[u8], base_url: &Url) -> Vec<Url> {
    let html = String::from_utf8_lossy(body);
    let document = Html::parse_document(&html);
    extract_anchor_links(&document, base_url)
}

fn extract_anchor_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves an href against the base URL
///
/// Returns None unless the result is an HTTP(S) URL.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let absolute = base_url.join(href.trim()).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(strip_fragment(absolute)),
        _ => None,
    }
}
