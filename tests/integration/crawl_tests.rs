//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! fetch → parse → filter → enqueue cycle end-to-end.

use fence_crawl::config::{CacheConfig, Config, CrawlerConfig, UserAgentConfig};
use fence_crawl::crawler::{Coordinator, Fetch, HttpFetcher, ResponseCache};
use fence_crawl::url::HostMatch;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_AGENT: &str = "NIR2019S-201630598879";

/// Creates a test configuration crawling the mock server
fn create_test_config(seed: String, workers: u32, cache: Option<CacheConfig>) -> Config {
    Config {
        crawler: CrawlerConfig {
            seed_url: seed,
            domain_suffix: "127.0.0.1".to_string(),
            worker_count: workers,
            host_match: HostMatch::Contains,
            request_timeout_secs: 5,
        },
        user_agent: UserAgentConfig {
            value: USER_AGENT.to_string(),
        },
        cache,
    }
}

/// HTML response linking to the given hrefs
fn html_page(hrefs: &[&str]) -> ResponseTemplate {
    let links: String = hrefs
        .iter()
        .map(|href| format!("<a href=\"{}\">{}</a>\n", href, href))
        .collect();
    let body = format!("<html><head><title>Test</title></head><body>{}</body></html>", links);
    ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html; charset=utf-8")
}

/// Mounts a GET mock expected to be hit exactly `times` times
async fn mount_page(server: &MockServer, route: &str, response: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_full_crawl_visits_each_page_once() {
    let server = MockServer::start().await;

    mount_page(&server, "/", html_page(&["/a", "/b#frag", "/doc.pdf"]), 1).await;
    mount_page(&server, "/a", html_page(&["/b", "/c", "/"]), 1).await;
    mount_page(&server, "/b", html_page(&[]), 1).await;
    mount_page(&server, "/c", html_page(&["/missing"]), 1).await;
    mount_page(
        &server,
        "/doc.pdf",
        ResponseTemplate::new(200)
            .set_body_raw(b"%PDF-1.4 <a href=\"/hidden\">".to_vec(), "application/pdf"),
        1,
    )
    .await;
    mount_page(&server, "/missing", ResponseTemplate::new(404), 1).await;
    mount_page(&server, "/hidden", html_page(&[]), 0).await;

    let config = create_test_config(format!("{}/", server.uri()), 3, None);
    let coordinator = Coordinator::new(config)
        .await
        .expect("Failed to create coordinator");

    let summary = coordinator.run().await.expect("Crawl failed");

    // /, /a, /b, /c, /doc.pdf, /missing
    assert_eq!(summary.fetched, 6);
    assert_eq!(summary.unique_urls, 6);
    // / → 3, /a → 3, /c → 1
    assert_eq!(summary.discovered, 7);
    assert_eq!(summary.pending, 0);
    assert!(!summary.cancelled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_identifying_header_is_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(html_page(&[]))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(format!("{}/", server.uri()), 1, None);
    let summary = Coordinator::new(config).await.unwrap().run().await.unwrap();

    assert_eq!(summary.fetched, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_links_resolve_against_redirect_target() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/old",
        ResponseTemplate::new(301).insert_header("Location", "/new/"),
        1,
    )
    .await;
    mount_page(&server, "/new/", html_page(&["child"]), 1).await;
    mount_page(&server, "/new/child", html_page(&[]), 1).await;
    mount_page(&server, "/child", html_page(&[]), 0).await;

    let config = create_test_config(format!("{}/old", server.uri()), 2, None);
    let summary = Coordinator::new(config).await.unwrap().run().await.unwrap();

    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.discovered, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_out_of_scope_hosts_not_fetched() {
    let server = MockServer::start().await;
    let port = server.address().port();

    // Same server, but reached through a host that does not match the suffix
    let foreign = format!("http://localhost:{}/foreign", port);
    mount_page(&server, "/", html_page(&[foreign.as_str(), "/local"]), 1).await;
    mount_page(&server, "/local", html_page(&[]), 1).await;
    mount_page(&server, "/foreign", html_page(&[]), 0).await;

    let config = create_test_config(format!("{}/", server.uri()), 2, None);
    let summary = Coordinator::new(config).await.unwrap().run().await.unwrap();

    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.discovered, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_second_crawl_served_from_cache() {
    let server = MockServer::start().await;
    let cache_dir = TempDir::new().unwrap();

    // Each page may hit the network only once across both crawls
    mount_page(&server, "/", html_page(&["/a", "/b"]), 1).await;
    mount_page(&server, "/a", html_page(&["/b"]), 1).await;
    mount_page(&server, "/b", html_page(&[]), 1).await;

    let cache = || {
        Some(CacheConfig {
            directory: cache_dir.path().to_string_lossy().into_owned(),
            max_bytes: 10 * 1024 * 1024,
        })
    };

    let first = Coordinator::new(create_test_config(format!("{}/", server.uri()), 2, cache()))
        .await
        .unwrap()
        .run()
        .await
        .unwrap();
    let second = Coordinator::new(create_test_config(format!("{}/", server.uri()), 2, cache()))
        .await
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(first.fetched, 3);
    assert_eq!(second.fetched, first.fetched);
    assert_eq!(second.discovered, first.discovered);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_http_fetcher_reports_cache_provenance() {
    let server = MockServer::start().await;
    let cache_dir = TempDir::new().unwrap();
    mount_page(&server, "/page", html_page(&["/x"]), 1).await;

    let client = fence_crawl::crawler::build_http_client(
        USER_AGENT,
        std::time::Duration::from_secs(5),
    )
    .unwrap();
    let cache = ResponseCache::open(cache_dir.path(), 1024 * 1024).await.unwrap();
    let fetcher = HttpFetcher::new(client, Some(cache));

    let url = url::Url::parse(&format!("{}/page", server.uri())).unwrap();
    let network = fetcher.fetch(&url).await.unwrap();
    let cached = fetcher.fetch(&url).await.unwrap();

    assert!(!network.from_cache);
    assert!(cached.from_cache);
    assert_eq!(network.body, cached.body);
    assert!(cached.is_html());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_binary_download_neither_buffered_nor_cached() {
    let server = MockServer::start().await;
    let cache_dir = TempDir::new().unwrap();
    mount_page(
        &server,
        "/archive.bin",
        ResponseTemplate::new(200)
            .set_body_raw(vec![0u8; 2 * 1024 * 1024], "application/octet-stream"),
        2,
    )
    .await;

    let client = fence_crawl::crawler::build_http_client(
        USER_AGENT,
        std::time::Duration::from_secs(5),
    )
    .unwrap();
    let cache = ResponseCache::open(cache_dir.path(), 1024 * 1024).await.unwrap();
    let fetcher = HttpFetcher::new(client, Some(cache));

    let url = url::Url::parse(&format!("{}/archive.bin", server.uri())).unwrap();
    let first = fetcher.fetch(&url).await.unwrap();
    let second = fetcher.fetch(&url).await.unwrap();

    assert_eq!(first.status_code, 200);
    assert_eq!(first.body, None);
    assert!(!first.is_html());
    assert!(!second.from_cache);

    let cache = fetcher.cache().unwrap();
    assert_eq!(cache.usage(), 0);
    assert!(cache.is_empty().await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unreachable_seed_completes_with_one_fetch() {
    // Bind and release a port so nothing is listening on it
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let config = create_test_config(format!("http://127.0.0.1:{}/", port), 2, None);
    let summary = Coordinator::new(config).await.unwrap().run().await.unwrap();

    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.discovered, 0);
    assert!(!summary.cancelled);
}
