//! End-to-end crawl tests
//!
//! These tests run the full crawl cycle against wiremock HTTP servers:
//! page discovery through links, deduplication, depth and page limits,
//! and the robots.txt gate.

use searchlight::config::CrawlerConfig;
use searchlight::crawler::{CrawlEngine, CrawlEvent};
use searchlight::storage::{SessionStatus, Store};
use std::sync::Arc;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> CrawlerConfig {
    CrawlerConfig {
        thread_pool_size: 4,
        max_pages: 50,
        default_depth: 2,
        request_timeout_ms: 5_000,
        politeness_delay_ms: 10, // very short for testing
        user_agent: "SearchlightTest/1.0".to_string(),
        respect_robots: true,
        same_origin_only: false,
    }
}

fn html_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.to_string())
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_response(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_discovers_linked_pages() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
            <a href="/page1">Page 1</a>
            <a href="/page2">Page 2</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/page1",
        r#"<html><head><title>Page 1</title></head><body>Content one <a href="/">home</a></body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/page2",
        r#"<html><head><title>Page 2</title></head><body>Content two</body></html>"#,
    )
    .await;

    let store = Arc::new(Store::open_in_memory().unwrap());
    let engine = CrawlEngine::new(Arc::clone(&store), test_config(), None).unwrap();

    let outcome = engine.crawl(&base, Some(2)).await.unwrap();

    assert_eq!(outcome.status, SessionStatus::Completed);
    assert_eq!(outcome.pages_crawled, 3);
    assert_eq!(store.count_pages().unwrap(), 3);

    // Pages are stored under their canonical URLs
    let home = store.get_page_by_url(&format!("{}/", base)).unwrap().unwrap();
    assert_eq!(home.title, "Home");
    assert_eq!(home.depth, 0);

    let page1 = store
        .get_page_by_url(&format!("{}/page1", base))
        .unwrap()
        .unwrap();
    assert_eq!(page1.depth, 1);
    assert!(page1.body.contains("Content one"));

    // The session row reflects the outcome
    let session = store.get_session(outcome.session_id).unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.pages_crawled, 3);
    assert!(session.ended_at.is_some());
}

#[tokio::test]
async fn test_duplicate_link_forms_crawled_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    // Three spellings of the same target URL
    mount_page(
        &server,
        "/",
        r#"<html><body>
            <a href="/dup">a</a>
            <a href="/dup#section">b</a>
            <a href="/dup/">c</a>
        </body></html>"#,
    )
    .await;
    mount_page(&server, "/dup", "<html><body>dup body</body></html>").await;

    let store = Arc::new(Store::open_in_memory().unwrap());
    let engine = CrawlEngine::new(Arc::clone(&store), test_config(), None).unwrap();
    let outcome = engine.crawl(&base, Some(1)).await.unwrap();

    assert_eq!(outcome.pages_crawled, 2);
    assert_eq!(store.count_pages().unwrap(), 2);
}

#[tokio::test]
async fn test_depth_limit_stops_link_following() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", r#"<html><body><a href="/a">a</a></body></html>"#).await;
    mount_page(&server, "/a", r#"<html><body><a href="/b">b</a></body></html>"#).await;
    mount_page(&server, "/b", "<html><body>too deep</body></html>").await;

    let store = Arc::new(Store::open_in_memory().unwrap());
    let engine = CrawlEngine::new(Arc::clone(&store), test_config(), None).unwrap();
    let outcome = engine.crawl(&base, Some(1)).await.unwrap();

    // Depth 1 reaches /a but must not follow its links
    assert_eq!(outcome.pages_crawled, 2);
    assert!(store
        .get_page_by_url(&format!("{}/b", base))
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_max_pages_stops_session() {
    let server = MockServer::start().await;
    let base = server.uri();

    let links: String = (0..20)
        .map(|i| format!(r#"<a href="/p{}">p{}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", &format!("<html><body>{}</body></html>", links)).await;
    for i in 0..20 {
        mount_page(
            &server,
            &format!("/p{}", i),
            &format!("<html><body>page {}</body></html>", i),
        )
        .await;
    }

    let config = CrawlerConfig {
        max_pages: 3,
        thread_pool_size: 2,
        ..test_config()
    };
    let store = Arc::new(Store::open_in_memory().unwrap());
    let engine = CrawlEngine::new(Arc::clone(&store), config, None).unwrap();
    let outcome = engine.crawl(&base, Some(2)).await.unwrap();

    assert_eq!(outcome.status, SessionStatus::Stopped);
    // A worker already mid-fetch when the cap hits may land one extra page
    assert!(
        outcome.pages_crawled >= 3 && outcome.pages_crawled <= 4,
        "expected 3-4 pages, got {}",
        outcome.pages_crawled
    );
    assert_eq!(store.count_pages().unwrap() as usize, outcome.pages_crawled);

    let session = store.get_session(outcome.session_id).unwrap().unwrap();
    assert_eq!(session.status, SessionStatus::Stopped);
}

#[tokio::test]
async fn test_robots_disallow_skips_and_never_persists() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
        )
        .mount(&server)
        .await;

    mount_page(
        &server,
        "/",
        r#"<html><body>
            <a href="/private/secret">secret</a>
            <a href="/public">public</a>
        </body></html>"#,
    )
    .await;
    mount_page(&server, "/public", "<html><body>public body</body></html>").await;
    mount_page(&server, "/private/secret", "<html><body>must not appear</body></html>").await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let store = Arc::new(Store::open_in_memory().unwrap());
    let engine = CrawlEngine::new(Arc::clone(&store), test_config(), Some(tx)).unwrap();
    let outcome = engine.crawl(&base, Some(2)).await.unwrap();
    drop(engine);

    // The disallowed URL is skipped, never fetched, never stored
    assert!(store
        .get_page_by_url(&format!("{}/private/secret", base))
        .unwrap()
        .is_none());
    assert!(store
        .get_page_by_url(&format!("{}/public", base))
        .unwrap()
        .is_some());
    assert_eq!(outcome.pages_crawled, 2);

    let mut saw_skip = false;
    while let Ok(event) = rx.try_recv() {
        if let CrawlEvent::PageSkipped { url, reason } = event {
            assert!(url.contains("/private"));
            assert!(reason.contains("robots"));
            saw_skip = true;
        }
    }
    assert!(saw_skip, "expected a skipped event for the private URL");
}

#[tokio::test]
async fn test_robots_ignored_when_respect_disabled() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .mount(&server)
        .await;

    mount_page(&server, "/", "<html><body>everything allowed</body></html>").await;

    let config = CrawlerConfig {
        respect_robots: false,
        ..test_config()
    };
    let store = Arc::new(Store::open_in_memory().unwrap());
    let engine = CrawlEngine::new(Arc::clone(&store), config, None).unwrap();
    let outcome = engine.crawl(&base, Some(1)).await.unwrap();

    assert_eq!(outcome.pages_crawled, 1);
}

#[tokio::test]
async fn test_fetch_errors_do_not_stop_session() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><body>
            <a href="/missing">missing</a>
            <a href="/ok">ok</a>
        </body></html>"#,
    )
    .await;
    mount_page(&server, "/ok", "<html><body>fine</body></html>").await;
    // /missing is not mocked and returns 404

    let (tx, mut rx) = mpsc::unbounded_channel();
    let store = Arc::new(Store::open_in_memory().unwrap());
    let engine = CrawlEngine::new(Arc::clone(&store), test_config(), Some(tx)).unwrap();
    let outcome = engine.crawl(&base, Some(1)).await.unwrap();
    drop(engine);

    assert_eq!(outcome.status, SessionStatus::Completed);
    assert_eq!(outcome.pages_crawled, 2);

    let mut saw_error = false;
    while let Ok(event) = rx.try_recv() {
        if let CrawlEvent::PageError { url, .. } = event {
            assert!(url.contains("/missing"));
            saw_error = true;
        }
    }
    assert!(saw_error, "expected an error event for the missing URL");
}

#[tokio::test]
async fn test_non_html_content_is_an_error_not_a_page() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/data">data</a></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{\"not\": \"html\"}")
                .insert_header("content-type", "application/json"),
        )
        .mount(&server)
        .await;

    let store = Arc::new(Store::open_in_memory().unwrap());
    let engine = CrawlEngine::new(Arc::clone(&store), test_config(), None).unwrap();
    let outcome = engine.crawl(&base, Some(1)).await.unwrap();

    assert_eq!(outcome.pages_crawled, 1);
    assert!(store
        .get_page_by_url(&format!("{}/data", base))
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_invalid_seed_is_rejected() {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let engine = CrawlEngine::new(Arc::clone(&store), test_config(), None).unwrap();

    assert!(engine.crawl("mailto:someone@example.com", None).await.is_err());
    assert_eq!(store.count_pages().unwrap(), 0);
}
