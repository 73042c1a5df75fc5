//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use sitesift::config::Config;
use sitesift::crawler::{crawl_blocking, Crawler};
use sitesift::output::summarize;
use sitesift::storage::{open_store, ContentStore};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with fast retries
fn create_test_config(max_depth: u32) -> Config {
    let mut config = Config::default();
    config.crawler.max_depth = max_depth;
    config.crawler.max_concurrent_pages = 4;
    config.crawler.retry_limit = 2;
    config.crawler.backoff_base_ms = 5;
    config.crawler.backoff_max_ms = 20;
    config.crawler.request_timeout_secs = 5;
    config.crawler.worker_threads = 2;
    config
}

/// Serves `body` as HTML at `route`, expecting exactly `times` requests
async fn mount_page(server: &MockServer, route: &str, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_link_graph_fetches_each_page_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    // A -> B, C; B -> A, D; D -> E (depth 3, never fetched)
    mount_page(
        &server,
        "/",
        format!(
            r#"<html><body>
            <a href="{base}/b">B</a> <a href="{base}/c">C</a>
            <h1>Page A</h1><p>Welcome home.</p>
            </body></html>"#
        ),
        1,
    )
    .await;
    mount_page(
        &server,
        "/b",
        r#"<html><body>
        <a href="/">Home</a> <a href="/d">D</a>
        <h2>Page B</h2><p>About us.</p>
        </body></html>"#
            .to_string(),
        1,
    )
    .await;
    mount_page(
        &server,
        "/c",
        "<html><body><h2>Page C</h2><p>Careers.</p></body></html>".to_string(),
        1,
    )
    .await;
    mount_page(
        &server,
        "/d",
        r#"<html><body><a href="/e">E</a><h2>Page D</h2><p>Deep.</p></body></html>"#
            .to_string(),
        1,
    )
    .await;
    mount_page(&server, "/e", "<h2>Page E</h2><p>Too deep.</p>".to_string(), 0).await;

    let crawler = Crawler::new(create_test_config(2)).unwrap();
    let report = crawler.run(&format!("{}/", base)).await.unwrap();

    assert!(report.contents.contains(&"Page A:\nWelcome home.".to_string()));
    assert!(report.contents.contains(&"Page B:\nAbout us.".to_string()));
    assert!(report.contents.contains(&"Page C:\nCareers.".to_string()));
    assert!(report.contents.contains(&"Page D:\nDeep.".to_string()));
    assert!(!report.contents.iter().any(|c| c.starts_with("Page E")));

    assert_eq!(report.stats.admitted, 4);
    assert_eq!(report.stats.fetched, 4);
    assert!(report.stats.peak_in_flight <= 4);
    assert!(!report.cancelled);

    // expect(n) on each mock is verified when the server drops
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_equivalent_links_are_fetched_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        format!(
            r#"<a href="{base}/team">Team</a>
            <a href="{base}/team#leads">Leads</a>
            <a href="{base}/team?utm_source=newsletter">Team again</a>
            <a href="{base}/team/">Slash</a>
            <h1>Home</h1><p>Hello.</p>"#
        ),
        1,
    )
    .await;
    mount_page(
        &server,
        "/team",
        "<h2>Team</h2><p>Our people.</p>".to_string(),
        1,
    )
    .await;

    let crawler = Crawler::new(create_test_config(2)).unwrap();
    let contents = crawler.crawl(&format!("{}/", base)).await.unwrap();

    assert!(contents.contains(&"Team:\nOur people.".to_string()));
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_redirect_target_is_fetched_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        format!(
            r#"<a href="{base}/old">Old</a> <a href="{base}/new">New</a>
            <h1>Home</h1><p>Moved things.</p>"#
        ),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/new",
        "<h2>New</h2><p>Fresh page.</p>".to_string(),
        1,
    )
    .await;

    let crawler = Crawler::new(create_test_config(2)).unwrap();
    let contents = crawler.crawl(&format!("{}/", base)).await.unwrap();

    assert!(contents.contains(&"New:\nFresh page.".to_string()));
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_media_seed_yields_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<h1>x</h1>", "text/html"))
        .expect(0)
        .mount(&server)
        .await;

    let crawler = Crawler::new(create_test_config(2)).unwrap();
    let report = crawler
        .run(&format!("{}/images/logo.png", server.uri()))
        .await
        .unwrap();

    assert!(report.contents.is_empty());
    assert_eq!(report.stats.skipped, 1);
    assert_eq!(report.stats.fetched, 0);
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_pages_do_not_stop_the_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        format!(
            r#"<a href="{base}/missing">Missing</a>
            <a href="{base}/broken">Broken</a>
            <a href="{base}/ok">Ok</a>
            <h1>Home</h1><p>Start.</p>"#
        ),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_page(&server, "/ok", "<h2>Ok</h2><p>Fine.</p>".to_string(), 1).await;

    let crawler = Crawler::new(create_test_config(2)).unwrap();
    let report = crawler.run(&format!("{}/", base)).await.unwrap();

    assert!(report.contents.contains(&"Ok:\nFine.".to_string()));
    assert_eq!(report.stats.fetched, 2);
    assert_eq!(report.stats.failed, 2);

    let summary = summarize(&report);
    assert_eq!(summary.failures_by_host.get("127.0.0.1"), Some(&2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_transient_failure_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "/", "<h1>Back</h1><p>Up again.</p>".to_string(), 1).await;

    let crawler = Crawler::new(create_test_config(1)).unwrap();
    let contents = crawler.crawl(&format!("{}/", server.uri())).await.unwrap();

    assert_eq!(contents, vec!["Back:\nUp again.".to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_contacts_and_profile_links() {
    let server = MockServer::start().await;

    // Depth 0 keeps the crawl off the external profile links
    mount_page(
        &server,
        "/",
        r#"<html><body>
        <a href="https://github.com/acme/repo">Code</a>
        <a href="https://github.com/acme/repo">Code again</a>
        <a href="mailto:sales@example.com">Sales</a>
        <h1>Acme</h1>
        <p>Reach contact@example.com or call +1-415-555-0100.</p>
        </body></html>"#
            .to_string(),
        1,
    )
    .await;

    let crawler = Crawler::new(create_test_config(0)).unwrap();
    let contents = crawler.crawl(&format!("{}/", server.uri())).await.unwrap();

    assert!(contents.contains(&"Email: contact@example.com".to_string()));
    assert!(contents.contains(&"Email: sales@example.com".to_string()));
    assert!(contents
        .iter()
        .any(|c| c.starts_with("Phone number: ") && c.contains("415-555-0100")));
    assert_eq!(
        contents
            .iter()
            .filter(|c| *c == "GitHub link: https://github.com/acme/repo")
            .count(),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_depth_zero_fetches_only_the_seed() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        format!(r#"<a href="{base}/next">Next</a><h1>Only</h1><p>Seed.</p>"#),
        1,
    )
    .await;
    mount_page(&server, "/next", "<h1>Next</h1>".to_string(), 0).await;

    let crawler = Crawler::new(create_test_config(0)).unwrap();
    let contents = crawler.crawl(&format!("{}/", base)).await.unwrap();

    assert_eq!(contents, vec!["Only:\nSeed.".to_string()]);
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_crawl_blocking_and_store() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        format!(
            r#"<a href="{base}/about">About</a>
            <h1>Home</h1><p>Mail hello@example.com.</p>"#
        ),
        1,
    )
    .await;
    mount_page(
        &server,
        "/about",
        "<h2>About</h2><p>Small team.</p>".to_string(),
        1,
    )
    .await;

    // crawl_blocking builds its own runtime, so it runs on a plain thread
    let seed = format!("{}/", base);
    let crawl = std::thread::spawn(move || crawl_blocking(create_test_config(2), &seed));
    let contents = tokio::task::spawn_blocking(move || crawl.join())
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert!(contents.contains(&"About:\nSmall team.".to_string()));
    assert!(contents.contains(&"Email: hello@example.com".to_string()));

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("contents.db");
    let mut store = open_store(&db_path).unwrap();
    assert_eq!(store.store(&contents).unwrap(), contents.len());

    let stored: Vec<String> = store
        .load_all()
        .unwrap()
        .into_iter()
        .map(|doc| doc.content)
        .collect();
    assert_eq!(stored, contents);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_empty_crawl_keeps_stored_contents() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir.path().join("contents.db")).unwrap();
    store
        .store(&["About:\nIndexed earlier.".to_string()])
        .unwrap();

    let crawler = Crawler::new(create_test_config(1)).unwrap();
    let contents = crawler.crawl(&format!("{}/", server.uri())).await.unwrap();
    assert!(contents.is_empty());

    assert_eq!(store.store(&contents).unwrap(), 0);
    assert_eq!(store.count().unwrap(), 1);
}
