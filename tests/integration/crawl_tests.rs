//! Integration tests for the static crawl path
//!
//! These tests use wiremock to serve small websites and run the full
//! detect/fetch/parse/snapshot cycle against them.

use async_trait::async_trait;
use lead_harvester::config::Config;
use lead_harvester::crawler::{build_http_client, EmailCrawler, Orchestrator, StaticCrawler};
use lead_harvester::detect::{HttpSiteDetector, SiteDetector, SiteKind};
use lead_harvester::storage::read_snapshot;
use lead_harvester::{CrawlResult, CrawlTarget, EmailSet, HarvestError};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FILLER: &str = "Family owned hardware store serving the valley since 1961. \
We stock tools, paint, garden supplies and everything for the weekend project.";

fn page(body: &str) -> String {
    format!(
        "<html><head><title>Shop</title></head><body><p>{}</p>{}</body></html>",
        FILLER, body
    )
}

async fn serve(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(server)
        .await;
}

async fn serve_once(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .expect(1)
        .mount(server)
        .await;
}

fn crawler() -> StaticCrawler {
    StaticCrawler::new(build_http_client(&Config::default()).unwrap())
}

fn target(server: &MockServer, depth: u32, snapshot: &Path) -> CrawlTarget {
    CrawlTarget::new(&format!("{}/", server.uri()), depth, 1, snapshot).unwrap()
}

async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| request.url.path().to_string())
        .collect()
}

#[tokio::test]
async fn test_cycle_visits_each_page_once() {
    let server = MockServer::start().await;
    serve_once(&server, "/", page(r#"<a href="/a">A</a>"#)).await;
    serve_once(
        &server,
        "/a",
        page(r#"<a href="/b">B</a> <span>a@cycle.com</span>"#),
    )
    .await;
    serve_once(
        &server,
        "/b",
        page(r#"<a href="/a">back to A</a> <a href="/">home</a> b@cycle.com"#),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("emails.txt");
    let emails = crawler()
        .crawl(&target(&server, 6, &snapshot))
        .await
        .unwrap();

    assert_eq!(emails.to_sorted_vec(), vec!["a@cycle.com", "b@cycle.com"]);
}

#[tokio::test]
async fn test_depth_one_fetches_only_root() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        page(r#"<a href="/contact">Contact</a> owner@root.com"#),
    )
    .await;
    serve(&server, "/contact", page("hidden@root.com")).await;

    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("emails.txt");
    let emails = crawler()
        .crawl(&target(&server, 1, &snapshot))
        .await
        .unwrap();

    assert_eq!(emails.to_sorted_vec(), vec!["owner@root.com"]);
    assert_eq!(requested_paths(&server).await, vec!["/"]);
}

#[tokio::test]
async fn test_priority_links_fetched_first() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        page(
            r#"<a href="/products">Products</a>
               <a href="/contact-us">Contact</a>
               <a href="/blog">Blog</a>
               <a href="/about">About</a>"#,
        ),
    )
    .await;
    for route in ["/products", "/contact-us", "/blog", "/about"] {
        serve(&server, route, page("")).await;
    }

    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("emails.txt");
    crawler()
        .crawl(&target(&server, 2, &snapshot))
        .await
        .unwrap();

    assert_eq!(
        requested_paths(&server).await,
        vec!["/", "/contact-us", "/about", "/products", "/blog"]
    );
}

#[tokio::test]
async fn test_navigation_links_preferred_over_body_links() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        page(
            r#"<nav><a href="/team">Team</a></nav>
               <main><a href="/deep">Deep page</a></main>"#,
        ),
    )
    .await;
    serve(&server, "/team", page("team@nav.com")).await;
    serve(&server, "/deep", page("deep@nav.com")).await;

    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("emails.txt");
    let emails = crawler()
        .crawl(&target(&server, 2, &snapshot))
        .await
        .unwrap();

    assert_eq!(emails.to_sorted_vec(), vec!["team@nav.com"]);
}

#[tokio::test]
async fn test_all_links_used_without_navigation() {
    let server = MockServer::start().await;
    serve(&server, "/", page(r#"<main><a href="/deep">Deep page</a></main>"#)).await;
    serve(&server, "/deep", page("deep@plain.com")).await;

    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("emails.txt");
    let emails = crawler()
        .crawl(&target(&server, 2, &snapshot))
        .await
        .unwrap();

    assert_eq!(emails.to_sorted_vec(), vec!["deep@plain.com"]);
}

#[tokio::test]
async fn test_links_followed_after_cross_host_redirect() {
    let apex = MockServer::start().await;
    let www = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("Location", format!("{}/", www.uri()).as_str()),
        )
        .mount(&apex)
        .await;
    serve(
        &www,
        "/",
        page(r#"<nav><a href="/contact">Contact</a> <a href="/">Home</a></nav>"#),
    )
    .await;
    serve(&www, "/contact", page("desk@shop.com")).await;

    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("emails.txt");
    let emails = crawler()
        .crawl(&target(&apex, 2, &snapshot))
        .await
        .unwrap();

    assert_eq!(emails.to_sorted_vec(), vec!["desk@shop.com"]);
    assert_eq!(requested_paths(&www).await, vec!["/", "/contact"]);
}

#[tokio::test]
async fn test_external_links_ignored() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        page(r#"<a href="https://elsewhere.invalid/contact">Partner</a> me@local.com"#),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("emails.txt");
    let emails = crawler()
        .crawl(&target(&server, 3, &snapshot))
        .await
        .unwrap();

    assert_eq!(emails.to_sorted_vec(), vec!["me@local.com"]);
    assert_eq!(requested_paths(&server).await, vec!["/"]);
}

#[tokio::test]
async fn test_snapshot_holds_every_email() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        page(r#"<a href="/contact">Contact</a> <a href="mailto:Sales@Shop.com">Mail us</a>"#),
    )
    .await;
    serve(
        &server,
        "/contact",
        page("support [at] shop [dot] com and sales@shop.com"),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("emails.txt");
    let emails = crawler()
        .crawl(&target(&server, 2, &snapshot))
        .await
        .unwrap();

    assert_eq!(
        emails.to_sorted_vec(),
        vec!["sales@shop.com", "support@shop.com"]
    );
    assert_eq!(read_snapshot(&snapshot), emails.to_sorted_vec());
}

#[tokio::test]
async fn test_failed_page_does_not_abort_crawl() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        page(r#"<a href="/broken">Broken</a> <a href="/help">Help</a>"#),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    serve(&server, "/help", page("help@ok.com")).await;

    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("emails.txt");
    let emails = crawler()
        .crawl(&target(&server, 2, &snapshot))
        .await
        .unwrap();

    assert_eq!(emails.to_sorted_vec(), vec!["help@ok.com"]);
}

#[tokio::test]
async fn test_detector_verdicts() {
    let server = MockServer::start().await;
    serve(&server, "/", page("<h1>Hardware</h1>")).await;
    serve(
        &server,
        "/spa",
        r#"<html><body><div id="root"></div><script src="/app.js"></script></body></html>"#
            .to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/forbidden"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let detector = HttpSiteDetector::new(Duration::from_secs(5)).unwrap();
    let url = |route: &str| Url::parse(&format!("{}{}", server.uri(), route)).unwrap();

    assert_eq!(detector.detect(&url("/")).await, SiteKind::Static);
    assert_eq!(detector.detect(&url("/spa")).await, SiteKind::Dynamic);
    assert_eq!(detector.detect(&url("/forbidden")).await, SiteKind::Dynamic);

    let unreachable = Url::parse("http://127.0.0.1:9/").unwrap();
    assert_eq!(detector.detect(&unreachable).await, SiteKind::Static);
}

/// Stands in for the browser crawler
struct CannedBrowserCrawl(Vec<&'static str>);

#[async_trait]
impl EmailCrawler for CannedBrowserCrawl {
    fn name(&self) -> &'static str {
        "canned"
    }

    async fn crawl(&self, _target: &CrawlTarget) -> Result<EmailSet, HarvestError> {
        Ok(self.0.iter().copied().collect())
    }
}

#[tokio::test]
async fn test_orchestrator_static_site() {
    let server = MockServer::start().await;
    serve(&server, "/", page("front@desk.com")).await;

    let orchestrator = Orchestrator::with_strategies(
        HttpSiteDetector::new(Duration::from_secs(5)).unwrap(),
        crawler(),
        CannedBrowserCrawl(vec!["never@used.com"]),
    );

    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("emails.txt");
    let result = orchestrator.run(&target(&server, 2, &snapshot)).await;

    assert_eq!(result, CrawlResult::ok(vec!["front@desk.com".to_string()]));
}

#[tokio::test]
async fn test_orchestrator_falls_back_when_static_finds_nothing() {
    let server = MockServer::start().await;
    serve(&server, "/", page("<p>Call us.</p>")).await;

    let orchestrator = Orchestrator::with_strategies(
        HttpSiteDetector::new(Duration::from_secs(5)).unwrap(),
        crawler(),
        CannedBrowserCrawl(vec!["rendered@spa.com"]),
    );

    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("emails.txt");
    let result = orchestrator.run(&target(&server, 2, &snapshot)).await;

    assert_eq!(result, CrawlResult::ok(vec!["rendered@spa.com".to_string()]));
}
