//! Integration tests for the per-site worker process boundary
//!
//! These run the compiled binary as a real child process against wiremock
//! sites.

use lead_harvester::storage::read_snapshot;
use lead_harvester::worker::WorkerSupervisor;
use lead_harvester::{CrawlResult, WorkerOutcome};
use std::process::Command;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BIN: &str = env!("CARGO_BIN_EXE_lead-harvester");

const FILLER: &str = "Independent bicycle workshop repairing road, gravel and cargo bikes. \
Book a service slot online or drop by the workshop during opening hours.";

fn page(body: &str) -> String {
    format!("<html><body><p>{}</p>{}</body></html>", FILLER, body)
}

async fn serve(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(server)
        .await;
}

fn supervisor(dir: &TempDir, depth: u32, timeout: Duration) -> WorkerSupervisor {
    WorkerSupervisor::new(BIN, depth, 1, timeout).with_snapshot_dir(dir.path())
}

#[tokio::test]
async fn test_worker_prints_single_result_line() {
    let server = MockServer::start().await;
    serve(&server, "/", page("Write to Bikes@Workshop.com or hi@workshop.com")).await;

    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("snapshot.txt");
    let output = Command::new(BIN)
        .arg("worker")
        .arg(format!("{}/", server.uri()))
        .arg("1")
        .arg("1")
        .arg(&snapshot)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim().lines().count(), 1);
    assert_eq!(
        CrawlResult::from_stdout(&stdout),
        Some(CrawlResult::ok(vec![
            "bikes@workshop.com".to_string(),
            "hi@workshop.com".to_string()
        ]))
    );
    assert_eq!(
        read_snapshot(&snapshot),
        vec!["bikes@workshop.com", "hi@workshop.com"]
    );
}

#[tokio::test]
async fn test_worker_rejects_invalid_request() {
    let dir = TempDir::new().unwrap();
    let output = Command::new(BIN)
        .arg("worker")
        .arg("not a url")
        .arg("2")
        .arg("1")
        .arg(dir.path().join("snapshot.txt"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(matches!(
        CrawlResult::from_stdout(&stdout),
        Some(CrawlResult::Error { .. })
    ));
}

#[tokio::test]
async fn test_supervisor_completed() {
    let server = MockServer::start().await;
    serve(&server, "/", page(r#"<a href="/contact">Contact</a>"#)).await;
    serve(&server, "/contact", page("service@workshop.com")).await;

    let dir = TempDir::new().unwrap();
    let outcome = supervisor(&dir, 2, Duration::from_secs(60))
        .scrape(&format!("{}/", server.uri()))
        .await;

    assert_eq!(
        outcome,
        WorkerOutcome::Completed {
            emails: vec!["service@workshop.com".to_string()]
        }
    );
}

#[tokio::test]
async fn test_supervisor_recovers_snapshot_on_timeout() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        page(r#"<a href="/contact">Contact</a> front@workshop.com"#),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(page("late@workshop.com"), "text/html")
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("slow-site.txt");
    let outcome = supervisor(&dir, 2, Duration::from_secs(5))
        .supervise(&format!("{}/", server.uri()), &snapshot)
        .await;

    match outcome {
        WorkerOutcome::TimedOut { partial } => {
            assert_eq!(partial, vec!["front@workshop.com"]);
        }
        other => panic!("expected a timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_supervisor_reports_failed_worker() {
    let dir = TempDir::new().unwrap();
    let outcome = supervisor(&dir, 1, Duration::from_secs(30))
        .scrape("not a url")
        .await;

    match outcome {
        WorkerOutcome::Failed { error, partial } => {
            assert!(error.contains("URL"), "unexpected error: {}", error);
            assert!(partial.is_empty());
        }
        other => panic!("expected a failure, got {:?}", other),
    }
}
