//! Integration tests for the lead pipeline collaborators
//!
//! The places directory and the relevance filter are served by wiremock;
//! site crawls are replaced by canned worker outcomes.

use async_trait::async_trait;
use lead_harvester::leads::{
    EmailFilter, GooglePlacesClient, LeadPipeline, OpenRouterFilter, PlaceSearch, SiteScraper,
    NO_WEBSITE, TIMEOUT_EXCEEDED,
};
use lead_harvester::{HarvestError, WorkerOutcome};
use serde_json::json;
use std::time::{Duration, Instant};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn places_client(server: &MockServer) -> GooglePlacesClient {
    GooglePlacesClient::new(
        format!("{}/v1/places:searchText", server.uri()),
        "places-key",
        Duration::from_secs(10),
    )
    .unwrap()
}

fn filter_client(server: &MockServer) -> OpenRouterFilter {
    filter_client_with_timeout(server, Duration::from_secs(10))
}

fn filter_client_with_timeout(server: &MockServer, timeout: Duration) -> OpenRouterFilter {
    OpenRouterFilter::new(
        format!("{}/api/v1/chat/completions", server.uri()),
        "filter-key",
        "test/model",
        timeout,
    )
    .unwrap()
}

fn chat_reply(content: &str) -> serde_json::Value {
    json!({
        "choices": [
            {"message": {"role": "assistant", "content": content}}
        ]
    })
}

async fn mount_places(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/places:searchText"))
        .and(header("X-Goog-Api-Key", "places-key"))
        .and(body_partial_json(json!({"textQuery": "bike shops in Leeds", "maxResultCount": 5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "places": [
                {
                    "id": "p1",
                    "displayName": {"text": "Spoke Works"},
                    "websiteUri": "https://spokeworks.example/",
                    "nationalPhoneNumber": "0113 000 0000",
                    "formattedAddress": "1 Wheel St, Leeds",
                    "types": ["bicycle_store"],
                    "regularOpeningHours": {"weekdayDescriptions": ["Monday: 9 AM to 5 PM"]}
                },
                {
                    "id": "p2",
                    "displayName": {"text": "Chain Gang"}
                }
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_places_search_maps_results() {
    let server = MockServer::start().await;
    mount_places(&server).await;

    let places = places_client(&server)
        .search("bike shops in Leeds", 5)
        .await
        .unwrap();

    assert_eq!(places.len(), 2);
    assert_eq!(places[0].name, "Spoke Works");
    assert_eq!(places[0].website_url, "https://spokeworks.example/");
    assert_eq!(places[0].categories, vec!["bicycle_store"]);
    assert_eq!(places[0].opening_hours, vec!["Monday: 9 AM to 5 PM"]);
    assert_eq!(places[1].name, "Chain Gang");
    assert!(places[1].website_url.is_empty());
    assert!(places[1].national_phone.is_empty());
}

#[tokio::test]
async fn test_places_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let places = places_client(&server).search("nothing", 5).await.unwrap();
    assert!(places.is_empty());
}

#[tokio::test]
async fn test_places_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("API key invalid"))
        .mount(&server)
        .await;

    let result = places_client(&server).search("anything", 5).await;
    match result {
        Err(HarvestError::Places(message)) => assert!(message.contains("403")),
        other => panic!("expected a places error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_filter_keeps_only_input_addresses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .and(header("Authorization", "Bearer filter-key"))
        .and(body_partial_json(json!({"model": "test/model"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
            "['hello@spokeworks.example', 'invented@spokeworks.example']",
        )))
        .mount(&server)
        .await;

    let input = vec![
        "hello@spokeworks.example".to_string(),
        "someone@gmail.com".to_string(),
    ];
    let kept = filter_client(&server)
        .filter("Spoke Works", &input)
        .await
        .unwrap();

    assert_eq!(kept, vec!["hello@spokeworks.example"]);
}

#[tokio::test]
async fn test_filter_skips_call_for_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("[]")))
        .expect(0)
        .mount(&server)
        .await;

    let kept = filter_client(&server).filter("Nobody", &[]).await.unwrap();
    assert!(kept.is_empty());
}

#[tokio::test]
async fn test_filter_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = filter_client(&server)
        .filter("Spoke Works", &["a@b.com".to_string()])
        .await;
    assert!(matches!(result, Err(HarvestError::Filter(_))));
}

/// Answers every site with a timeout that salvaged two addresses
struct SlowSites;

#[async_trait]
impl SiteScraper for SlowSites {
    async fn scrape_site(&self, _url: &str) -> WorkerOutcome {
        WorkerOutcome::TimedOut {
            partial: vec![
                "hello@spokeworks.example".to_string(),
                "tracker@analytics.example".to_string(),
            ],
        }
    }
}

#[tokio::test]
async fn test_pipeline_against_live_collaborators() {
    let server = MockServer::start().await;
    mount_places(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_reply(r#"["hello@spokeworks.example"]"#)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = LeadPipeline::new(
        Box::new(places_client(&server)),
        Box::new(SlowSites),
        Box::new(filter_client(&server)),
    );

    let mut streamed = 0;
    let leads = pipeline
        .run("bike shops in Leeds", 5, |_| streamed += 1)
        .await
        .unwrap();

    assert_eq!(streamed, 2);
    assert_eq!(leads[0].place.name, "Spoke Works");
    assert_eq!(leads[0].emails, vec!["hello@spokeworks.example"]);
    assert_eq!(leads[0].scrape_error.as_deref(), Some(TIMEOUT_EXCEEDED));

    assert_eq!(leads[1].place.name, "Chain Gang");
    assert!(leads[1].emails.is_empty());
    assert_eq!(leads[1].scrape_error.as_deref(), Some(NO_WEBSITE));
}

#[tokio::test]
async fn test_stalled_filter_keeps_unfiltered_emails() {
    let server = MockServer::start().await;
    mount_places(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_reply(r#"["hello@spokeworks.example"]"#))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let stalled = filter_client_with_timeout(&server, Duration::from_millis(300));
    let direct = stalled
        .filter("Spoke Works", &["hello@spokeworks.example".to_string()])
        .await;
    assert!(direct.is_err());

    let pipeline = LeadPipeline::new(
        Box::new(places_client(&server)),
        Box::new(SlowSites),
        Box::new(stalled),
    );

    let started = Instant::now();
    let leads = pipeline
        .run("bike shops in Leeds", 5, |_| {})
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(
        leads[0].emails,
        vec!["hello@spokeworks.example", "tracker@analytics.example"]
    );
}
