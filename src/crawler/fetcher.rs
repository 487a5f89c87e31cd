//! HTTP fetcher implementation
//!
//! This module handles the plain HTTP side of a crawl:
//! - Building the shared client with the crawler's user agent string
//! - GET requests with a bounded timeout
//! - Content-Type screening
//! - Error classification

use crate::config::Config;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value
        content_type: String,
        /// Page body content
        body: String,
    },

    /// Page is not HTML (Content-Type mismatch)
    ContentMismatch {
        /// The actual Content-Type received
        content_type: String,
    },

    /// Non-success HTTP status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    /// Short description for skip logging
    pub fn describe(&self) -> String {
        match self {
            FetchResult::Success { status_code, .. } => format!("HTTP {}", status_code),
            FetchResult::ContentMismatch { content_type } => {
                format!("not HTML ({})", content_type)
            }
            FetchResult::HttpError { status_code } => format!("HTTP {}", status_code),
            FetchResult::NetworkError { error } => error.clone(),
        }
    }
}

/// Builds the HTTP client shared by one crawl
///
/// # Arguments
///
/// * `config` - The full configuration; the user agent and request timeout are used
///
/// # Example
///
/// ```no_run
/// use lead_harvester::config::Config;
/// use lead_harvester::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        // Format: CrawlerName/Version (+ContactURL; ContactEmail)
        .user_agent(config.user_agent.header_value())
        .timeout(config.crawler.request_timeout())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns true if a Content-Type can carry an HTML page
///
/// A missing header is accepted; so is any `text/*` type.
pub fn is_html_content_type(content_type: &str) -> bool {
    let content_type = content_type.trim().to_lowercase();
    content_type.is_empty()
        || content_type.starts_with("text/")
        || content_type.contains("html")
}

/// Fetches one page
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx with an HTML-ish Content-Type | Success |
/// | 2xx with any other Content-Type | ContentMismatch |
/// | Non-2xx | HttpError |
/// | Timeout, refused connection, bad body | NetworkError |
///
/// Nothing is retried here; retry is a whole-attempt concern.
pub async fn fetch_page(client: &Client, url: &Url) -> FetchResult {
    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(&e),
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html_content_type(&content_type) {
        return FetchResult::ContentMismatch { content_type };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
        },
        Err(e) => classify_error(&e),
    }
}

fn classify_error(e: &reqwest::Error) -> FetchResult {
    let error = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else if e.is_redirect() {
        "Too many redirects".to_string()
    } else {
        e.to_string()
    };
    FetchResult::NetworkError { error }
}
