//! Site-type detection
//!
//! One lightweight GET to the crawl root decides whether the site is served
//! as plain HTML or rendered client-side. The verdict only picks the first
//! strategy: a static crawl that finds nothing still falls back to the
//! browser.

use crate::extract::{text_fragments, visible_text};
use crate::HarvestError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Detection user agent; plain enough that sites serve their normal markup
const DETECT_USER_AGENT: &str = "Mozilla/5.0";

/// Below this much body text the page is treated as an empty shell
const MIN_BODY_TEXT: usize = 100;

/// Script count above which a page with little text counts as script-rendered
const SCRIPT_HEAVY_COUNT: usize = 20;
const SCRIPT_HEAVY_TEXT: usize = 300;

const FRAMEWORK_HINTS: &[&str] = &["react", "vue", "next.js", "angular"];

static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("body selector is valid"));

static MOUNT_POINT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("#root, #__next, app").expect("mount point selector is valid"));

static SCRIPT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script").expect("script selector is valid"));

/// Rendering style of a site, and so the crawl strategy to start with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteKind {
    /// Server-rendered HTML; plain HTTP fetches see the content
    Static,
    /// Client-rendered; content only exists after scripts run
    Dynamic,
}

impl fmt::Display for SiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteKind::Static => write!(f, "static"),
            SiteKind::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// Classifies a fetched document
///
/// The page is dynamic when any of these hold:
/// 1. the body carries fewer than 100 characters of text
/// 2. a known mount point is present (`#root`, `#__next`, `<app>`)
/// 3. more than 20 scripts with under 300 characters of text overall
/// 4. the text mentions a frontend framework
pub fn classify_document(html: &str) -> SiteKind {
    let document = Html::parse_document(html);

    let body_len: usize = document
        .select(&BODY_SELECTOR)
        .next()
        .map(|body| text_fragments(body).iter().map(|t| t.chars().count()).sum())
        .unwrap_or(0);
    if body_len < MIN_BODY_TEXT {
        debug!(body_len, "Almost no body text");
        return SiteKind::Dynamic;
    }

    if document.select(&MOUNT_POINT_SELECTOR).next().is_some() {
        debug!("Found a client-side mount point");
        return SiteKind::Dynamic;
    }

    let text = visible_text(&document);
    let scripts = document.select(&SCRIPT_SELECTOR).count();
    if scripts > SCRIPT_HEAVY_COUNT && text.chars().count() < SCRIPT_HEAVY_TEXT {
        debug!(scripts, "Script heavy page with little text");
        return SiteKind::Dynamic;
    }

    let text = text.to_lowercase();
    if let Some(hint) = FRAMEWORK_HINTS.iter().find(|hint| text.contains(*hint)) {
        debug!(hint, "Page mentions a frontend framework");
        return SiteKind::Dynamic;
    }

    SiteKind::Static
}

/// Decides which crawl strategy a site starts with
///
/// Implementations never fail: anything unexpected resolves to a verdict.
#[async_trait]
pub trait SiteDetector: Send + Sync {
    async fn detect(&self, url: &Url) -> SiteKind;
}

/// Detector that requests the site root over plain HTTP
pub struct HttpSiteDetector {
    client: Client,
}

impl HttpSiteDetector {
    /// Creates a detector whose request gives up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, HarvestError> {
        let client = Client::builder()
            .user_agent(DETECT_USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Fetches the root and classifies it
    ///
    /// A non-2xx response is classified dynamic straight away.
    pub async fn fetch_kind(&self, url: &Url) -> Result<SiteKind, reqwest::Error> {
        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            debug!(url = %url, status = %response.status(), "Detection request was refused");
            return Ok(SiteKind::Dynamic);
        }

        let body = response.text().await?;
        Ok(classify_document(&body))
    }
}

#[async_trait]
impl SiteDetector for HttpSiteDetector {
    async fn detect(&self, url: &Url) -> SiteKind {
        match self.fetch_kind(url).await {
            Ok(kind) => kind,
            Err(e) => {
                warn!(url = %url, error = %e, "Site detection failed, assuming static");
                SiteKind::Static
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph() -> String {
        "We are a family owned bakery serving fresh bread, pastries and cakes \
         every day of the week in the heart of the old town since 1952."
            .to_string()
    }

    #[test]
    fn test_plain_page_is_static() {
        let html = format!("<html><body><h1>Bakery</h1><p>{}</p></body></html>", paragraph());
        assert_eq!(classify_document(&html), SiteKind::Static);
    }

    #[test]
    fn test_empty_shell_is_dynamic() {
        let html = r#"<html><body><div id="app"></div><script src="/bundle.js"></script></body></html>"#;
        assert_eq!(classify_document(html), SiteKind::Dynamic);
    }

    #[test]
    fn test_mount_point_is_dynamic() {
        let html = format!(
            r#"<html><body><div id="__next"><p>{}</p></div></body></html>"#,
            paragraph()
        );
        assert_eq!(classify_document(&html), SiteKind::Dynamic);

        let html = format!("<html><body><app><p>{}</p></app></body></html>", paragraph());
        assert_eq!(classify_document(&html), SiteKind::Dynamic);
    }

    #[test]
    fn test_script_heavy_is_dynamic() {
        let scripts = "<script>init();</script>".repeat(21);
        let html = format!("<html><body><p>{}</p>{}</body></html>", paragraph(), scripts);
        assert_eq!(classify_document(&html), SiteKind::Dynamic);
    }

    #[test]
    fn test_framework_mention_is_dynamic() {
        let html = format!(
            "<html><body><p>{}</p><footer>Built with Vue</footer></body></html>",
            paragraph()
        );
        assert_eq!(classify_document(&html), SiteKind::Dynamic);
    }

    #[test]
    fn test_script_contents_are_not_text() {
        // framework names inside script bodies are not visible text
        let html = format!(
            "<html><body><p>{}</p><script>window.react = 1;</script></body></html>",
            paragraph()
        );
        assert_eq!(classify_document(&html), SiteKind::Static);
    }

    #[test]
    fn test_site_kind_display() {
        assert_eq!(SiteKind::Static.to_string(), "static");
        assert_eq!(SiteKind::Dynamic.to_string(), "dynamic");
    }
}
