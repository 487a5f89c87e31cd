//! Chromium page driver
//!
//! One browser process and one tab per crawl attempt. Images, media and
//! fonts are failed by resource type through request interception, whatever
//! their URL looks like; asset extensions and ad/analytics hosts are also
//! blocked by URL pattern. Both are in place before the first navigation.

use crate::config::BrowserConfig;
use crate::crawler::dynamic::{DriverFactory, PageDriver, RenderedPage};
use crate::HarvestError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams as FetchEnableParams, EventRequestPaused,
    FailRequestParams, RequestPattern,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, ErrorReason, ResourceType, SetBlockedUrLsParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

const LAUNCH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--ignore-certificate-errors",
    "--allow-insecure-localhost",
];

const BLOCKED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "svg", "ico", "bmp", "avif", "mp4", "webm", "ogg", "mp3",
    "wav", "mov", "avi", "woff", "woff2", "ttf", "otf", "eot",
];

const BLOCKED_HOST_KEYWORDS: &[&str] = &[
    "analytics",
    "doubleclick",
    "tracker",
    "facebook",
    "adservice",
    "googletagmanager",
];

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Resource count must hold still this long to call the network quiet
const QUIET_WINDOW: Duration = Duration::from_millis(500);

const EXTRACT_SCRIPT: &str = r#"(() => {
    const anchors = [];
    const take = (nodes) => {
        for (const a of nodes) {
            const href = a.href;
            if (typeof href === 'string' && href.length > 0) anchors.push(href);
        }
    };
    for (const sel of ['nav a[href]', 'header a[href]', 'footer a[href]', 'aside a[href]', 'section a[href]']) {
        take(document.querySelectorAll(sel));
    }
    take(Array.from(document.querySelectorAll('a[href]')).slice(0, __MAX_ANCHORS__));
    const mailto = Array.from(document.querySelectorAll("a[href^='mailto:' i]"))
        .map((a) => a.getAttribute('href'))
        .filter((href) => href);
    return {
        html: document.documentElement ? document.documentElement.outerHTML : '',
        text: document.body ? document.body.innerText : '',
        mailto,
        anchors,
        location: window.location.href,
    };
})()"#;

/// Resource types failed by request interception
pub fn blocked_resource_types() -> Vec<ResourceType> {
    vec![ResourceType::Image, ResourceType::Media, ResourceType::Font]
}

/// `Fetch.enable` patterns: pause only requests of a blocked type
fn interception_patterns() -> Vec<RequestPattern> {
    blocked_resource_types()
        .into_iter()
        .map(|kind| RequestPattern::builder().resource_type(kind).build())
        .collect()
}

/// URL patterns handed to `Network.setBlockedURLs`
pub fn blocked_url_patterns() -> Vec<String> {
    let mut patterns = Vec::new();
    for ext in BLOCKED_EXTENSIONS {
        patterns.push(format!("*.{}", ext));
        patterns.push(format!("*.{}?*", ext));
    }
    for keyword in BLOCKED_HOST_KEYWORDS {
        patterns.push(format!("*{}*", keyword));
    }
    patterns
}

fn extract_script(max_anchors: usize) -> String {
    EXTRACT_SCRIPT.replace("__MAX_ANCHORS__", &max_anchors.to_string())
}

fn browser_error(e: impl std::fmt::Display) -> HarvestError {
    HarvestError::Browser(e.to_string())
}

/// Launches a [`ChromeSession`] per crawl attempt
#[derive(Debug, Clone)]
pub struct ChromeDriverFactory {
    settings: BrowserConfig,
}

impl ChromeDriverFactory {
    pub fn new(settings: BrowserConfig) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl DriverFactory for ChromeDriverFactory {
    async fn launch(&self) -> Result<Box<dyn PageDriver>, HarvestError> {
        let session = ChromeSession::launch(&self.settings).await?;
        Ok(Box::new(session))
    }
}

/// A running Chromium with the single tab a crawl navigates
pub struct ChromeSession {
    browser: Browser,
    handler: JoinHandle<()>,
    interceptor: JoinHandle<()>,
    page: Page,
    settings: BrowserConfig,
    script: String,
}

impl ChromeSession {
    /// Starts Chromium and prepares a tab with resource blocking enabled
    ///
    /// # Errors
    ///
    /// `HarvestError::Browser` if the browser cannot be started or the tab
    /// cannot be configured
    pub async fn launch(settings: &BrowserConfig) -> Result<Self, HarvestError> {
        let mut builder = ChromeConfig::builder().no_sandbox().args(LAUNCH_ARGS.iter().copied());
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &settings.chrome_executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder.build().map_err(browser_error)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(browser_error)?;

        // Spawn browser handler
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let (page, interceptor) = match Self::open_tab(&browser).await {
            Ok(tab) => tab,
            Err(e) => {
                handler.abort();
                return Err(e);
            }
        };

        debug!(headless = settings.headless, "Browser started");
        Ok(Self {
            browser,
            handler,
            interceptor,
            page,
            settings: settings.clone(),
            script: extract_script(settings.max_anchors),
        })
    }

    async fn open_tab(browser: &Browser) -> Result<(Page, JoinHandle<()>), HarvestError> {
        let page = browser.new_page("about:blank").await.map_err(browser_error)?;
        page.execute(EnableParams::default())
            .await
            .map_err(browser_error)?;
        page.execute(SetBlockedUrLsParams::new(blocked_url_patterns()))
            .await
            .map_err(browser_error)?;

        // listen before enabling so no paused request goes unanswered
        let mut paused = page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(browser_error)?;
        let responder = page.clone();
        let interceptor = tokio::spawn(async move {
            let blocked = blocked_resource_types();
            while let Some(event) = paused.next().await {
                let request_id = event.request_id.clone();
                let outcome = if blocked.contains(&event.resource_type) {
                    responder
                        .execute(FailRequestParams::new(request_id, ErrorReason::BlockedByClient))
                        .await
                        .map(|_| ())
                } else {
                    responder
                        .execute(ContinueRequestParams::new(request_id))
                        .await
                        .map(|_| ())
                };
                if let Err(e) = outcome {
                    debug!(error = %e, "Failed to answer intercepted request");
                }
            }
        });

        let enabled = page
            .execute(
                FetchEnableParams::builder()
                    .patterns(interception_patterns())
                    .build(),
            )
            .await;
        if let Err(e) = enabled {
            interceptor.abort();
            return Err(browser_error(e));
        }

        Ok((page, interceptor))
    }

    /// Polls `document.readyState` until the DOM is usable or time runs out
    async fn wait_for_dom(&self) {
        let deadline = Instant::now() + Duration::from_millis(self.settings.dom_timeout_ms);

        while Instant::now() < deadline {
            let state = match self.page.evaluate("document.readyState").await {
                Ok(result) => result.into_value::<String>().ok(),
                Err(_) => None,
            };
            if matches!(state.as_deref(), Some("interactive" | "complete")) {
                return;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        debug!("DOM never reported ready, continuing");
    }

    /// Waits until no new resources load for a short window
    ///
    /// Pages that keep polling never go quiet; those get a fixed grace delay
    /// once the idle timeout expires.
    async fn wait_for_quiet_network(&self) {
        let deadline = Instant::now() + Duration::from_millis(self.settings.idle_timeout_ms);
        let mut last_count = None;
        let mut stable_since = Instant::now();

        while Instant::now() < deadline {
            let count = self.resource_count().await;
            if count.is_some() && count == last_count {
                if stable_since.elapsed() >= QUIET_WINDOW {
                    return;
                }
            } else {
                last_count = count;
                stable_since = Instant::now();
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        debug!(
            grace_ms = self.settings.grace_delay_ms,
            "Network never went quiet, applying grace delay"
        );
        tokio::time::sleep(Duration::from_millis(self.settings.grace_delay_ms)).await;
    }

    async fn resource_count(&self) -> Option<u64> {
        self.page
            .evaluate("performance.getEntriesByType('resource').length")
            .await
            .ok()?
            .into_value::<u64>()
            .ok()
    }
}

#[async_trait]
impl PageDriver for ChromeSession {
    async fn visit(&mut self, url: &Url) -> Result<RenderedPage, HarvestError> {
        let limit = Duration::from_millis(self.settings.navigation_timeout_ms);

        match tokio::time::timeout(limit, self.page.goto(url.as_str())).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(browser_error(e)),
            Err(_) => {
                return Err(HarvestError::Browser(format!(
                    "navigation to {} timed out after {}ms",
                    url, self.settings.navigation_timeout_ms
                )))
            }
        }

        self.wait_for_dom().await;
        self.wait_for_quiet_network().await;

        let result = self
            .page
            .evaluate(self.script.as_str())
            .await
            .map_err(browser_error)?;
        Ok(result.into_value::<RenderedPage>()?)
    }

    async fn close(&mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "Failed to close browser cleanly");
        }
        if let Err(e) = self.browser.wait().await {
            debug!(error = %e, "Browser process did not exit cleanly");
        }
        self.interceptor.abort();
        self.handler.abort();
    }
}
