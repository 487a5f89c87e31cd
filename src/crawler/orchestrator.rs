use crate::config::Config;
use crate::crawler::browser::ChromeDriverFactory;
use crate::crawler::dynamic::DynamicCrawler;
use crate::crawler::static_crawler::StaticCrawler;
use crate::crawler::EmailCrawler;
use crate::detect::{HttpSiteDetector, SiteDetector, SiteKind};
use crate::state::{CrawlTarget, EmailSet};
use crate::storage::SnapshotWriter;
use crate::worker::CrawlResult;
use crate::HarvestError;
use tracing::{error, info, warn};

/// Picks a crawl strategy per site and retries whole attempts
///
/// One attempt runs `DETECT -> STATIC | DYNAMIC`, and a static crawl that
/// finds no address is followed by a dynamic crawl of the same target.
/// Attempts share nothing but the snapshot file, which is emptied before
/// each attempt starts.
pub struct Orchestrator {
    detector: Box<dyn SiteDetector>,
    static_crawler: Box<dyn EmailCrawler>,
    dynamic_crawler: Box<dyn EmailCrawler>,
}

impl Orchestrator {
    /// Builds the production orchestrator: HTTP detector, reqwest crawler, Chromium crawler
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        Ok(Self::with_strategies(
            HttpSiteDetector::new(config.crawler.detect_timeout())?,
            StaticCrawler::from_config(config)?,
            DynamicCrawler::new(ChromeDriverFactory::new(config.browser.clone())),
        ))
    }

    pub fn with_strategies(
        detector: impl SiteDetector + 'static,
        static_crawler: impl EmailCrawler + 'static,
        dynamic_crawler: impl EmailCrawler + 'static,
    ) -> Self {
        Self {
            detector: Box::new(detector),
            static_crawler: Box::new(static_crawler),
            dynamic_crawler: Box::new(dynamic_crawler),
        }
    }

    /// Runs one attempt through the strategy state machine
    pub async fn crawl_once(&self, target: &CrawlTarget) -> Result<EmailSet, HarvestError> {
        let kind = self.detector.detect(target.root()).await;
        info!(root = %target.root(), kind = %kind, "Detected site type");

        let first = match kind {
            SiteKind::Static => &self.static_crawler,
            SiteKind::Dynamic => &self.dynamic_crawler,
        };
        let emails = first.crawl(target).await?;

        if emails.is_empty() && kind == SiteKind::Static {
            info!(
                root = %target.root(),
                fallback = self.dynamic_crawler.name(),
                "Static crawl found nothing, falling back"
            );
            return self.dynamic_crawler.crawl(target).await;
        }

        Ok(emails)
    }

    /// Runs up to `max_retries` attempts and reports the terminal result
    ///
    /// Only the last attempt's error is reported.
    pub async fn run(&self, target: &CrawlTarget) -> CrawlResult {
        let mut last_error = None;
        let snapshot = SnapshotWriter::new(target.snapshot_path());

        for attempt in 1..=target.max_retries() {
            if let Err(e) = snapshot.clear() {
                warn!(attempt, error = %e, "Failed to clear email snapshot");
            }

            match self.crawl_once(target).await {
                Ok(emails) => {
                    info!(attempt, emails = emails.len(), "Crawl succeeded");
                    return CrawlResult::ok(emails.into_sorted_vec());
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max_retries = target.max_retries(),
                        error = %e,
                        "Crawl attempt failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        let message = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no crawl attempt was made".to_string());
        error!(root = %target.root(), error = %message, "All crawl attempts failed");
        CrawlResult::error(message)
    }
}
