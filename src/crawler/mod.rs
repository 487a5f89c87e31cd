//! Crawler module: the two crawl strategies and the orchestrator above them
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and HTML page parsing
//! - The static crawler over plain HTTP
//! - The dynamic crawler driving a headless browser
//! - The orchestrator picking a strategy and retrying whole attempts

mod browser;
mod dynamic;
mod fetcher;
mod orchestrator;
mod parser;
mod static_crawler;

pub use browser::{ChromeDriverFactory, ChromeSession};
pub use dynamic::{DriverFactory, DynamicCrawler, PageDriver, RenderedPage, COMMON_EMAIL_ROUTES};
pub use fetcher::{build_http_client, fetch_page, is_html_content_type, FetchResult};
pub use orchestrator::Orchestrator;
pub use parser::{parse_page, ParsedPage};
pub use static_crawler::StaticCrawler;

use crate::state::{CrawlTarget, EmailSet};
use crate::storage::SnapshotWriter;
use crate::HarvestError;
use async_trait::async_trait;
use tracing::warn;

/// A crawl strategy: one attempt over one site
///
/// Per-page failures are absorbed inside the crawl. An `Err` means the
/// attempt as a whole could not run (for example the browser never started).
#[async_trait]
pub trait EmailCrawler: Send + Sync {
    /// Short strategy name for logs
    fn name(&self) -> &'static str;

    /// Crawls `target`, flushing the snapshot after every page
    async fn crawl(&self, target: &CrawlTarget) -> Result<EmailSet, HarvestError>;
}

/// Writes the snapshot, logging instead of failing the crawl
pub(crate) fn flush_snapshot(writer: &SnapshotWriter, emails: &EmailSet) {
    if let Err(e) = writer.write(emails) {
        warn!(error = %e, "Failed to write email snapshot");
    }
}
