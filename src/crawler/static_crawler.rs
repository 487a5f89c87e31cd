use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch_page, FetchResult};
use crate::crawler::parser::parse_page;
use crate::crawler::{flush_snapshot, EmailCrawler};
use crate::state::{CrawlTarget, EmailSet, Frontier, VisitedSet};
use crate::storage::SnapshotWriter;
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

/// Breadth-first crawler over plain HTTP
///
/// Level 0 is the root alone; each later level is every unvisited link the
/// previous level produced, priority links first. A crawl with
/// `max_depth = 1` fetches only the root.
pub struct StaticCrawler {
    client: Client,
}

impl StaticCrawler {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        Ok(Self::new(build_http_client(config)?))
    }

    /// Fetches and parses one page, returning its links
    ///
    /// Links are taken relative to where redirects landed, and that URL is
    /// marked visited too. A failed fetch is logged and yields no links.
    async fn visit(
        &self,
        url: &Url,
        emails: &mut EmailSet,
        visited: &mut VisitedSet,
    ) -> Vec<Url> {
        match fetch_page(&self.client, url).await {
            FetchResult::Success {
                final_url, body, ..
            } => {
                if final_url != *url {
                    debug!(url = %url, landed = %final_url, "Followed redirect");
                    visited.insert(&final_url);
                }
                let parsed = parse_page(&body, &final_url);
                let added = emails.extend(&parsed.emails);
                debug!(
                    url = %url,
                    found = parsed.emails.len(),
                    new = added,
                    links = parsed.links.len(),
                    "Visited page"
                );
                parsed.links
            }
            other => {
                warn!(url = %url, reason = %other.describe(), "Skipping page");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl EmailCrawler for StaticCrawler {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn crawl(&self, target: &CrawlTarget) -> Result<EmailSet, HarvestError> {
        let snapshot = SnapshotWriter::new(target.snapshot_path());
        let mut visited = VisitedSet::new();
        let mut emails = EmailSet::new();
        let mut frontier = Frontier::seeded(target.root().clone());

        for level in 0..target.max_depth() {
            info!(
                level = level + 1,
                max_depth = target.max_depth(),
                pages = frontier.len(),
                "Static crawl level"
            );

            let mut next = Frontier::new();
            for url in frontier.into_ordered() {
                if !visited.insert(&url) {
                    continue;
                }

                let links = self.visit(&url, &mut emails, &mut visited).await;
                flush_snapshot(&snapshot, &emails);

                for link in links {
                    if !visited.contains(&link) {
                        next.push(link);
                    }
                }
            }

            frontier = next;
            if frontier.is_empty() {
                debug!(level = level + 1, "No new links, stopping early");
                break;
            }
        }

        info!(
            root = %target.root(),
            pages = visited.len(),
            emails = emails.len(),
            "Static crawl finished"
        );
        Ok(emails)
    }
}
