use crate::crawler::{flush_snapshot, EmailCrawler};
use crate::extract::{extract_emails, extract_from_mailto};
use crate::state::{CrawlTarget, EmailSet, Frontier, VisitedSet};
use crate::storage::SnapshotWriter;
use crate::url::{is_same_domain, resolve_link};
use crate::HarvestError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};
use url::Url;

/// Contact-oriented routes tried on every site
///
/// Client-side routers often render these pages without linking them from
/// the landing page, so they are scheduled even when no anchor points there.
pub const COMMON_EMAIL_ROUTES: &[&str] = &[
    "/contact",
    "/contact-us",
    "/get-in-touch",
    "/reach-us",
    "/about",
    "/about-us",
    "/our-story",
    "/company",
    "/team",
    "/support",
    "/info",
    "/information",
    "/legal",
    "/partners",
    "/partnership",
    "/join-us",
    "/feedback",
    "/social",
];

/// What a browser saw after rendering one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RenderedPage {
    /// Serialized DOM after scripts ran
    #[serde(default)]
    pub html: String,

    /// Rendered text of the body
    #[serde(default)]
    pub text: String,

    /// `href` values of `mailto:` anchors
    #[serde(default)]
    pub mailto: Vec<String>,

    /// Anchor targets, structural containers first
    #[serde(default)]
    pub anchors: Vec<String>,

    /// Where the browser ended up, after redirects and client-side routing
    #[serde(default)]
    pub location: String,
}

impl RenderedPage {
    /// Addresses in the markup, the rendered text and the `mailto:` targets
    pub fn emails(&self) -> BTreeSet<String> {
        let mut emails = extract_emails(&self.html);
        emails.extend(extract_emails(&self.text));
        for href in &self.mailto {
            emails.extend(extract_from_mailto(href));
        }
        emails
    }

    /// The page's own URL, or `requested` when the browser did not report one
    pub fn landed_url(&self, requested: &Url) -> Url {
        match Url::parse(self.location.trim()) {
            Ok(mut url) if url.scheme() == "http" || url.scheme() == "https" => {
                url.set_fragment(None);
                url
            }
            _ => requested.clone(),
        }
    }
}

/// One live browser page the dynamic crawler navigates
#[async_trait]
pub trait PageDriver: Send {
    /// Navigates to `url`, waits for it to settle and captures the result
    async fn visit(&mut self, url: &Url) -> Result<RenderedPage, HarvestError>;

    /// Releases the page and its browser
    async fn close(&mut self);
}

/// Starts page drivers, one per crawl attempt
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn PageDriver>, HarvestError>;
}

/// Breadth-first crawler that renders every page in a browser
///
/// Same level structure as the static crawler. Links come from the rendered
/// anchors and are visited by direct navigation, never by clicking. After
/// the root, [`COMMON_EMAIL_ROUTES`] join the next level. Scope follows the
/// host a page landed on, so a root that redirects elsewhere keeps its links.
pub struct DynamicCrawler {
    factory: Box<dyn DriverFactory>,
}

impl DynamicCrawler {
    pub fn new(factory: impl DriverFactory + 'static) -> Self {
        Self {
            factory: Box::new(factory),
        }
    }

    async fn explore(&self, driver: &mut dyn PageDriver, target: &CrawlTarget) -> EmailSet {
        let root = target.root();
        let snapshot = SnapshotWriter::new(target.snapshot_path());
        let mut visited = VisitedSet::new();
        let mut emails = EmailSet::new();
        let mut frontier = Frontier::seeded(root.clone());

        for level in 0..target.max_depth() {
            info!(
                level = level + 1,
                max_depth = target.max_depth(),
                pages = frontier.len(),
                "Dynamic crawl level"
            );

            let mut next = Frontier::new();
            for url in frontier.into_ordered() {
                if !visited.insert(&url) {
                    continue;
                }

                let (landed, links) = match driver.visit(&url).await {
                    Ok(page) => {
                        let landed = page.landed_url(&url);
                        if landed != url {
                            debug!(url = %url, landed = %landed, "Page moved");
                            visited.insert(&landed);
                        }
                        let found = page.emails();
                        let added = emails.extend(&found);
                        debug!(url = %url, found = found.len(), new = added, "Rendered page");
                        let links = same_domain_links(&page.anchors, &landed);
                        (landed, links)
                    }
                    Err(e) => {
                        warn!(url = %url, error = %e, "Page visit failed");
                        (url.clone(), Vec::new())
                    }
                };
                flush_snapshot(&snapshot, &emails);

                if level == 0 {
                    for route in common_routes(&landed) {
                        next.push(route);
                    }
                }

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
            root = %root,
            pages = visited.len(),
            emails = emails.len(),
            "Dynamic crawl finished"
        );
        emails
    }
}

#[async_trait]
impl EmailCrawler for DynamicCrawler {
    fn name(&self) -> &'static str {
        "dynamic"
    }

    async fn crawl(&self, target: &CrawlTarget) -> Result<EmailSet, HarvestError> {
        let mut driver = self.factory.launch().await?;
        let emails = self.explore(driver.as_mut(), target).await;
        driver.close().await;
        Ok(emails)
    }
}

fn common_routes(root: &Url) -> Vec<Url> {
    COMMON_EMAIL_ROUTES
        .iter()
        .filter_map(|route| resolve_link(route, root))
        .collect()
}

fn same_domain_links(anchors: &[String], page: &Url) -> Vec<Url> {
    anchors
        .iter()
        .filter_map(|href| resolve_link(href, page))
        .filter(|link| is_same_domain(page.as_str(), link.as_str()))
        .collect()
}
