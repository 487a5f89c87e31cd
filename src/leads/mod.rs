//! Lead pipeline: places search, per-site crawl, relevance filter
//!
//! The crawler only needs three capabilities from the outside world, each
//! behind a trait so the batch logic can run against fakes:
//! - [`PlaceSearch`] turns a query into businesses
//! - [`SiteScraper`] crawls one business website
//! - [`EmailFilter`] narrows an address list down to the relevant ones

mod filter;
mod pipeline;
mod places;

pub use filter::{parse_reply, OpenRouterFilter, PassThroughFilter};
pub use pipeline::LeadPipeline;
pub use places::GooglePlacesClient;

use crate::worker::WorkerOutcome;
use crate::HarvestError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Scrape error for a business without a website
pub const NO_WEBSITE: &str = "No Website Found";

/// Scrape error for a worker that failed or produced no valid result
pub const WEBSITE_REFUSED: &str = "Website Refused";

/// Scrape error for a worker killed at the wall-clock limit
pub const TIMEOUT_EXCEEDED: &str = "Timeout Exceeded";

/// A business as returned by the places directory
///
/// Fields the directory leaves out are empty, never missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub website_url: String,
    pub national_phone: String,
    pub international_phone: String,
    pub address: String,
    pub opening_hours: Vec<String>,
    pub categories: Vec<String>,
}

/// A business with the outcome of crawling its website
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    #[serde(flatten)]
    pub place: Place,

    /// Relevant addresses, sorted
    pub emails: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrape_error: Option<String>,
}

/// Directory lookup of businesses matching a free-text query
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Place>, HarvestError>;
}

/// Relevance filter for harvested addresses
///
/// Implementations should return a subset of `emails`; the pipeline drops
/// anything else.
#[async_trait]
pub trait EmailFilter: Send + Sync {
    async fn filter(&self, business_name: &str, emails: &[String])
        -> Result<Vec<String>, HarvestError>;
}

/// Crawls one website in isolation and reports how it went
#[async_trait]
pub trait SiteScraper: Send + Sync {
    async fn scrape_site(&self, url: &str) -> WorkerOutcome;
}
