use crate::leads::{
    EmailFilter, Lead, Place, PlaceSearch, SiteScraper, NO_WEBSITE, TIMEOUT_EXCEEDED,
    WEBSITE_REFUSED,
};
use crate::worker::WorkerOutcome;
use crate::HarvestError;
use tracing::{info, warn};

/// Batch driver: search, then crawl and filter each business in turn
///
/// A failing site never stops the batch; it is recorded on its lead as a
/// scrape error. Only a failed places search fails the whole run.
pub struct LeadPipeline {
    places: Box<dyn PlaceSearch>,
    scraper: Box<dyn SiteScraper>,
    filter: Box<dyn EmailFilter>,
}

impl LeadPipeline {
    pub fn new(
        places: Box<dyn PlaceSearch>,
        scraper: Box<dyn SiteScraper>,
        filter: Box<dyn EmailFilter>,
    ) -> Self {
        Self {
            places,
            scraper,
            filter,
        }
    }

    /// Runs the batch for `query`, handing each lead to `on_lead` as it completes
    pub async fn run<F>(
        &self,
        query: &str,
        limit: usize,
        mut on_lead: F,
    ) -> Result<Vec<Lead>, HarvestError>
    where
        F: FnMut(&Lead),
    {
        let places = self.places.search(query, limit).await?;
        info!(query, businesses = places.len(), "Starting lead batch");

        let total = places.len();
        let mut leads = Vec::with_capacity(total);
        for (index, place) in places.into_iter().enumerate() {
            info!(
                business = %place.name,
                progress = %format!("{}/{}", index + 1, total),
                "Processing business"
            );
            let lead = self.process_place(place).await;
            on_lead(&lead);
            leads.push(lead);
        }

        Ok(leads)
    }

    /// Crawls and filters one business
    pub async fn process_place(&self, place: Place) -> Lead {
        let url = place.website_url.trim().to_string();
        if url.is_empty() {
            return Lead {
                place,
                emails: Vec::new(),
                scrape_error: Some(NO_WEBSITE.to_string()),
            };
        }

        let (emails, scrape_error) = match self.scraper.scrape_site(&url).await {
            WorkerOutcome::Completed { emails } => (emails, None),
            WorkerOutcome::Failed { error, partial } => {
                warn!(url = %url, error = %error, salvaged = partial.len(), "Site crawl failed");
                (partial, Some(WEBSITE_REFUSED))
            }
            WorkerOutcome::TimedOut { partial } => {
                warn!(url = %url, salvaged = partial.len(), "Site crawl timed out");
                (partial, Some(TIMEOUT_EXCEEDED))
            }
        };

        let emails = self.filter_emails(&place.name, emails).await;
        Lead {
            place,
            emails,
            scrape_error: scrape_error.map(str::to_string),
        }
    }

    /// Applies the relevance filter, keeping only addresses it was given
    ///
    /// A filter error falls back to the unfiltered list.
    async fn filter_emails(&self, business: &str, emails: Vec<String>) -> Vec<String> {
        if emails.is_empty() {
            return emails;
        }

        match self.filter.filter(business, &emails).await {
            Ok(kept) => {
                let mut kept: Vec<String> = kept
                    .into_iter()
                    .filter(|email| emails.contains(email))
                    .collect();
                kept.sort();
                kept.dedup();
                kept
            }
            Err(e) => {
                warn!(business, error = %e, "Relevance filter failed, keeping all emails");
                emails
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    struct FixedPlaces(Vec<Place>);

    #[async_trait]
    impl PlaceSearch for FixedPlaces {
        async fn search(&self, _query: &str, limit: usize) -> Result<Vec<Place>, HarvestError> {
            Ok(self.0.iter().take(limit).cloned().collect())
        }
    }

    struct FailingPlaces;

    #[async_trait]
    impl PlaceSearch for FailingPlaces {
        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<Place>, HarvestError> {
            Err(HarvestError::Places("HTTP 403".to_string()))
        }
    }

    #[derive(Clone, Default)]
    struct CannedScraper {
        outcomes: HashMap<String, WorkerOutcome>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl SiteScraper for CannedScraper {
        async fn scrape_site(&self, url: &str) -> WorkerOutcome {
            self.calls.lock().unwrap().push(url.to_string());
            self.outcomes
                .get(url)
                .cloned()
                .unwrap_or(WorkerOutcome::Completed { emails: Vec::new() })
        }
    }

    /// Keeps addresses on the business's own domain, plus one it made up
    struct DomainFilter;

    #[async_trait]
    impl EmailFilter for DomainFilter {
        async fn filter(
            &self,
            business_name: &str,
            emails: &[String],
        ) -> Result<Vec<String>, HarvestError> {
            let domain = business_name.to_lowercase();
            let mut kept: Vec<String> = emails
                .iter()
                .filter(|e| e.ends_with(&format!("@{}.com", domain)))
                .cloned()
                .collect();
            kept.push(format!("invented@{}.com", domain));
            Ok(kept)
        }
    }

    struct BrokenFilter;

    #[async_trait]
    impl EmailFilter for BrokenFilter {
        async fn filter(&self, _name: &str, _emails: &[String]) -> Result<Vec<String>, HarvestError> {
            Err(HarvestError::Filter("HTTP 500".to_string()))
        }
    }

    fn place(name: &str, website: &str) -> Place {
        Place {
            id: name.to_lowercase(),
            name: name.to_string(),
            website_url: website.to_string(),
            ..Place::default()
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_batch_outcomes() {
        let mut scraper = CannedScraper::default();
        scraper.outcomes.insert(
            "https://alpha.com/".to_string(),
            WorkerOutcome::Completed {
                emails: strings(&["hi@alpha.com", "spam@gmail.com"]),
            },
        );
        scraper.outcomes.insert(
            "https://beta.com/".to_string(),
            WorkerOutcome::Failed {
                error: "Browser error: crashed".to_string(),
                partial: strings(&["ops@beta.com"]),
            },
        );
        scraper.outcomes.insert(
            "https://gamma.com/".to_string(),
            WorkerOutcome::TimedOut {
                partial: strings(&["desk@gamma.com", "x@other.com"]),
            },
        );

        let pipeline = LeadPipeline::new(
            Box::new(FixedPlaces(vec![
                place("Alpha", "https://alpha.com/"),
                place("Beta", "https://beta.com/"),
                place("Gamma", "https://gamma.com/"),
                place("Delta", "  "),
            ])),
            Box::new(scraper.clone()),
            Box::new(DomainFilter),
        );

        let mut seen = Vec::new();
        let leads = pipeline
            .run("shops", 10, |lead| seen.push(lead.place.name.clone()))
            .await
            .unwrap();

        assert_eq!(seen, vec!["Alpha", "Beta", "Gamma", "Delta"]);

        assert_eq!(leads[0].emails, vec!["hi@alpha.com"]);
        assert_eq!(leads[0].scrape_error, None);

        assert_eq!(leads[1].emails, vec!["ops@beta.com"]);
        assert_eq!(leads[1].scrape_error.as_deref(), Some(WEBSITE_REFUSED));

        assert_eq!(leads[2].emails, vec!["desk@gamma.com"]);
        assert_eq!(leads[2].scrape_error.as_deref(), Some(TIMEOUT_EXCEEDED));

        assert!(leads[3].emails.is_empty());
        assert_eq!(leads[3].scrape_error.as_deref(), Some(NO_WEBSITE));

        // no crawl for a business without a website
        assert_eq!(scraper.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_filter_failure_keeps_everything() {
        let mut scraper = CannedScraper::default();
        scraper.outcomes.insert(
            "https://alpha.com/".to_string(),
            WorkerOutcome::Completed {
                emails: strings(&["a@alpha.com", "b@gmail.com"]),
            },
        );

        let pipeline = LeadPipeline::new(
            Box::new(FixedPlaces(vec![place("Alpha", "https://alpha.com/")])),
            Box::new(scraper),
            Box::new(BrokenFilter),
        );
        let leads = pipeline.run("q", 1, |_| {}).await.unwrap();

        assert_eq!(leads[0].emails, vec!["a@alpha.com", "b@gmail.com"]);
        assert_eq!(leads[0].scrape_error, None);
    }

    #[tokio::test]
    async fn test_search_failure_fails_batch() {
        let pipeline = LeadPipeline::new(
            Box::new(FailingPlaces),
            Box::new(CannedScraper::default()),
            Box::new(BrokenFilter),
        );
        let result = pipeline.run("q", 1, |_| {}).await;
        assert!(matches!(result, Err(HarvestError::Places(_))));
    }

    #[tokio::test]
    async fn test_limit_is_passed_to_search() {
        let scraper = CannedScraper::default();
        let pipeline = LeadPipeline::new(
            Box::new(FixedPlaces(vec![
                place("Alpha", "https://alpha.com/"),
                place("Beta", "https://beta.com/"),
            ])),
            Box::new(scraper),
            Box::new(DomainFilter),
        );
        let leads = pipeline.run("q", 1, |_| {}).await.unwrap();
        assert_eq!(leads.len(), 1);
    }
}
