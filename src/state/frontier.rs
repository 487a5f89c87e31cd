use crate::url::{priority_rank, url_key};
use std::collections::HashSet;
use url::Url;

/// URLs scheduled for one breadth-first level
///
/// A frontier is filled while the previous level is crawled and consumed as a
/// whole. It is not a queue: [`Frontier::into_ordered`] hands back every
/// priority link before any other link, each group in discovery order.
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    urls: Vec<Url>,
    keys: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the level-zero frontier holding just the crawl root
    pub fn seeded(root: Url) -> Self {
        let mut frontier = Self::new();
        frontier.push(root);
        frontier
    }

    /// Schedules a URL, returning false if its key is already scheduled
    pub fn push(&mut self, url: Url) -> bool {
        if !self.keys.insert(url_key(&url)) {
            return false;
        }
        self.urls.push(url);
        true
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.keys.contains(&url_key(url))
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Consumes the frontier, priority links first
    pub fn into_ordered(self) -> Vec<Url> {
        let mut urls = self.urls;
        // stable: discovery order is kept inside each group
        urls.sort_by_key(|url| priority_rank(url.as_str()));
        urls
    }
}

/// URL keys crawled in this attempt; the only cycle breaker
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    keys: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a URL visited, returning false if it already was
    pub fn insert(&mut self, url: &Url) -> bool {
        self.keys.insert(url_key(url))
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.keys.contains(&url_key(url))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
