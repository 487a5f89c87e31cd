//! HTML parser for a fetched page
//!
//! Turns one fetched document into the two things a crawl needs from it:
//! - every email address on any scanned surface
//! - the same-domain links to schedule next

use crate::extract::emails_from_document;
use crate::url::{is_same_domain, resolve_link, url_key};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::{BTreeSet, HashSet};
use url::Url;

static STRUCTURAL_LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("nav a[href], header a[href]").expect("structural link selector is valid")
});

static ANY_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("link selector is valid"));

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Lower-cased addresses found on the page
    pub emails: BTreeSet<String>,

    /// Same-domain, crawlable links in document order, fragment-free
    pub links: Vec<Url>,
}

/// Parses a fetched page
///
/// # Link Extraction Rules
///
/// 1. Links inside `<nav>` and `<header>` are taken first
/// 2. Only when those yield nothing usable are all `<a href>` links taken
/// 3. Relative links resolve against `page_url`
/// 4. A link is kept only if it is crawlable and on the same network
///    location as `page_url`
///
/// `page_url` must be where the document was actually served from, after
/// redirects. A root that redirects to another host (`shop.com` to
/// `www.shop.com`) links to pages on the host it landed on.
///
/// # Example
///
/// ```
/// use lead_harvester::crawler::parse_page;
/// use url::Url;
///
/// let html = r#"<nav><a href="/contact">Contact</a></nav><p>hi@shop.com</p>"#;
/// let url = Url::parse("https://shop.com/").unwrap();
/// let parsed = parse_page(html, &url);
/// assert_eq!(parsed.links[0].as_str(), "https://shop.com/contact");
/// assert!(parsed.emails.contains("hi@shop.com"));
/// ```
pub fn parse_page(html: &str, page_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    let emails = emails_from_document(&document, html);

    let mut links = collect_links(&document, &STRUCTURAL_LINK_SELECTOR, page_url);
    if links.is_empty() {
        links = collect_links(&document, &ANY_LINK_SELECTOR, page_url);
    }

    ParsedPage { emails, links }
}

fn collect_links(document: &Html, selector: &Selector, page_url: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();

    document
        .select(selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, page_url))
        .filter(|link| is_same_domain(page_url.as_str(), link.as_str()))
        .filter(|link| seen.insert(url_key(link)))
        .collect()
}
