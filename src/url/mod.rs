//! URL handling module for Lead Harvester
//!
//! This module is the link classifier used throughout a crawl: same-domain
//! membership, crawlability of raw `href` values, contact-oriented priority
//! detection, plus URL identity keys and link resolution.

mod domain;
mod normalize;

pub use domain::{is_same_domain, network_location};
pub use normalize::{parse_root, resolve_link, url_key};

/// Keywords marking a link as likely to lead to contact details
pub const PRIORITY_KEYWORDS: &[&str] = &[
    "contact",
    "about",
    "team",
    "support",
    "staff",
    "help",
    "connect",
    "info",
    "impressum",
    "legal",
    "privacy",
    "terms",
];

/// Binary, document and media extensions that are never crawled
pub const BAD_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".svg", ".pdf", ".doc", ".docx", ".xls",
    ".xlsx", ".ppt", ".pptx", ".zip", ".rar", ".7z", ".mp3", ".mp4", ".avi", ".mov", ".wmv",
    ".txt", ".csv",
];

/// Returns true if a raw `href` is worth following
///
/// Rejects empty values, `mailto:`, `tel:` and fragment-only links, and
/// anything ending in a known binary/document/media extension. Every other
/// absolute or relative link is a candidate.
///
/// # Examples
///
/// ```
/// use lead_harvester::url::is_crawlable;
///
/// assert!(is_crawlable("/contact"));
/// assert!(!is_crawlable("mailto:info@example.com"));
/// assert!(!is_crawlable("/brochure.PDF"));
/// ```
pub fn is_crawlable(href: &str) -> bool {
    let href = href.trim().to_lowercase();

    if href.is_empty() {
        return false;
    }

    if href.starts_with("mailto:") || href.starts_with("tel:") || href.starts_with('#') {
        return false;
    }

    !BAD_EXTENSIONS.iter().any(|ext| href.ends_with(ext))
}

/// Returns true if the link text contains a contact-oriented keyword
///
/// # Examples
///
/// ```
/// use lead_harvester::url::is_priority;
///
/// assert!(is_priority("/contact-us"));
/// assert!(!is_priority("/products"));
/// ```
pub fn is_priority(href: &str) -> bool {
    let href = href.to_lowercase();
    PRIORITY_KEYWORDS.iter().any(|keyword| href.contains(keyword))
}

/// Sort rank for frontier ordering: priority links first
pub fn priority_rank(href: &str) -> u8 {
    if is_priority(href) {
        0
    } else {
        1
    }
}
