//! Email pattern matching
//!
//! Two passes run over any blob of text or markup:
//!
//! 1. the standard pattern for `local@domain.tld` tokens
//! 2. the obfuscated pattern for `local [at] domain [dot] tld`, rebuilt into
//!    a plain address
//!
//! Every address comes back lower-cased, so case variants collapse. The
//! `html` half applies both passes to each surface of a parsed page.

mod html;
mod patterns;

pub use html::{emails_from_document, text_fragments, visible_text, SCANNED_ATTRIBUTES};
use patterns::{tidy_match, EMAIL_PATTERN, OBFUSCATED_EMAIL_PATTERN};
use std::collections::BTreeSet;

/// Extracts all plain and obfuscated email addresses from `text`
///
/// # Examples
///
/// ```
/// use lead_harvester::extract::extract_emails;
///
/// let emails = extract_emails("Write to Sales@Example.com or john [at] example [dot] com");
/// let emails: Vec<_> = emails.into_iter().collect();
/// assert_eq!(emails, vec!["john@example.com", "sales@example.com"]);
/// ```
pub fn extract_emails(text: &str) -> BTreeSet<String> {
    let mut emails = BTreeSet::new();

    for found in EMAIL_PATTERN.find_iter(text) {
        if let Some(email) = tidy_match(found.as_str()) {
            emails.insert(email);
        }
    }

    for caps in OBFUSCATED_EMAIL_PATTERN.captures_iter(text) {
        let rebuilt = format!("{}@{}.{}", &caps[1], &caps[2], &caps[3]);
        if let Some(email) = tidy_match(&rebuilt) {
            emails.insert(email);
        }
    }

    emails
}

/// Returns the address part of a `mailto:` link, without scheme or query
///
/// Returns None for anything that is not a `mailto:` link.
///
/// # Examples
///
/// ```
/// use lead_harvester::extract::mailto_target;
///
/// assert_eq!(mailto_target("mailto:hi@example.com?subject=Hello"), Some("hi@example.com"));
/// assert_eq!(mailto_target("/contact"), None);
/// ```
pub fn mailto_target(href: &str) -> Option<&str> {
    let href = href.trim();
    let prefix = href.get(..7)?;
    if !prefix.eq_ignore_ascii_case("mailto:") {
        return None;
    }

    let target = &href[7..];
    let target = target.split('?').next().unwrap_or_default().trim();
    if target.is_empty() {
        None
    } else {
        Some(target)
    }
}

/// Runs both extraction passes over the target of a `mailto:` link
pub fn extract_from_mailto(href: &str) -> BTreeSet<String> {
    mailto_target(href)
        .map(extract_emails)
        .unwrap_or_default()
}
