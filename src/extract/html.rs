use super::{extract_emails, extract_from_mailto};
use once_cell::sync::Lazy;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;

/// Attributes that sites use to stash addresses outside the visible text
pub const SCANNED_ATTRIBUTES: &[&str] = &["title", "alt", "data-email", "data-contact", "content"];

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

static SCRIPT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script").expect("script selector is valid"));

/// Returns the trimmed, non-empty text fragments below `root`
///
/// Text inside `<script>` and `<style>` is not visible and is skipped.
pub fn text_fragments(root: ElementRef<'_>) -> Vec<&str> {
    root.descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => {
                let hidden = node.ancestors().any(|ancestor| {
                    ancestor
                        .value()
                        .as_element()
                        .is_some_and(|el| matches!(el.name(), "script" | "style"))
                });
                if hidden {
                    None
                } else {
                    Some(text.trim())
                }
            }
            _ => None,
        })
        .filter(|text| !text.is_empty())
        .collect()
}

/// Visible text of a whole document, fragments joined by a single space
pub fn visible_text(document: &Html) -> String {
    text_fragments(document.root_element()).join(" ")
}

/// Runs the email matcher over every surface of a parsed page
///
/// Surfaces: the raw markup, the visible text, `mailto:` targets, the
/// [`SCANNED_ATTRIBUTES`], inline script bodies and HTML comments.
pub fn emails_from_document(document: &Html, raw_html: &str) -> BTreeSet<String> {
    let mut emails = extract_emails(raw_html);
    emails.extend(extract_emails(&visible_text(document)));

    for anchor in document.select(&ANCHOR_SELECTOR) {
        if let Some(href) = anchor.value().attr("href") {
            emails.extend(extract_from_mailto(href));
        }
    }

    for element in document.root_element().descendants().filter_map(ElementRef::wrap) {
        for attr in SCANNED_ATTRIBUTES {
            if let Some(value) = element.value().attr(attr) {
                emails.extend(extract_emails(value));
            }
        }
    }

    for script in document.select(&SCRIPT_SELECTOR) {
        let body: String = script.text().collect();
        emails.extend(extract_emails(&body));
    }

    for node in document.tree.root().descendants() {
        if let Node::Comment(comment) = node.value() {
            emails.extend(extract_emails(comment));
        }
    }

    emails
}
