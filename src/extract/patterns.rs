use once_cell::sync::Lazy;
use regex::Regex;

/// Plain `local@domain.tld` addresses
pub(crate) static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z0-9_.+\-]+@[a-zA-Z0-9\-]+\.[a-zA-Z0-9.\-]+")
        .expect("email regex is hardcoded and valid")
});

/// `local [at] domain [dot] tld` with flexible whitespace, any case
///
/// The TLD capture only takes letters and dots, so prose such as
/// `x [at] y [dot] com123` is cut at the first non-letter.
pub(crate) static OBFUSCATED_EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([a-z0-9_.+\-]+)\s*\[at\]\s*([a-z0-9\-]+)\s*\[dot\]\s*([a-z.]+)")
        .expect("obfuscated email regex is hardcoded and valid")
});

/// Trims sentence punctuation the greedy patterns pick up at either end
///
/// Returns None when what is left no longer looks like `local@domain.tld`.
pub(crate) fn tidy_match(candidate: &str) -> Option<String> {
    let trimmed = candidate
        .trim_start_matches(|c| c == '.' || c == '-')
        .trim_end_matches(|c| c == '.' || c == '-');

    let (local, domain) = trimmed.split_once('@')?;
    if local.is_empty() || domain.is_empty() {
        return None;
    }

    let (name, tld) = domain.rsplit_once('.')?;
    if name.is_empty() || tld.is_empty() {
        return None;
    }

    Some(trimmed.to_lowercase())
}
