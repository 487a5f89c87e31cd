use crate::url::domain::network_location;
use crate::url::is_crawlable;
use crate::UrlError;
use url::Url;

/// Parses a crawl root URL
///
/// # Rules
///
/// 1. Parse the URL; reject if malformed
/// 2. Only `http` and `https` schemes are accepted
/// 3. A host is required
/// 4. The fragment is dropped
///
/// # Examples
///
/// ```
/// use lead_harvester::url::parse_root;
///
/// let url = parse_root("https://example.com/#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/");
/// assert!(parse_root("ftp://example.com/").is_err());
/// ```
pub fn parse_root(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);
    Ok(url)
}

/// Builds the visited-set identity of a URL: scheme, network location and path
///
/// The query string and fragment are not part of the identity, so
/// `/page#a`, `/page#b` and `/page?x=1` all collapse to one key.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use lead_harvester::url::url_key;
///
/// let a = Url::parse("https://example.com/about#team").unwrap();
/// let b = Url::parse("https://EXAMPLE.com/about").unwrap();
/// assert_eq!(url_key(&a), url_key(&b));
/// ```
pub fn url_key(url: &Url) -> String {
    format!(
        "{}://{}{}",
        url.scheme(),
        network_location(url).unwrap_or_default(),
        url.path()
    )
}

/// Resolves a raw `href` against the page it was found on
///
/// Returns None if the link should be excluded:
/// - not crawlable (see [`is_crawlable`])
/// - not resolvable against `base`
/// - not HTTP(S) after resolution (`javascript:`, `data:` and friends)
///
/// The fragment of the resolved URL is stripped.
pub fn resolve_link(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();

    if !is_crawlable(href) {
        return None;
    }

    let mut absolute = base.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }

    absolute.set_fragment(None);
    Some(absolute)
}
