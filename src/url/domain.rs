use url::Url;

/// Returns the network location (`host[:port]`) of a URL, lower-cased
///
/// Default ports are already dropped by the `url` crate, so
/// `https://example.com:443/` and `https://example.com/` share a location.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use lead_harvester::url::network_location;
///
/// let url = Url::parse("https://EXAMPLE.com:8080/path").unwrap();
/// assert_eq!(network_location(&url), Some("example.com:8080".to_string()));
/// ```
pub fn network_location(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Returns true if both URLs share the same network location
///
/// Only `host[:port]` is compared; scheme and path are ignored. Anything
/// that does not parse as an absolute URL is never on the same domain.
///
/// # Examples
///
/// ```
/// use lead_harvester::url::is_same_domain;
///
/// assert!(is_same_domain("https://a.com/x", "https://a.com/y"));
/// assert!(!is_same_domain("https://a.com", "https://b.com"));
/// ```
pub fn is_same_domain(base: &str, candidate: &str) -> bool {
    let (Ok(base), Ok(candidate)) = (Url::parse(base), Url::parse(candidate)) else {
        return false;
    };

    match (network_location(&base), network_location(&candidate)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
