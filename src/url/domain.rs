use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Arguments
///
/// * `url` - The URL to extract the domain from
///
/// # Returns
///
/// * `Some(String)` - The lowercase domain/host
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use linkmap::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("https://sub.example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("sub.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// The host plus effective port of a URL, used as the politeness key for
/// rate limiting and robots.txt caching.
///
/// The port falls back to the scheme default when none is written out,
/// so `https://example.com` and `https://example.com:443` share a key.
pub fn authority(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    match url.port_or_known_default() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    }
}

/// Reports whether two URLs belong to the same domain for crawl scope
/// purposes.
///
/// Hosts must match exactly (case-insensitive), so a subdomain is a
/// different domain. Effective ports must match too: an explicit default
/// port equals the bare form, while any other port is a separate domain.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use linkmap::url::is_same_domain;
///
/// let a = Url::parse("https://example.com/a").unwrap();
/// let b = Url::parse("https://example.com:443/b").unwrap();
/// let sub = Url::parse("https://blog.example.com/").unwrap();
/// assert!(is_same_domain(&a, &b));
/// assert!(!is_same_domain(&a, &sub));
/// ```
pub fn is_same_domain(url: &Url, reference: &Url) -> bool {
    match (url.host_str(), reference.host_str()) {
        (Some(a), Some(b)) => {
            a.eq_ignore_ascii_case(b)
                && url.port_or_known_default() == reference.port_or_known_default()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_subdomain() {
        let url = Url::parse("https://blog.example.com/post").unwrap();
        assert_eq!(extract_domain(&url), Some("blog.example.com".to_string()));
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_uppercase_converted_to_lowercase() {
        let url = Url::parse("https://EXAMPLE.COM/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_authority_includes_default_port() {
        let url = Url::parse("https://example.com/page").unwrap();
        assert_eq!(authority(&url), "example.com:443");

        let url = Url::parse("http://example.com/page").unwrap();
        assert_eq!(authority(&url), "example.com:80");
    }

    #[test]
    fn test_authority_explicit_port() {
        let url = Url::parse("http://example.com:8080/").unwrap();
        assert_eq!(authority(&url), "example.com:8080");
    }

    #[test]
    fn test_authority_matches_for_explicit_default_port() {
        let bare = Url::parse("https://example.com/").unwrap();
        let explicit = Url::parse("https://example.com:443/").unwrap();
        assert_eq!(authority(&bare), authority(&explicit));
    }

    #[test]
    fn test_same_domain_same_host() {
        let a = Url::parse("https://example.com/a").unwrap();
        let b = Url::parse("https://example.com/b?q=1").unwrap();
        assert!(is_same_domain(&a, &b));
    }

    #[test]
    fn test_same_domain_case_insensitive() {
        let a = Url::parse("https://EXAMPLE.com/a").unwrap();
        let b = Url::parse("https://example.COM/b").unwrap();
        assert!(is_same_domain(&a, &b));
    }

    #[test]
    fn test_subdomain_is_different_domain() {
        let root = Url::parse("https://example.com/").unwrap();
        let sub = Url::parse("https://blog.example.com/").unwrap();
        assert!(!is_same_domain(&root, &sub));
    }

    #[test]
    fn test_different_domain() {
        let a = Url::parse("https://example.com/").unwrap();
        let b = Url::parse("https://example.org/").unwrap();
        assert!(!is_same_domain(&a, &b));
    }

    #[test]
    fn test_explicit_default_port_is_same_domain() {
        let bare = Url::parse("https://example.com/").unwrap();
        let explicit = Url::parse("https://example.com:443/").unwrap();
        assert!(is_same_domain(&bare, &explicit));
    }

    #[test]
    fn test_non_default_port_is_different_domain() {
        let bare = Url::parse("https://example.com/").unwrap();
        let alt = Url::parse("https://example.com:8443/").unwrap();
        assert!(!is_same_domain(&bare, &alt));
    }

    #[test]
    fn test_scheme_switch_changes_effective_port() {
        let https = Url::parse("https://example.com/").unwrap();
        let http = Url::parse("http://example.com/").unwrap();
        assert!(!is_same_domain(&https, &http));
    }
}
