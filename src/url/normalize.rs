use crate::UrlError;
use std::fmt;
use std::hash::{Hash, Hasher};
use url::Url;

/// A URL in linkmap's canonical form.
///
/// Two URLs that canonicalize to the same string are the same page for
/// scheduling, deduplication and reporting purposes. Equality, hashing
/// and display all use the canonical string.
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed or relative
/// 2. Require an `http` or `https` scheme and a host
/// 3. Remove the fragment (everything after `#`)
/// 4. Serialize, then strip trailing slashes from the serialized form
///
/// The host is lowercased and the default port elided by the parser, so
/// `HTTPS://Example.COM:443/a/` and `https://example.com/a` compare
/// equal. Query strings are preserved as-is.
///
/// # Examples
///
/// ```
/// use linkmap::url::CanonicalUrl;
///
/// let url = CanonicalUrl::parse("https://Example.com/docs/#intro").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs");
/// ```
#[derive(Debug, Clone)]
pub struct CanonicalUrl {
    /// Parsed form, fragment already removed. The path keeps its
    /// trailing slash here so it stays usable as a join base.
    parsed: Url,
    /// Canonical string form used for identity
    canonical: String,
}

impl CanonicalUrl {
    /// Parses and canonicalizes a URL string.
    ///
    /// # Arguments
    ///
    /// * `url_str` - The URL string to canonicalize
    ///
    /// # Returns
    ///
    /// * `Ok(CanonicalUrl)` - Canonical form of the URL
    /// * `Err(UrlError)` - The URL is malformed, relative, has an
    ///   unsupported scheme, or has no host
    pub fn parse(url_str: &str) -> Result<Self, UrlError> {
        let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
        Self::from_url(url)
    }

    /// Canonicalizes an already parsed URL.
    pub fn from_url(mut url: Url) -> Result<Self, UrlError> {
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

        // The parser always serializes at least a "/" path, so stripping
        // trailing slashes also maps the bare origin and the root page to
        // the same canonical string
        let canonical = url.as_str().trim_end_matches('/').to_string();

        Ok(Self {
            parsed: url,
            canonical,
        })
    }

    /// The canonical string form
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// The parsed URL, for host, port and path inspection
    pub fn url(&self) -> &Url {
        &self.parsed
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl PartialEq for CanonicalUrl {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for CanonicalUrl {}

impl Hash for CanonicalUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}
