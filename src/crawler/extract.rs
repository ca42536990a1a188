//! Link extraction from HTML documents
//!
//! Pulls candidate URLs out of a fetched page: anchors plus referenced
//! resources (stylesheets, images, scripts). Everything is resolved
//! against the page's final URL, canonicalized, and deduplicated while
//! preserving document order.

use crate::url::CanonicalUrl;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements and attributes that contribute discovered URLs
const LINK_SELECTOR: &str = "a[href], link[href], img[src], script[src]";

/// Capability trait for extracting URLs from a page body
///
/// The production implementation parses HTML; tests can substitute a
/// canned one.
pub trait LinkExtractor: Send + Sync {
    /// Returns the URLs found in `html`, resolved against `base_url`.
    ///
    /// Cross-domain URLs are included; scoping them is the caller's
    /// concern. Unresolvable or non-HTTP(S) references are dropped.
    fn extract(&self, html: &str, base_url: &Url) -> Vec<CanonicalUrl>;
}

/// scraper-backed [`LinkExtractor`]
pub struct HtmlLinkExtractor;

impl LinkExtractor for HtmlLinkExtractor {
    fn extract(&self, html: &str, base_url: &Url) -> Vec<CanonicalUrl> {
        let document = Html::parse_document(html);
        let Ok(selector) = Selector::parse(LINK_SELECTOR) else {
            return Vec::new();
        };

        let mut links = Vec::new();
        let mut seen = HashSet::new();

        for element in document.select(&selector) {
            let tag = element.value().name();
            let attr = if tag == "img" || tag == "script" {
                "src"
            } else {
                "href"
            };

            // Anchors marked as downloads point at files, not pages
            if tag == "a" && element.value().attr("download").is_some() {
                continue;
            }

            let Some(raw) = element.value().attr(attr) else {
                continue;
            };
            let Some(url) = resolve_link(raw, base_url) else {
                continue;
            };
            if seen.insert(url.clone()) {
                links.push(url);
            }
        }

        links
    }
}

/// Resolves a raw href/src value to a canonical URL
///
/// Returns None for values that are not crawlable page references:
/// empty strings, fragment-only links, and non-HTTP(S) schemes such as
/// `javascript:`, `mailto:`, `tel:` and `data:`.
fn resolve_link(raw: &str, base_url: &Url) -> Option<CanonicalUrl> {
    let trimmed = raw.trim();

    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let lowered = trimmed.to_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let resolved = base_url.join(trimmed).ok()?;
    CanonicalUrl::from_url(resolved).ok()
}
