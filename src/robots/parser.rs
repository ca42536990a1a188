//! Robots.txt policy implementation
//!
//! Allow/disallow checks are delegated to the robotstxt crate; the
//! Crawl-delay directive is not covered by it, so that part is parsed
//! here directly.

use robotstxt::DefaultMatcher;

/// The robots.txt policy of one host
///
/// This is a wrapper around the robotstxt crate's types, providing a
/// simplified interface for checking URL permissions and crawl delay.
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    /// Whether to allow all (true = allow all, false = parse content)
    allow_all: bool,
}

impl RobotsPolicy {
    /// Creates a new RobotsPolicy from raw robots.txt content
    ///
    /// # Arguments
    ///
    /// * `content` - The raw robots.txt file content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive policy that allows everything
    ///
    /// This is the fallback when robots.txt cannot be fetched or the
    /// host serves an error status for it.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to check, absolute or path-only
    /// * `user_agent` - The product token to match robots.txt groups with
    ///
    /// # Returns
    ///
    /// * `true` - If the URL is allowed
    /// * `false` - If the URL is disallowed
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            return true;
        }

        // Parse and check on-demand
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Gets the crawl delay for a specific user agent
    ///
    /// A `Crawl-delay` line applies to the user-agent group it appears
    /// under; a `User-agent` line after other directives starts a new
    /// group. A delay for a matching named agent wins over the wildcard
    /// group's delay.
    ///
    /// # Returns
    ///
    /// * `Some(f64)` - The crawl delay in seconds
    /// * `None` - If no applicable crawl delay is specified
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        if self.allow_all || self.content.is_empty() {
            return None;
        }

        let agent = user_agent.to_lowercase();
        let mut group: Vec<String> = Vec::new();
        let mut group_closed = false;
        let mut wildcard_delay: Option<f64> = None;
        let mut agent_delay: Option<f64> = None;

        for line in self.content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if group_closed {
                        group.clear();
                        group_closed = false;
                    }
                    group.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    group_closed = true;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if !delay.is_finite() || delay < 0.0 {
                        continue;
                    }
                    if group.iter().any(|g| g == "*") {
                        wildcard_delay = Some(delay);
                    }
                    if group
                        .iter()
                        .any(|g| g != "*" && !g.is_empty() && agent.contains(g.as_str()))
                    {
                        agent_delay = Some(delay);
                    }
                }
                _ => {
                    // Allow, Disallow, Sitemap and friends close the
                    // current user-agent group
                    group_closed = true;
                }
            }
        }

        agent_delay.or(wildcard_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        let robots = RobotsPolicy::allow_all();
        assert!(robots.is_allowed("/search?q=maps", "linkmap"));
        assert!(robots.is_allowed("/checkout", "linkmap"));
    }

    #[test]
    fn test_parse_disallow_all() {
        let content = "User-agent: *\nDisallow: /";
        let robots = RobotsPolicy::from_content(content);
        assert!(!robots.is_allowed("/", "linkmap"));
        assert!(!robots.is_allowed("/pricing", "linkmap"));
    }

    #[test]
    fn test_parse_disallow_specific() {
        let content = "User-agent: *\nDisallow: /cart";
        let robots = RobotsPolicy::from_content(content);
        assert!(robots.is_allowed("/", "linkmap"));
        assert!(robots.is_allowed("/products", "linkmap"));
        assert!(!robots.is_allowed("/cart", "linkmap"));
        assert!(!robots.is_allowed("/cart/saved", "linkmap"));
    }

    #[test]
    fn test_absolute_url_allowed_check() {
        let content = "User-agent: *\nDisallow: /drafts";
        let robots = RobotsPolicy::from_content(content);
        assert!(robots.is_allowed("https://blog.test/published", "linkmap"));
        assert!(!robots.is_allowed("https://blog.test/drafts", "linkmap"));
    }

    #[test]
    fn test_parse_allow_and_disallow() {
        let content = "User-agent: *\nDisallow: /docs\nAllow: /docs/api";
        let robots = RobotsPolicy::from_content(content);
        assert!(robots.is_allowed("/", "linkmap"));
        assert!(!robots.is_allowed("/docs", "linkmap"));
        assert!(robots.is_allowed("/docs/api", "linkmap"));
    }

    #[test]
    fn test_parse_specific_user_agent() {
        let content = "User-agent: scrapebot\nDisallow: /\n\nUser-agent: *\nAllow: /";
        let robots = RobotsPolicy::from_content(content);
        assert!(robots.is_allowed("/pricing", "linkmap"));
        assert!(!robots.is_allowed("/pricing", "scrapebot"));
    }

    #[test]
    fn test_invalid_robots_txt() {
        let content = "%% none of this is a robots directive %%";
        let robots = RobotsPolicy::from_content(content);
        // Unparseable content falls back to allowing everything
        assert!(robots.is_allowed("/anything", "linkmap"));
    }

    #[test]
    fn test_empty_robots_txt() {
        let robots = RobotsPolicy::from_content("");
        assert!(robots.is_allowed("/anything", "linkmap"));
    }

    #[test]
    fn test_crawl_delay_wildcard() {
        let content = "User-agent: *\nCrawl-delay: 8\nDisallow: /search";
        let robots = RobotsPolicy::from_content(content);
        assert_eq!(robots.crawl_delay("linkmap"), Some(8.0));
        assert_eq!(robots.crawl_delay("archiver"), Some(8.0));
    }

    #[test]
    fn test_crawl_delay_specific_agent() {
        let content = "User-agent: linkmap\nCrawl-delay: 1.5\n\nUser-agent: *\nCrawl-delay: 6";
        let robots = RobotsPolicy::from_content(content);
        assert_eq!(robots.crawl_delay("linkmap"), Some(1.5));
        assert_eq!(robots.crawl_delay("archiver"), Some(6.0));
    }

    #[test]
    fn test_crawl_delay_no_delay() {
        let content = "User-agent: *\nDisallow: /search";
        let robots = RobotsPolicy::from_content(content);
        assert_eq!(robots.crawl_delay("linkmap"), None);
    }

    #[test]
    fn test_crawl_delay_decimal() {
        let content = "User-agent: *\nCrawl-delay: 0.25";
        let robots = RobotsPolicy::from_content(content);
        assert_eq!(robots.crawl_delay("linkmap"), Some(0.25));
    }

    #[test]
    fn test_crawl_delay_allow_all() {
        let robots = RobotsPolicy::allow_all();
        assert_eq!(robots.crawl_delay("linkmap"), None);
    }

    #[test]
    fn test_crawl_delay_case_insensitive() {
        let content = "User-agent: LinkMap\ncrawl-delay: 12";
        let robots = RobotsPolicy::from_content(content);
        assert_eq!(robots.crawl_delay("linkmap"), Some(12.0));
        assert_eq!(robots.crawl_delay("LINKMAP"), Some(12.0));
    }

    #[test]
    fn test_crawl_delay_multiple_user_agents() {
        let content = "User-agent: mirrorbot\nUser-agent: linkmap\nCrawl-delay: 2";
        let robots = RobotsPolicy::from_content(content);
        assert_eq!(robots.crawl_delay("mirrorbot"), Some(2.0));
        assert_eq!(robots.crawl_delay("linkmap"), Some(2.0));
        assert_eq!(robots.crawl_delay("archiver"), None);
    }

    #[test]
    fn test_crawl_delay_group_after_rules() {
        // The second User-agent line follows a Disallow, so it starts a
        // fresh group rather than extending the first one
        let content =
            "User-agent: mirrorbot\nDisallow: /tag\nUser-agent: linkmap\nCrawl-delay: 4";
        let robots = RobotsPolicy::from_content(content);
        assert_eq!(robots.crawl_delay("mirrorbot"), None);
        assert_eq!(robots.crawl_delay("linkmap"), Some(4.0));
    }

    #[test]
    fn test_crawl_delay_negative_ignored() {
        let content = "User-agent: *\nCrawl-delay: -3";
        let robots = RobotsPolicy::from_content(content);
        assert_eq!(robots.crawl_delay("linkmap"), None);
    }

    #[test]
    fn test_crawl_delay_unparseable_ignored() {
        let content = "User-agent: *\nCrawl-delay: soon";
        let robots = RobotsPolicy::from_content(content);
        assert_eq!(robots.crawl_delay("linkmap"), None);
    }
}
