//! Robots.txt parser implementation
//!
//! Google's matching rules come from the robotstxt crate. On top of those, a
//! `Disallow` line naming the archive's path prefix blocks the archive no
//! matter which user-agent group it sits in.

use robotstxt::DefaultMatcher;
use url::Url;

/// Parsed robots.txt data
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    /// Whether to allow all (true = allow all, false = parse content)
    allow_all: bool,
}

impl RobotsPolicy {
    /// Creates a new RobotsPolicy from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive policy
    ///
    /// Used when robots.txt is missing or cannot be fetched.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Checks whether `url` may be crawled by `user_agent`
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL of the archive root (or any page under it)
    /// * `user_agent` - Product token, e.g. `ArchiveWeaver`
    pub fn is_allowed(&self, url: &Url, user_agent: &str) -> bool {
        if self.allow_all || self.content.trim().is_empty() {
            return true;
        }

        if self.disallows_prefix(url.path()) {
            return false;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url.as_str())
    }

    /// True if any `Disallow` value is a non-root prefix of `path`
    fn disallows_prefix(&self, path: &str) -> bool {
        self.content.lines().any(|line| {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                return false;
            };
            if !key.trim().eq_ignore_ascii_case("disallow") {
                return false;
            }

            let rule = value.trim().trim_end_matches('/');
            !rule.is_empty() && path.starts_with(rule)
        })
    }
}
