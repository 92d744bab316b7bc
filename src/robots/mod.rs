//! Robots.txt handling module
//!
//! The archive's robots.txt is consulted once per [`RobotsGate`]; if it
//! forbids the archive path, the whole run stops before any page is fetched.
//! A missing document, or any failure to fetch it, counts as permission.

mod parser;

pub use parser::RobotsPolicy;

use crate::FetchError;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

const ROBOTS_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches and parses robots.txt
///
/// Never fails: not-found and fetch errors both yield [`RobotsPolicy::allow_all`].
pub async fn fetch_robots(client: &Client, robots_url: &Url) -> RobotsPolicy {
    let response = match client
        .get(robots_url.clone())
        .timeout(ROBOTS_TIMEOUT)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(url = %robots_url, "robots.txt fetch failed, allowing crawl: {}", e);
            return RobotsPolicy::allow_all();
        }
    };

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        tracing::debug!(url = %robots_url, "No robots.txt, crawling allowed");
        return RobotsPolicy::allow_all();
    }
    if !status.is_success() {
        tracing::warn!(url = %robots_url, status = status.as_u16(), "robots.txt unavailable, allowing crawl");
        return RobotsPolicy::allow_all();
    }

    match response.text().await {
        Ok(body) => RobotsPolicy::from_content(&body),
        Err(e) => {
            tracing::warn!(url = %robots_url, "robots.txt body unreadable, allowing crawl: {}", e);
            RobotsPolicy::allow_all()
        }
    }
}

/// Crawl-politeness gate for one archive, evaluated at most once
#[derive(Debug)]
pub struct RobotsGate {
    archive_url: Url,
    robots_url: Url,
    user_agent: String,
    verdict: OnceCell<bool>,
}

impl RobotsGate {
    /// Builds the gate for the archive rooted at `archive_url`
    ///
    /// The policy document is looked up at the origin's `/robots.txt`.
    pub fn new(archive_url: &str, user_agent: &str) -> Result<Self, FetchError> {
        let invalid = |message: String| FetchError::InvalidUrl {
            url: archive_url.to_string(),
            message,
        };

        let mut archive_url = Url::parse(archive_url).map_err(|e| invalid(e.to_string()))?;
        if !archive_url.path().ends_with('/') {
            let path = format!("{}/", archive_url.path());
            archive_url.set_path(&path);
        }
        let robots_url = archive_url
            .join("/robots.txt")
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            archive_url,
            robots_url,
            user_agent: user_agent.to_string(),
            verdict: OnceCell::new(),
        })
    }

    pub fn robots_url(&self) -> &Url {
        &self.robots_url
    }

    /// Returns whether crawling the archive is permitted
    ///
    /// The first caller fetches robots.txt; every later call reuses the verdict.
    pub async fn is_permitted(&self, client: &Client) -> bool {
        *self
            .verdict
            .get_or_init(|| async {
                let policy = fetch_robots(client, &self.robots_url).await;
                let allowed = policy.is_allowed(&self.archive_url, &self.user_agent);
                if allowed {
                    tracing::info!(url = %self.robots_url, "robots.txt permits crawling the archive");
                } else {
                    tracing::error!(url = %self.robots_url, "robots.txt disallows crawling the archive");
                }
                allowed
            })
            .await
    }

    /// Like [`Self::is_permitted`], as a `Result` for `?` chains
    pub async fn ensure_permitted(&self, client: &Client) -> Result<(), FetchError> {
        if self.is_permitted(client).await {
            Ok(())
        } else {
            Err(FetchError::PolicyDenied {
                url: self.archive_url.to_string(),
            })
        }
    }
}
