//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent
//! - A process-wide cap on requests in flight (shared semaphore)
//! - Retry with exponential backoff for transient failures
//! - The robots.txt gate, consulted before the first fetch
//! - An optional politeness delay after each successful fetch

use crate::config::{Config, CrawlerConfig, UserAgentConfig};
use crate::robots::RobotsGate;
use crate::FetchError;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use archive_weaver::config::UserAgentConfig;
/// use archive_weaver::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), 30).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Creates the limiter shared by every fetch in one run
pub fn request_limiter(config: &CrawlerConfig) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(config.max_concurrent_requests as usize))
}

/// How many attempts to make and how long to wait between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per URL, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }

    /// Delay after failed attempt `attempt` (1-based): base · 2^(attempt-1), clamped
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

/// Rate-limited, retrying HTTP gateway
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Timeout | Retry with backoff |
/// | Connection failure | Retry with backoff |
/// | Non-2xx status | Retry with backoff |
/// | Malformed URL | Fail immediately |
/// | robots.txt disallows archive | Fail immediately, nothing fetched |
#[derive(Debug)]
pub struct FetchGateway {
    client: Client,
    limiter: Arc<Semaphore>,
    retry: RetryPolicy,
    crawl_delay: Duration,
    robots: RobotsGate,
}

impl FetchGateway {
    /// Assembles a gateway from its parts
    ///
    /// The limiter is passed in rather than created here so that the caller
    /// decides which fetches share a concurrency budget.
    pub fn new(
        client: Client,
        limiter: Arc<Semaphore>,
        retry: RetryPolicy,
        crawl_delay: Duration,
        robots: RobotsGate,
    ) -> Self {
        Self {
            client,
            limiter,
            retry,
            crawl_delay,
            robots,
        }
    }

    /// Builds a gateway for the archive described by `config`
    pub fn from_config(config: &Config, limiter: Arc<Semaphore>) -> Result<Self, FetchError> {
        let client = build_http_client(&config.user_agent, config.crawler.request_timeout_secs)
            .map_err(|e| FetchError::InvalidUrl {
                url: config.archive.base_url.clone(),
                message: format!("failed to build HTTP client: {}", e),
            })?;
        let robots = RobotsGate::new(&config.archive.base_url, &config.user_agent.crawler_name)?;

        Ok(Self::new(
            client,
            limiter,
            RetryPolicy::from_config(&config.crawler),
            Duration::from_millis(config.crawler.crawl_delay_ms),
            robots,
        ))
    }

    /// Consults robots.txt (once per gateway) and fails if crawling is disallowed
    pub async fn ensure_permitted(&self) -> Result<(), FetchError> {
        self.robots.ensure_permitted(&self.client).await
    }

    /// Fetches `url` and returns the body text
    ///
    /// Retryable failures are retried up to the policy's attempt limit; the
    /// last error is returned once attempts run out.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.ensure_permitted().await?;

        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let mut attempt = 1;
        loop {
            match self.fetch_once(&parsed).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    tracing::debug!(
                        url = %url,
                        attempt,
                        "Fetch failed ({}), retrying in {:?}",
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::warn!(url = %url, attempts = attempt, "Fetch failed: {}", e);
                    return Err(e);
                }
            }
        }
    }

    /// One attempt, holding a limiter permit for its whole duration
    async fn fetch_once(&self, url: &Url) -> Result<String, FetchError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| FetchError::Connection {
                url: url.to_string(),
                message: "request limiter closed".to_string(),
            })?;

        tracing::debug!(url = %url, "Fetching");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| classify_error(url, e))?;

        if !self.crawl_delay.is_zero() {
            tokio::time::sleep(self.crawl_delay).await;
        }

        Ok(body)
    }
}

/// Maps a reqwest error onto the fetch error taxonomy
fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_builder() {
        FetchError::InvalidUrl {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        FetchError::Connection {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
