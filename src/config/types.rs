use serde::Deserialize;

/// Main configuration structure for Archive-Weaver
///
/// Every section is optional in the TOML file; missing sections and keys
/// fall back to the values used against the isocpp `std-proposals` archive.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub archive: ArchiveConfig,
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Where the archive lives and which periods are in scope
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Root of the list archive, without a trailing slash
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// List name, used to skip the list-name heading on message pages
    #[serde(rename = "list-name")]
    pub list_name: String,

    /// File name of each period's index page
    #[serde(rename = "index-page")]
    pub index_page: String,

    /// Periods before this year/month are never crawled
    #[serde(rename = "start-year")]
    pub start_year: u16,

    #[serde(rename = "start-month")]
    pub start_month: u8,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: "https://lists.isocpp.org/std-proposals".to_string(),
            list_name: "std-proposals".to_string(),
            index_page: "index.php".to_string(),
            start_year: 2025,
            start_month: 1,
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of requests in flight, process-wide
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: u32,

    /// Number of periods crawled side by side in one batch
    #[serde(rename = "max-concurrent-periods")]
    pub max_concurrent_periods: u32,

    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Attempts per URL, including the first one
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    #[serde(rename = "retry-base-delay-ms")]
    pub retry_base_delay_ms: u64,

    #[serde(rename = "retry-max-delay-ms")]
    pub retry_max_delay_ms: u64,

    /// Fixed pause after each successful fetch (milliseconds)
    #[serde(rename = "crawl-delay-ms")]
    pub crawl_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 10,
            max_concurrent_periods: 3,
            request_timeout_secs: 30,
            max_retries: 5,
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 30_000,
            crawl_delay_ms: 0,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler; also the product token matched against robots rules
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "ArchiveWeaver".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://github.com/archive-weaver/archive-weaver".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the newline-delimited record log
    #[serde(rename = "records-path")]
    pub records_path: String,

    /// Path to the crawl-progress state file
    #[serde(rename = "state-path")]
    pub state_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            records_path: "output/emails.jsonl".to_string(),
            state_path: "output/crawl_state.json".to_string(),
        }
    }
}
