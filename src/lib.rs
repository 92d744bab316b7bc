//! Archive-Weaver: a resumable mailing-list archive crawler
//!
//! This crate crawls a paginated mailing-list web archive (or imports local
//! mailbox files), normalizes every message into a [`MessageRecord`], appends
//! the records to a newline-delimited log, and reconstructs conversation
//! threads from reply metadata.

pub mod config;
pub mod crawler;
pub mod mbox;
pub mod message;
pub mod output;
pub mod robots;
pub mod state;
pub mod storage;
pub mod threads;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Archive-Weaver operations
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse failure: {0}")]
    Parse(#[from] ParseFailure),

    #[error("Storage error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("Crawling disallowed by robots policy: {url}")]
    PolicyDenied { url: String },

    #[error("Not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    #[error("Invalid period key: {0}")]
    InvalidPeriod(String),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::PeriodState,
        to: state::PeriodState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors surfaced by the fetch gateway once retries are exhausted
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection error for {url}: {message}")]
    Connection { url: String, message: String },

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Crawling disallowed by robots policy: {url}")]
    PolicyDenied { url: String },
}

impl FetchError {
    /// Timeouts, connection failures and bad statuses are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Connection { .. } | Self::HttpStatus { .. }
        )
    }
}

/// A page or mailbox message that could not be turned into a record
#[derive(Debug, Clone, Error)]
#[error("could not parse {url}: {message}")]
pub struct ParseFailure {
    pub url: String,
    pub message: String,
}

impl ParseFailure {
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for Archive-Weaver operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use message::{MessageRecord, Period};
pub use state::PeriodState;
pub use threads::reconstruct;
