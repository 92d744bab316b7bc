//! Configuration module for Archive-Weaver
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A missing configuration file is not an error: [`Config::default`] targets the
//! isocpp `std-proposals` archive.
//!
//! # Example
//!
//! ```no_run
//! use archive_weaver::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("weaver.toml")).unwrap();
//! println!("Crawling {}", config.archive.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ArchiveConfig, Config, CrawlerConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
