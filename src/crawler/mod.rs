//! Crawler module for archive fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a shared request limiter and retry logic
//! - Period and message-link discovery
//! - Message page parsing
//! - Overall crawl coordination

mod coordinator;
pub mod discovery;
mod fetcher;
pub mod parser;

pub use coordinator::{run_crawl, run_incremental, Coordinator};
pub use discovery::{discover, parse_message_links, parse_period_links, PeriodFilter, PeriodTarget};
pub use fetcher::{build_http_client, request_limiter, FetchGateway, RetryPolicy};
pub use parser::{parse_message_page, HeaderStrategy, PageParser};
