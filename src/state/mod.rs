//! State module for tracking crawl progress
//!
//! This module provides the per-period state machine used by the crawl
//! coordinator. Durable progress (which periods are complete) lives in
//! [`crate::storage::CrawlStateStore`]; the states here only exist for the
//! duration of one run.

mod period_state;

pub use period_state::{PeriodProgress, PeriodState};
