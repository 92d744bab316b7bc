//! Output module for reporting run results
//!
//! The record log itself is owned by [`crate::storage`]; this module only
//! covers what a run tells the operator when it finishes.

pub mod stats;

pub use stats::{print_summary, RunCounters, RunSummary};
