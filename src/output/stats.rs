//! Run statistics
//!
//! Counters are bumped concurrently by period and message tasks while a run is
//! in progress, then frozen into a [`RunSummary`] once every batch is done.

use crate::threads::ThreadSummary;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Live counters shared by the tasks of one run
#[derive(Debug, Default)]
pub struct RunCounters {
    periods_processed: AtomicUsize,
    periods_failed: AtomicUsize,
    periods_skipped: AtomicUsize,
    messages_written: AtomicUsize,
    errors: AtomicUsize,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn period_processed(&self) {
        self.periods_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// A failed period also counts as one error
    pub fn period_failed(&self) {
        self.periods_failed.fetch_add(1, Ordering::Relaxed);
        self.error();
    }

    pub fn periods_skipped(&self, count: usize) {
        self.periods_skipped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn message_written(&self) {
        self.messages_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn error(&self) {
        self.add_errors(1);
    }

    pub fn add_errors(&self, count: usize) {
        self.errors.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_periods_processed(&self, count: usize) {
        self.periods_processed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn messages_written(&self) -> usize {
        self.messages_written.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    /// Freezes the counters into a summary
    pub fn summarize(&self, threads: Option<ThreadSummary>, elapsed: Duration) -> RunSummary {
        let threads = threads.unwrap_or_default();
        RunSummary {
            periods_processed: self.periods_processed.load(Ordering::Relaxed),
            periods_failed: self.periods_failed.load(Ordering::Relaxed),
            periods_skipped: self.periods_skipped.load(Ordering::Relaxed),
            messages_written: self.messages_written(),
            errors: self.errors(),
            records: threads.records,
            threads: threads.threads,
            duplicates_dropped: threads.duplicates_dropped,
            elapsed,
        }
    }
}

/// Final report of a crawl or import run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Periods whose messages were all attempted and which are now complete
    pub periods_processed: usize,

    /// Periods whose index page could not be retrieved
    pub periods_failed: usize,

    /// Periods already complete from an earlier run
    pub periods_skipped: usize,

    pub messages_written: usize,

    /// Failed periods plus failed message fetches and parses
    pub errors: usize,

    /// Records in the store after thread reconstruction
    pub records: usize,

    pub threads: usize,

    pub duplicates_dropped: usize,

    pub elapsed: Duration,
}

impl RunSummary {
    /// Emits the summary as one structured log event
    pub fn log(&self) {
        tracing::info!(
            periods_processed = self.periods_processed,
            periods_failed = self.periods_failed,
            periods_skipped = self.periods_skipped,
            messages_written = self.messages_written,
            errors = self.errors,
            records = self.records,
            threads = self.threads,
            elapsed_secs = self.elapsed.as_secs_f64(),
            "Run complete"
        );
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &RunSummary) {
    println!("=== Run Summary ===\n");

    println!("Periods:");
    println!("  Processed: {}", summary.periods_processed);
    println!("  Failed: {}", summary.periods_failed);
    println!("  Skipped (already complete): {}", summary.periods_skipped);
    println!();

    println!("Messages:");
    println!("  Written this run: {}", summary.messages_written);
    println!("  Records in store: {}", summary.records);
    println!("  Threads: {}", summary.threads);
    if summary.duplicates_dropped > 0 {
        println!("  Duplicates dropped: {}", summary.duplicates_dropped);
    }
    println!();

    println!("Errors: {}", summary.errors);
    println!("Elapsed: {:.1}s", summary.elapsed.as_secs_f64());
}
