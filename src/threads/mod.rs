//! Thread reconstruction
//!
//! Assigns every record a `thread_root_id` and `thread_depth` by walking
//! `in_reply_to` links. The walk is iterative and bounded by
//! [`MAX_THREAD_HOPS`]; cycles and over-long chains resolve to the record
//! itself at depth 0. The pass is pure, so running it on its own output
//! changes nothing.

mod reconstruct;

pub use reconstruct::{dedupe_by_message_id, reconstruct, MAX_THREAD_HOPS};

use crate::storage::{RecordLog, StoreResult};

/// Counts reported after the store has been re-annotated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThreadSummary {
    pub records: usize,
    pub threads: usize,
    pub duplicates_dropped: usize,
}

/// Reads the whole log, annotates threads and rewrites it in place
///
/// Must not run while appends are in flight; the coordinator only calls this
/// after every fetch batch has finished.
pub fn annotate_store(store: &dyn RecordLog) -> StoreResult<ThreadSummary> {
    let records = store.read_all()?;
    tracing::info!(records = records.len(), "Reconstructing threads");

    let (records, duplicates_dropped) = dedupe_by_message_id(records);
    if duplicates_dropped > 0 {
        tracing::warn!(
            duplicates = duplicates_dropped,
            "Dropped records with duplicate message ids"
        );
    }

    let records = reconstruct(records);
    let threads = records.iter().filter(|r| r.is_thread_root()).count();
    store.rewrite_all(&records)?;

    Ok(ThreadSummary {
        records: records.len(),
        threads,
        duplicates_dropped,
    })
}
