//! Storage traits and error types
//!
//! This module defines the trait interface for the record log and the
//! associated error type.

use crate::message::MessageRecord;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt state file {}: {message}", path.display())]
    CorruptState { path: PathBuf, message: String },

    #[error("Storage lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for record log backends
///
/// Appends may come from many concurrent writers; each append must land as
/// one complete record. `rewrite_all` replaces the whole log and must not run
/// while appends are in flight.
pub trait RecordLog: Send + Sync {
    /// Durably appends one record
    fn append(&self, record: &MessageRecord) -> StoreResult<()>;

    /// Reads every well-formed record; malformed entries are skipped
    fn read_all(&self) -> StoreResult<Vec<MessageRecord>>;

    /// Replaces the log with exactly `records`
    fn rewrite_all(&self, records: &[MessageRecord]) -> StoreResult<()>;
}
