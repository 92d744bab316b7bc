//! Newline-delimited JSON record log
//!
//! One [`MessageRecord`] per line. Appends are serialized through a mutex and
//! written with a single `write_all` on a file opened in append mode, so
//! concurrent writers never interleave partial lines.

use crate::message::MessageRecord;
use crate::storage::traits::{RecordLog, StoreError, StoreResult};
use crate::storage::write_atomically;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// JSONL-backed record log
#[derive(Debug)]
pub struct JsonlRecordStore {
    path: PathBuf,
    append_lock: Mutex<()>,
}

impl JsonlRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordLog for JsonlRecordStore {
    fn append(&self, record: &MessageRecord) -> StoreResult<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self
            .append_lock
            .lock()
            .map_err(|_| StoreError::LockPoisoned("record log"))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.sync_data()?;
        Ok(())
    }

    fn read_all(&self) -> StoreResult<Vec<MessageRecord>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let content = String::from_utf8_lossy(&bytes);
        let mut records = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<MessageRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    let preview: String = line.chars().take(100).collect();
                    tracing::warn!(
                        path = %self.path.display(),
                        line = index + 1,
                        error = %e,
                        "Skipping malformed record: {}",
                        preview
                    );
                }
            }
        }

        Ok(records)
    }

    fn rewrite_all(&self, records: &[MessageRecord]) -> StoreResult<()> {
        let mut content = String::new();
        for record in records {
            content.push_str(&serde_json::to_string(record)?);
            content.push('\n');
        }

        let _guard = self
            .append_lock
            .lock()
            .map_err(|_| StoreError::LockPoisoned("record log"))?;
        write_atomically(&self.path, content.as_bytes())?;
        Ok(())
    }
}
