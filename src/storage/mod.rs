//! Storage module for persisting crawl output
//!
//! This module owns everything written to disk:
//! - The append-only record log (one JSON object per line)
//! - The crawl-progress state file
//!
//! Other components hand records over by value; nothing outside this module
//! holds on to the files.

mod crawl_state;
mod records;
mod traits;

pub use crawl_state::{CrawlState, CrawlStateStore};
pub use records::JsonlRecordStore;
pub use traits::{RecordLog, StoreError, StoreResult};

use std::io::Write;
use std::path::Path;

/// Replaces `path` with `contents` via a temporary sibling and a rename
///
/// Readers see either the old file or the new one, never a partial write.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent)?;
            parent.to_path_buf()
        }
        None => std::path::PathBuf::from("."),
    };

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let temp_path = parent.join(format!(".{}.tmp", file_name));

    {
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }

    std::fs::rename(&temp_path, path)
}
