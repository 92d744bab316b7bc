//! Local mailbox import
//!
//! Reads a directory of `.mbox` files, converts each message with the same
//! rules the archive page parser uses, appends the records to the record log
//! and re-annotates threads over the whole log.

mod parser;
mod reader;

pub use parser::{
    parse_directory, parse_mailboxes, parse_mbox_file, parse_message, period_from_filename,
    ParsedMailbox,
};
pub use reader::split_messages;

use crate::config::Config;
use crate::output::{RunCounters, RunSummary};
use crate::storage::{JsonlRecordStore, RecordLog};
use crate::threads::annotate_store;
use crate::ArchiveError;
use std::path::Path;
use std::time::Instant;

/// Imports every mailbox in `dir` into the configured record log
///
/// Fails up front when `dir` is not a directory. Records whose `message_id`
/// is already in the log are dropped by the thread-annotation rewrite, so
/// importing the same directory twice leaves one copy of each message.
pub fn import_mbox_directory(config: &Config, dir: &Path) -> Result<RunSummary, ArchiveError> {
    let start_time = Instant::now();
    let parsed = parse_mailboxes(dir, &config.archive.base_url)?;

    let counters = RunCounters::new();
    counters.add_periods_processed(parsed.files);
    counters.add_errors(parsed.skipped);

    let store = JsonlRecordStore::new(&config.output.records_path);
    for record in &parsed.records {
        store.append(record)?;
        counters.message_written();
    }

    let threads = annotate_store(&store)?;
    let summary = counters.summarize(Some(threads), start_time.elapsed());
    summary.log();
    Ok(summary)
}
