//! Crawl-progress state file
//!
//! Tracks which periods have been fully crawled. The only mutation is
//! [`CrawlStateStore::mark_completed`], a read-merge-write under one mutex, so
//! periods finishing in the same batch cannot drop each other's entries.

use crate::message::Period;
use crate::storage::traits::{StoreError, StoreResult};
use crate::storage::write_atomically;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Persisted crawl progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlState {
    /// Period keys (`YYYY/MM`) whose messages are all stored
    #[serde(default, alias = "completed_months")]
    pub completed_periods: BTreeSet<String>,

    /// When a period was last marked complete
    #[serde(default)]
    pub last_crawl: Option<DateTime<Utc>>,
}

impl CrawlState {
    pub fn is_completed(&self, period: &Period) -> bool {
        self.completed_periods.contains(&period.to_string())
    }

    /// The most recent completed period, ignoring keys that don't parse
    pub fn latest_completed(&self) -> Option<Period> {
        self.completed_periods
            .iter()
            .filter_map(|key| key.parse::<Period>().ok())
            .max()
    }
}

/// Owner of the state file
#[derive(Debug)]
pub struct CrawlStateStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CrawlStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the state; a missing file is the empty initial state
    pub fn load(&self) -> StoreResult<CrawlState> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CrawlState::default())
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|e| StoreError::CorruptState {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Loads the state, treating a corrupt file as empty
    ///
    /// Every period is then re-crawled, and the next completion overwrites
    /// the corrupt file with a valid one.
    pub fn load_or_default(&self) -> StoreResult<CrawlState> {
        match self.load() {
            Err(StoreError::CorruptState { path, message }) => {
                tracing::warn!(
                    path = %path.display(),
                    "Crawl state is corrupt, starting from empty state: {}",
                    message
                );
                Ok(CrawlState::default())
            }
            other => other,
        }
    }

    /// Records a period as complete and returns the updated state
    pub fn mark_completed(&self, period: &Period) -> StoreResult<CrawlState> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::LockPoisoned("crawl state"))?;

        let mut state = self.load_or_default()?;
        state.completed_periods.insert(period.to_string());
        state.last_crawl = Some(Utc::now());

        let content = serde_json::to_string_pretty(&state)?;
        write_atomically(&self.path, content.as_bytes())?;
        Ok(state)
    }
}
