//! Normalized message records and the rules shared by every parsing path
//!
//! Both the archive page parser and the mailbox adapter produce a
//! [`MessageRecord`]; the text helpers in [`text`] and the date parsing in
//! [`dates`] are the single implementation both paths go through, so the
//! same raw body always yields the same `body_clean` and `body_new_content`.

pub mod dates;
pub mod text;

pub use dates::{parse_mail_date, resolve_date};
pub use text::{
    extract_new_content, normalize_subject, parse_author_name, parse_references,
    strip_quoted_lines, BodyVariants,
};

use crate::ArchiveError;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Period key used for messages whose month cannot be determined
pub const UNKNOWN_PERIOD: &str = "unknown/00";

/// One archived message, the unit of storage in the record log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Stable identifier, unique within the store
    pub message_id: String,

    /// Identifier of the message this one replies to
    #[serde(default)]
    pub in_reply_to: Option<String>,

    /// Referenced ancestors, outermost first
    #[serde(default)]
    pub references: Vec<String>,

    pub subject: String,

    pub author_name: String,

    /// Contact token exactly as the archive published it (already obfuscated)
    pub author_email_obfuscated: String,

    pub date: DateTime<FixedOffset>,

    /// True when `date` is the capture time because the original was unparseable
    #[serde(default)]
    pub date_synthesized: bool,

    pub body_raw: String,

    /// Body without `>` quoted lines
    pub body_clean: String,

    /// Body without quoted lines and attribution lines
    pub body_new_content: String,

    /// URL of the archive page, or a synthetic locator for mailbox imports
    pub source_url: String,

    /// `YYYY/MM`
    #[serde(alias = "month_period")]
    pub period: String,

    /// Filled in by thread reconstruction
    #[serde(default)]
    pub thread_root_id: Option<String>,

    /// Hops to `thread_root_id`; 0 for roots
    #[serde(default)]
    pub thread_depth: u32,
}

impl MessageRecord {
    /// A record is a root when it resolved to itself
    pub fn is_thread_root(&self) -> bool {
        self.thread_root_id.as_deref() == Some(self.message_id.as_str())
    }
}

/// A calendar month of archived messages, displayed as `YYYY/MM`
///
/// Ordering is chronological, which also matches the lexicographic order of
/// the zero-padded display form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: u16,
    month: u8,
}

impl Period {
    pub fn new(year: u16, month: u8) -> Result<Self, ArchiveError> {
        if !(1..=12).contains(&month) || year > 9999 {
            return Err(ArchiveError::InvalidPeriod(format!("{}/{}", year, month)));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    /// Token used inside synthetic message ids (`2024.03`)
    pub fn dotted(&self) -> String {
        format!("{:04}.{:02}", self.year, self.month)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ArchiveError::InvalidPeriod(s.to_string());
        let (year, month) = s.trim().split_once('/').ok_or_else(invalid)?;

        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }

        let year: u16 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        Period::new(year, month).map_err(|_| invalid())
    }
}
