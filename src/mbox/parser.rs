//! Mailbox message conversion
//!
//! Each message becomes a [`MessageRecord`] using the same body, subject,
//! author and reference rules as the archive page parser. The period comes
//! from the mailbox file name (`2024-03.mbox`, `std-proposals_2024_03.mbox`).

use crate::mbox::reader::split_messages;
use crate::message::{
    normalize_subject, parse_author_name, parse_references, resolve_date, BodyVariants,
    MessageRecord, Period, UNKNOWN_PERIOD,
};
use crate::{ArchiveError, ParseFailure};
use mailparse::{parse_mail, DispositionType, MailHeaderMap, ParsedMail};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static FILENAME_PERIOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})[-_](\d{2})").expect("filename period pattern is valid"));

/// Records recovered from one or more mailbox files
#[derive(Debug, Default)]
pub struct ParsedMailbox {
    pub records: Vec<MessageRecord>,
    /// Messages (or whole files) that could not be read
    pub skipped: usize,
    pub files: usize,
}

impl ParsedMailbox {
    fn absorb(&mut self, other: ParsedMailbox) {
        self.records.extend(other.records);
        self.skipped += other.skipped;
        self.files += other.files;
    }
}

/// Period key for a mailbox file, or `unknown/00` when the name has none
pub fn period_from_filename(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default();

    FILENAME_PERIOD
        .captures(&stem)
        .and_then(|caps| {
            let year = caps[1].parse().ok()?;
            let month = caps[2].parse().ok()?;
            Period::new(year, month).ok()
        })
        .map(|period| period.to_string())
        .unwrap_or_else(|| UNKNOWN_PERIOD.to_string())
}

/// Parses every `.mbox` file in `dir`, in file-name order
pub fn parse_directory(dir: &Path, base_url: &str) -> Result<Vec<MessageRecord>, ArchiveError> {
    Ok(parse_mailboxes(dir, base_url)?.records)
}

/// Like [`parse_directory`], also reporting how much was skipped
pub fn parse_mailboxes(dir: &Path, base_url: &str) -> Result<ParsedMailbox, ArchiveError> {
    if !dir.is_dir() {
        return Err(ArchiveError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "mbox"))
        .collect();
    files.sort();

    tracing::info!(dir = %dir.display(), files = files.len(), "Importing mailbox files");

    let mut parsed = ParsedMailbox::default();
    for file in files {
        let period = period_from_filename(&file);
        match parse_mbox_file(&file, &period, base_url) {
            Ok(mailbox) => parsed.absorb(mailbox),
            Err(e) => {
                tracing::error!(path = %file.display(), "Failed to read mailbox: {}", e);
                parsed.skipped += 1;
            }
        }
    }

    Ok(parsed)
}

/// Parses one mailbox file; malformed messages are logged and skipped
pub fn parse_mbox_file(
    path: &Path,
    period: &str,
    base_url: &str,
) -> Result<ParsedMailbox, ArchiveError> {
    let content = std::fs::read(path)?;
    let source_url = format!("{}/{}/", base_url, period);

    let mut parsed = ParsedMailbox {
        files: 1,
        ..ParsedMailbox::default()
    };

    for (index, raw) in split_messages(&content).iter().enumerate() {
        match parse_message(raw, index, period, &source_url) {
            Ok(record) => parsed.records.push(record),
            Err(e) => {
                tracing::warn!(path = %path.display(), index, "Skipping malformed message: {}", e);
                parsed.skipped += 1;
            }
        }
    }

    tracing::info!(
        path = %path.display(),
        period = %period,
        count = parsed.records.len(),
        "Parsed mailbox"
    );
    Ok(parsed)
}

/// Converts one raw message; `index` is its position within the file
pub fn parse_message(
    raw: &[u8],
    index: usize,
    period: &str,
    source_url: &str,
) -> Result<MessageRecord, ParseFailure> {
    let locator = format!("{}#{}", source_url, index);
    let mail = parse_mail(raw).map_err(|e| ParseFailure::new(&locator, e.to_string()))?;

    let header = |name: &str| {
        mail.headers
            .get_first_value(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let from = header("From");
    let date_raw = header("Date");
    let message_id = header("Message-ID");
    if from.is_none() && date_raw.is_none() && message_id.is_none() {
        return Err(ParseFailure::new(locator, "no mail headers found"));
    }

    let date_raw = date_raw.unwrap_or_default();
    let (date, date_synthesized) = resolve_date(&date_raw);
    if date_synthesized {
        tracing::warn!(url = %locator, date = %date_raw, "Could not parse date, using capture time");
    }

    let contact = obfuscate_contact(&from.unwrap_or_default());
    let author_name = Some(parse_author_name(&contact))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    let subject = header("Subject")
        .map(|subject| normalize_subject(&subject))
        .filter(|subject| !subject.is_empty())
        .unwrap_or_else(|| "No Subject".to_string());

    let body = BodyVariants::from_raw(plain_text_body(&mail));

    Ok(MessageRecord {
        message_id: message_id.unwrap_or_else(|| format!("<mbox-{}-{}@local>", period, index)),
        in_reply_to: header("In-Reply-To"),
        references: header("References")
            .as_deref()
            .map(parse_references)
            .unwrap_or_default(),
        subject,
        author_name,
        author_email_obfuscated: contact,
        date,
        date_synthesized,
        body_raw: body.raw,
        body_clean: body.clean,
        body_new_content: body.new_content,
        source_url: source_url.to_string(),
        period: period.to_string(),
        thread_root_id: None,
        thread_depth: 0,
    })
}

/// Body of a single-part message, or the first inline `text/plain` part
fn plain_text_body(mail: &ParsedMail<'_>) -> String {
    if mail.subparts.is_empty() {
        return decode_body(mail);
    }

    first_plain_part(mail)
        .map(decode_body)
        .unwrap_or_default()
}

fn first_plain_part<'m, 'a>(mail: &'m ParsedMail<'a>) -> Option<&'m ParsedMail<'a>> {
    for part in &mail.subparts {
        if !part.subparts.is_empty() {
            if let Some(found) = first_plain_part(part) {
                return Some(found);
            }
            continue;
        }

        let is_plain = part.ctype.mimetype.eq_ignore_ascii_case("text/plain");
        let is_attachment = matches!(
            part.get_content_disposition().disposition,
            DispositionType::Attachment
        );
        if is_plain && !is_attachment {
            return Some(part);
        }
    }
    None
}

/// Decodes with the declared charset; undecodable bytes become U+FFFD
fn decode_body(part: &ParsedMail<'_>) -> String {
    part.get_body().unwrap_or_else(|e| {
        tracing::debug!("Falling back to lossy body decoding: {}", e);
        part.get_body_raw()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    })
}

/// Archive-style contact token: `alice at example.com`
fn obfuscate_contact(from: &str) -> String {
    from.replace('@', " at ")
}
