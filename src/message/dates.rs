//! Mail date parsing with the fallbacks seen across archive generations

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Formats that carry a numeric offset
const ZONED_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M:%S %z",
    "%a %b %d %H:%M:%S %Y %z",
];

/// Formats without an offset; interpreted as UTC
const NAIVE_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%B %d, %Y %I:%M %p",
    "%a %b %d %Y - %H:%M:%S",
];

/// Zone names that mean UTC when they trail a date
const UTC_NAMES: &[&str] = &["GMT", "UTC", "UT", "Z"];

/// Parses a mail date, trying RFC 2822 first and then the fallback formats
///
/// Returns `None` when nothing matches; callers substitute the capture time.
pub fn parse_mail_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = DateTime::parse_from_rfc2822(raw) {
        return Some(date);
    }

    // Trailing comments such as "(PST)" or "(Coordinated Universal Time)"
    let without_comment = match raw.rfind('(') {
        Some(index) if raw.ends_with(')') => raw[..index].trim_end(),
        _ => raw,
    };
    if let Ok(date) = DateTime::parse_from_rfc2822(without_comment) {
        return Some(date);
    }

    for format in ZONED_FORMATS {
        if let Ok(date) = DateTime::parse_from_str(without_comment, format) {
            return Some(date);
        }
    }

    let without_zone_name = UTC_NAMES
        .iter()
        .find_map(|name| {
            without_comment
                .strip_suffix(name)
                .filter(|rest| rest.ends_with(' '))
        })
        .map(str::trim_end)
        .unwrap_or(without_comment);

    NAIVE_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(without_zone_name, format)
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive).into())
    })
}

/// The date to store: the parsed value, or the capture time flagged as synthesized
pub fn resolve_date(raw: &str) -> (DateTime<FixedOffset>, bool) {
    match parse_mail_date(raw) {
        Some(date) => (date, false),
        None => (Utc::now().into(), true),
    }
}
