//! Text rules shared by the page parser and the mailbox adapter

use regex::Regex;
use std::sync::LazyLock;

static ATTRIBUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^On .{5,100} wrote:?\s*$").expect("valid attribution regex"));

static EXCESS_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid blank-line regex"));

static REPLY_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(re:\s*)+").expect("valid reply-prefix regex"));

static ANGLE_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*"?(?P<name>[^"<]*?)"?\s*<[^>]*>\s*$"#).expect("valid address regex")
});

static PAREN_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^()]*\((?P<name>[^()]+)\)\s*$").expect("valid comment-name regex")
});

static OBFUSCATED_CONTACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\S+\s+at\s+\S+").expect("valid contact regex"));

static MESSAGE_ID_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid message-id regex"));

/// The three body renditions stored on every record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyVariants {
    pub raw: String,
    pub clean: String,
    pub new_content: String,
}

impl BodyVariants {
    pub fn from_raw(raw: String) -> Self {
        let clean = strip_quoted_lines(&raw);
        let new_content = extract_new_content(&raw);
        Self {
            raw,
            clean,
            new_content,
        }
    }
}

fn is_quoted(line: &str) -> bool {
    line.trim_start().starts_with('>')
}

/// Drops every line whose first non-indent character is `>`
///
/// Attribution lines ("On ..., X wrote:") are kept.
pub fn strip_quoted_lines(body: &str) -> String {
    body.lines()
        .filter(|line| !is_quoted(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keeps only the lines the author wrote
///
/// Quoted lines and attribution lines are removed, runs of blank lines are
/// collapsed to a single blank line and the result is trimmed.
pub fn extract_new_content(body: &str) -> String {
    let kept = body
        .lines()
        .filter(|line| !is_quoted(line) && !ATTRIBUTION.is_match(line.trim_start()))
        .collect::<Vec<_>>()
        .join("\n");

    EXCESS_BLANK_LINES
        .replace_all(&kept, "\n\n")
        .trim()
        .to_string()
}

/// Collapses any run of leading `Re:` markers into a single `Re: `
pub fn normalize_subject(subject: &str) -> String {
    REPLY_PREFIX
        .replace(subject.trim(), "Re: ")
        .trim()
        .to_string()
}

/// Extracts a display name from a `From`-style string
///
/// Handles `Name <contact>`, `contact (Name)` and the archive's obfuscated
/// `Name contact at host` forms. Falls back to the trimmed input.
pub fn parse_author_name(from: &str) -> String {
    if let Some(name) = ANGLE_ADDRESS
        .captures(from)
        .and_then(|caps| caps.name("name"))
        .map(|m| m.as_str().trim())
        .filter(|name| !name.is_empty())
    {
        return name.to_string();
    }

    if let Some(name) = PAREN_NAME
        .captures(from)
        .and_then(|caps| caps.name("name"))
        .map(|m| m.as_str().trim())
        .filter(|name| !name.is_empty())
    {
        return name.to_string();
    }

    let cleaned = OBFUSCATED_CONTACT.replace_all(from, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        from.trim().to_string()
    } else {
        cleaned.to_string()
    }
}

/// Splits a `References` value into individual message ids
pub fn parse_references(references: &str) -> Vec<String> {
    let bracketed: Vec<String> = MESSAGE_ID_TOKEN
        .find_iter(references)
        .map(|m| m.as_str().trim().to_string())
        .collect();

    if !bracketed.is_empty() {
        return bracketed;
    }

    references
        .split_whitespace()
        .map(|token| token.to_string())
        .collect()
}
