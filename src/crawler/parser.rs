//! Message page parser
//!
//! Turns one archive message page into a [`MessageRecord`]. Header fields come
//! from a list of [`HeaderStrategy`] implementations tried in priority order:
//!
//! 1. [`EmbeddedMetadata`]: `<!-- key="value" -->` annotations written by
//!    current archive software
//! 2. [`LegacyHeaders`]: `<li>` items carrying literal `From:`/`Date:` labels
//!
//! A strategy only fills fields still missing after the ones before it.

use crate::message::{
    normalize_subject, parse_author_name, parse_references, resolve_date, BodyVariants,
    MessageRecord,
};
use crate::ParseFailure;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static METADATA_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<!--\s*(\w+)="([^"]*?)"\s*-->"#).expect("metadata comment pattern is valid")
});

/// Header values recovered from a page, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields {
    pub date: Option<String>,
    pub author_name: Option<String>,
    /// Contact token as published (already obfuscated by the archive)
    pub author_contact: Option<String>,
    pub message_id: Option<String>,
    pub in_reply_to: Option<String>,
    pub references: Option<String>,
}

impl HeaderFields {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The fields a root message needs; replies additionally carry a parent
    pub fn is_complete(&self) -> bool {
        self.date.is_some() && self.author_name.is_some() && self.message_id.is_some()
    }

    /// Keeps every field already set and takes the rest from `other`
    pub fn or_fill(self, other: HeaderFields) -> Self {
        Self {
            date: self.date.or(other.date),
            author_name: self.author_name.or(other.author_name),
            author_contact: self.author_contact.or(other.author_contact),
            message_id: self.message_id.or(other.message_id),
            in_reply_to: self.in_reply_to.or(other.in_reply_to),
            references: self.references.or(other.references),
        }
    }
}

/// One way of reading header fields off a message page
pub trait HeaderStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns `None` when the page carries nothing this strategy recognizes
    fn extract(&self, html: &str, document: &Html) -> Option<HeaderFields>;
}

/// `<!-- sent="..." -->`, `<!-- name="..." -->`, `<!-- id="..." -->` and friends
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedMetadata;

impl HeaderStrategy for EmbeddedMetadata {
    fn name(&self) -> &'static str {
        "embedded-metadata"
    }

    fn extract(&self, html: &str, _document: &Html) -> Option<HeaderFields> {
        let mut fields = HeaderFields::default();

        for captures in METADATA_COMMENT.captures_iter(html) {
            let value = non_empty(&captures[2]);
            let slot = match captures[1].to_ascii_lowercase().as_str() {
                "sent" => &mut fields.date,
                "name" => &mut fields.author_name,
                "email" => &mut fields.author_contact,
                "id" => &mut fields.message_id,
                "inreplyto" => &mut fields.in_reply_to,
                "references" => &mut fields.references,
                _ => continue,
            };
            if value.is_some() {
                *slot = value;
            }
        }

        (!fields.is_empty()).then_some(fields)
    }
}

/// `<li>From: Name &lt;contact&gt;</li>` style header listings
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyHeaders;

impl HeaderStrategy for LegacyHeaders {
    fn name(&self) -> &'static str {
        "legacy-headers"
    }

    fn extract(&self, _html: &str, document: &Html) -> Option<HeaderFields> {
        let selector = Selector::parse("li").ok()?;
        let mut fields = HeaderFields::default();

        for item in document.select(&selector) {
            let text = item.text().collect::<String>();
            let text = text.trim();

            let Some((label, value)) = text.split_once(':') else {
                continue;
            };
            let value = non_empty(value);
            let slot = match label.trim().to_ascii_lowercase().as_str() {
                "from" => {
                    if fields.author_name.is_none() {
                        fields.author_name =
                            value.as_deref().map(parse_author_name).and_then(|n| non_empty(&n));
                    }
                    &mut fields.author_contact
                }
                "date" => &mut fields.date,
                "message-id" => &mut fields.message_id,
                "in-reply-to" => &mut fields.in_reply_to,
                "references" => &mut fields.references,
                _ => continue,
            };
            if slot.is_none() {
                *slot = value;
            }
        }

        (!fields.is_empty()).then_some(fields)
    }
}

/// Page parser configured with the archive's list name and header strategies
pub struct PageParser {
    list_name: String,
    strategies: Vec<Box<dyn HeaderStrategy>>,
}

impl PageParser {
    /// Parser using the embedded-metadata strategy, then the legacy one
    pub fn new(list_name: impl Into<String>) -> Self {
        Self::with_strategies(
            list_name,
            vec![Box::new(EmbeddedMetadata), Box::new(LegacyHeaders)],
        )
    }

    pub fn with_strategies(
        list_name: impl Into<String>,
        strategies: Vec<Box<dyn HeaderStrategy>>,
    ) -> Self {
        Self {
            list_name: list_name.into(),
            strategies,
        }
    }

    /// Parses one message page fetched from `url` for `period`
    ///
    /// Fails when the page has neither recognizable headers nor a body; such
    /// pages are skipped rather than stored half-filled.
    pub fn parse(&self, html: &str, url: &str, period: &str) -> Result<MessageRecord, ParseFailure> {
        let document = Html::parse_document(html);

        let headers = self.extract_headers(html, &document);
        let body = extract_body(&document);

        if headers.is_empty() && body.trim().is_empty() {
            return Err(ParseFailure::new(url, "no message headers or body found"));
        }

        let date_raw = headers.date.clone().unwrap_or_default();
        let (date, date_synthesized) = resolve_date(&date_raw);
        if date_synthesized {
            tracing::warn!(url = %url, date = %date_raw, "Could not parse date, using capture time");
        }

        let message_id = headers
            .message_id
            .unwrap_or_else(|| synthetic_message_id(url, period));
        let body = BodyVariants::from_raw(body);

        Ok(MessageRecord {
            message_id,
            in_reply_to: headers.in_reply_to,
            references: headers
                .references
                .as_deref()
                .map(parse_references)
                .unwrap_or_default(),
            subject: self.extract_subject(&document),
            author_name: headers.author_name.unwrap_or_else(|| "Unknown".to_string()),
            author_email_obfuscated: headers.author_contact.unwrap_or_default(),
            date,
            date_synthesized,
            body_raw: body.raw,
            body_clean: body.clean,
            body_new_content: body.new_content,
            source_url: url.to_string(),
            period: period.to_string(),
            thread_root_id: None,
            thread_depth: 0,
        })
    }

    fn extract_headers(&self, html: &str, document: &Html) -> HeaderFields {
        let mut merged = HeaderFields::default();

        for strategy in &self.strategies {
            if let Some(fields) = strategy.extract(html, document) {
                tracing::trace!(strategy = strategy.name(), "Header strategy matched");
                merged = merged.or_fill(fields);
            }
            if merged.is_complete() {
                break;
            }
        }

        merged
    }

    /// First `h1` that isn't the list name, else the last `h1`
    fn extract_subject(&self, document: &Html) -> String {
        let Ok(selector) = Selector::parse("h1") else {
            return "No Subject".to_string();
        };

        let headings: Vec<String> = document
            .select(&selector)
            .map(|h1| h1.text().map(str::trim).collect::<String>())
            .collect();

        let subject = headings
            .iter()
            .find(|text| !text.is_empty() && **text != self.list_name)
            .or_else(|| headings.last())
            .map(|text| normalize_subject(text))
            .unwrap_or_default();

        if subject.is_empty() {
            "No Subject".to_string()
        } else {
            subject
        }
    }
}

/// Convenience wrapper around [`PageParser::new`] + [`PageParser::parse`]
pub fn parse_message_page(
    html: &str,
    url: &str,
    period: &str,
    list_name: &str,
) -> Result<MessageRecord, ParseFailure> {
    PageParser::new(list_name).parse(html, url, period)
}

/// Deterministic id for pages that publish none
///
/// `https://host/list/2024/03/0042.php` in `2024/03` becomes
/// `<synthetic-0042@2024.03>`.
pub fn synthetic_message_id(url: &str, period: &str) -> String {
    let segment = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    let token = segment
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(segment);

    format!("<synthetic-{}@{}>", token, period.replace('/', "."))
}

/// Body text from the rich-content container, else the first `pre` block
///
/// Quoted-reply spans inside the container are left out entirely; text nodes
/// are joined with newlines.
fn extract_body(document: &Html) -> String {
    if let Some(container) = Selector::parse("#start")
        .ok()
        .and_then(|selector| document.select(&selector).next())
    {
        let mut parts = Vec::new();
        for node in container.descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let quoted = node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .take_while(|element| element.id() != container.id())
                .any(is_quote_span);
            if !quoted {
                parts.push(text.to_string());
            }
        }
        return parts.join("\n");
    }

    Selector::parse("pre")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .map(|pre| pre.text().collect::<String>())
        .unwrap_or_default()
}

fn is_quote_span(element: ElementRef<'_>) -> bool {
    element.value().name() == "span"
        && element
            .value()
            .attr("class")
            .is_some_and(|class| class.split_whitespace().any(|c| c.contains("quotelev")))
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://lists.example.org/std-proposals/2025/01/0042.php";

    const EMBEDDED_PAGE: &str = r#"<html><head>
<!-- received="Mon Dec 29 00:59:20 2025" -->
<!-- isoreceived="20251229005920" -->
<!-- sent="Mon, 29 Dec 2025 00:59:12 +0000" -->
<!-- name="Jane Doe" -->
<!-- email="jane_at_[hidden]" -->
<!-- subject="Re: RE: re: Pattern matching" -->
<!-- id="<reply@example.org>" -->
<!-- inreplyto="<root@example.org>" -->
<!-- references="<root@example.org> <middle@example.org>" -->
</head><body>
<h1>std-proposals</h1>
<h1>Re: RE: re: Pattern matching</h1>
<div id="start" class="showhtml-body">I agree.<br>
<span class="quotelev1">&gt; The proposal says X.</span><br>
On Sun, Dec 28, 2025, John wrote:<br>
More thoughts.</div>
</body></html>"#;

    const LEGACY_PAGE: &str = r#"<html><body>
<h1>std-proposals</h1>
<h1>Initial idea</h1>
<ul>
<li>From: John Smith john at example.com</li>
<li>Date: Tue, 4 Mar 2025 09:15:00 -0500</li>
<li>Message-ID: &lt;legacy@example.org&gt;</li>
<li>References: &lt;a@example.org&gt; &lt;b@example.org&gt;</li>
</ul>
<pre>Hello all,
&gt; earlier text
On Mon, Mar 3, 2025, Someone wrote:
Here is my idea.</pre>
</body></html>"#;

    #[test]
    fn test_embedded_metadata_page() {
        let record = parse_message_page(EMBEDDED_PAGE, URL, "2025/01", "std-proposals").unwrap();

        assert_eq!(record.message_id, "<reply@example.org>");
        assert_eq!(record.in_reply_to.as_deref(), Some("<root@example.org>"));
        assert_eq!(
            record.references,
            vec!["<root@example.org>", "<middle@example.org>"]
        );
        assert_eq!(record.subject, "Re: Pattern matching");
        assert_eq!(record.author_name, "Jane Doe");
        assert_eq!(record.author_email_obfuscated, "jane_at_[hidden]");
        assert_eq!(record.date.to_rfc3339(), "2025-12-29T00:59:12+00:00");
        assert!(!record.date_synthesized);
        assert_eq!(record.source_url, URL);
        assert_eq!(record.period, "2025/01");
    }

    #[test]
    fn test_quote_spans_are_removed_from_body() {
        let record = parse_message_page(EMBEDDED_PAGE, URL, "2025/01", "std-proposals").unwrap();

        assert!(!record.body_raw.contains("The proposal says X"));
        assert!(record.body_raw.contains("I agree."));
        assert!(record.body_clean.contains("John wrote:"));
        assert!(!record.body_new_content.contains("wrote:"));
        assert!(record.body_new_content.contains("More thoughts."));
    }

    #[test]
    fn test_legacy_header_page() {
        let record = parse_message_page(LEGACY_PAGE, URL, "2025/03", "std-proposals").unwrap();

        assert_eq!(record.message_id, "<legacy@example.org>");
        assert_eq!(record.in_reply_to, None);
        assert_eq!(record.references, vec!["<a@example.org>", "<b@example.org>"]);
        assert_eq!(record.subject, "Initial idea");
        assert_eq!(record.author_name, "John Smith");
        assert_eq!(record.author_email_obfuscated, "John Smith john at example.com");
        assert_eq!(record.date.offset().local_minus_utc(), -5 * 3600);
        assert_eq!(
            record.body_clean,
            "Hello all,\nOn Mon, Mar 3, 2025, Someone wrote:\nHere is my idea."
        );
        assert_eq!(record.body_new_content, "Hello all,\nHere is my idea.");
    }

    #[test]
    fn test_embedded_fields_take_priority() {
        let html = r#"<!-- name="Embedded Name" -->
            <ul><li>From: Legacy Name &lt;legacy at example.com&gt;</li>
            <li>Message-ID: &lt;from-legacy@example.org&gt;</li></ul>
            <pre>body</pre>"#;
        let record = parse_message_page(html, URL, "2025/01", "std-proposals").unwrap();

        assert_eq!(record.author_name, "Embedded Name");
        assert_eq!(record.message_id, "<from-legacy@example.org>");
    }

    #[test]
    fn test_synthetic_id_is_deterministic() {
        let html = "<h1>No ids here</h1><pre>Just a body</pre>";

        let first = parse_message_page(html, URL, "2025/01", "std-proposals").unwrap();
        let second = parse_message_page(html, URL, "2025/01", "std-proposals").unwrap();

        assert_eq!(first.message_id, "<synthetic-0042@2025.01>");
        assert_eq!(first.message_id, second.message_id);
        assert_eq!(first.author_name, "Unknown");
    }

    #[test]
    fn test_unparseable_date_is_flagged() {
        let html = r#"<!-- sent="whenever" --><!-- id="<x@y>" --><pre>text</pre>"#;
        let record = parse_message_page(html, URL, "2025/01", "std-proposals").unwrap();
        assert!(record.date_synthesized);
    }

    #[test]
    fn test_subject_defaults() {
        let html = r#"<!-- id="<x@y>" --><pre>text</pre>"#;
        let record = parse_message_page(html, URL, "2025/01", "std-proposals").unwrap();
        assert_eq!(record.subject, "No Subject");

        let html = r#"<h1>std-proposals</h1><!-- id="<x@y>" --><pre>text</pre>"#;
        let record = parse_message_page(html, URL, "2025/01", "std-proposals").unwrap();
        assert_eq!(record.subject, "std-proposals");
    }

    #[test]
    fn test_empty_page_is_a_parse_failure() {
        let result = parse_message_page("<html><body></body></html>", URL, "2025/01", "list");
        let failure = result.unwrap_err();
        assert_eq!(failure.url, URL);
    }

    #[test]
    fn test_synthetic_id_token() {
        assert_eq!(
            synthetic_message_id("https://h/l/2024/03/msg00007.html", "2024/03"),
            "<synthetic-msg00007@2024.03>"
        );
    }
}
