//! Period and message-link discovery
//!
//! The archive root lists one link per month (`2024/03/`, `2024/03/index.php`,
//! or the absolute form of either). Each month's index page lists message
//! pages named `<digits>.<ext>` or `msg<digits>.<ext>`.

use crate::config::ArchiveConfig;
use crate::crawler::fetcher::FetchGateway;
use crate::message::Period;
use crate::FetchError;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static PERIOD_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})/(\d{2})(?:/.*)?$").expect("period link pattern is valid")
});

static MESSAGE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(msg)?\d+\.(php|html?)$").expect("message link pattern is valid")
});

/// A month to crawl and the page listing its messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodTarget {
    pub period: Period,
    pub index_url: String,
}

/// Filters applied on top of the configured start period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodFilter {
    /// Skip periods earlier than this one
    pub from: Option<Period>,
    /// Keep only this period
    pub only: Option<Period>,
}

impl PeriodFilter {
    fn admits(&self, period: &Period) -> bool {
        if self.only.is_some_and(|only| only != *period) {
            return false;
        }
        !self.from.is_some_and(|from| *period < from)
    }
}

/// Fetches the archive root and returns the periods to crawl, oldest first
pub async fn discover(
    gateway: &FetchGateway,
    archive: &ArchiveConfig,
    filter: PeriodFilter,
) -> Result<Vec<PeriodTarget>, FetchError> {
    let root_url = format!("{}/", archive.base_url);
    let html = gateway.fetch(&root_url).await?;

    let targets = parse_period_links(&html, archive, filter);
    tracing::info!(count = targets.len(), "Discovered archive periods");
    Ok(targets)
}

/// Extracts period targets from the archive root page
///
/// Applies the configured start period and `filter`, drops repeated links to
/// the same month, and sorts ascending.
pub fn parse_period_links(
    html: &str,
    archive: &ArchiveConfig,
    filter: PeriodFilter,
) -> Vec<PeriodTarget> {
    let Ok(root) = Url::parse(&format!("{}/", archive.base_url)) else {
        tracing::warn!(base_url = %archive.base_url, "Archive base URL does not parse");
        return Vec::new();
    };
    let start = Period::new(archive.start_year, archive.start_month).ok();

    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut targets = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(relative) = relative_to_root(href.trim(), &root) else {
            continue;
        };
        let Some(period) = period_from_path(&relative) else {
            continue;
        };

        if start.is_some_and(|start| period < start) || !filter.admits(&period) {
            continue;
        }
        if !seen.insert(period) {
            continue;
        }

        targets.push(PeriodTarget {
            period,
            index_url: index_url(archive, &period),
        });
    }

    targets.sort_by_key(|target| target.period);
    targets
}

/// Canonical index page for one period
pub fn index_url(archive: &ArchiveConfig, period: &Period) -> String {
    format!("{}/{}/{}", archive.base_url, period, archive.index_page)
}

/// Message page URLs on a period index page, absolute and in page order
pub fn parse_message_links(html: &str, index_url: &str) -> Vec<String> {
    let Ok(base) = Url::parse(index_url) else {
        tracing::warn!(url = %index_url, "Index URL does not parse");
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| MESSAGE_LINK.is_match(href))
        .filter_map(|href| base.join(href).ok())
        .map(String::from)
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Path of `href` relative to the archive root, if it points inside it
fn relative_to_root(href: &str, root: &Url) -> Option<String> {
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let resolved = root.join(href).ok()?;
    let relative = resolved.as_str().strip_prefix(root.as_str())?;
    Some(relative.to_string())
}

fn period_from_path(path: &str) -> Option<Period> {
    let captures = PERIOD_LINK.captures(path)?;
    let year = captures[1].parse().ok()?;
    let month = captures[2].parse().ok()?;
    Period::new(year, month).ok()
}
