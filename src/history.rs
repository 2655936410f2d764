//! Takeout HTML history parsing.
//!
//! The export is a flat list of container `div`s. Each container holds one
//! content cell whose direct text lines carry a status, the linked subject,
//! and a trailing human-readable timestamp:
//!
//! ```text
//! Watched <a href="https://www.youtube.com/watch?v=ID">Title</a><br>
//! <a href="...">Channel</a><br>Jan 5, 2023, 10:32:15 PM UTC
//! ```
//!
//! Containers missing any piece are skipped; a bad entry never aborts a run.

use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::constants::columns::{ID, QUERY, TIMESTAMP};
use crate::constants::history::{
    CONTAINER_SELECTOR, CONTENT_SELECTOR, LINK_SELECTOR, TIMESTAMP_FORMAT, VIDEO_ID_PARAM,
    ZONE_OFFSETS,
};
use crate::errors::PipelineError;
use crate::table::Table;
use crate::utils::normalize_inline_whitespace;

/// Which export is being parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryKind {
    /// Watch history; subjects are video ids.
    Video,
    /// Search history; subjects are free-text queries.
    Search,
}

impl HistoryKind {
    /// Column holding the event subject in rendered tables.
    pub const fn subject_column(&self) -> &'static str {
        match self {
            HistoryKind::Video => ID,
            HistoryKind::Search => QUERY,
        }
    }
}

/// One timestamped history entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEvent {
    /// When the event happened, normalized to UTC.
    pub timestamp: DateTime<Utc>,
    /// Video id or search query, depending on the export.
    pub subject: String,
}

struct HistorySelectors {
    container: Selector,
    content: Selector,
    link: Selector,
}

impl HistorySelectors {
    fn new() -> Result<Self, PipelineError> {
        let parse = |css: &str| {
            Selector::parse(css).map_err(|err| {
                PipelineError::Configuration(format!("invalid history selector '{css}': {err}"))
            })
        };
        Ok(Self {
            container: parse(CONTAINER_SELECTOR)?,
            content: parse(CONTENT_SELECTOR)?,
            link: parse(LINK_SELECTOR)?,
        })
    }
}

/// Parse an export file from disk. A missing or unreadable file is fatal.
pub fn parse_history_file(
    path: impl AsRef<Path>,
    kind: HistoryKind,
) -> Result<Vec<HistoryEvent>, PipelineError> {
    let path = path.as_ref();
    let started = Instant::now();
    let html = std::fs::read_to_string(path).map_err(|source| PipelineError::InputUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed = parse_history_entries(&html, kind)?;
    if parsed.events.is_empty() && parsed.skipped > 0 {
        warn!(
            path = %path.display(),
            skipped = parsed.skipped,
            "[activity:history] no entry could be parsed"
        );
    }
    info!(
        path = %path.display(),
        kind = ?kind,
        events = parsed.events.len(),
        skipped = parsed.skipped,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "[activity:history] export parsed"
    );
    Ok(parsed.events)
}

/// Events parsed from one export, plus the number of containers skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedHistory {
    /// Parsed events in document order.
    pub events: Vec<HistoryEvent>,
    /// Containers dropped for a missing piece or an unparseable timestamp.
    pub skipped: usize,
}

/// Parse export HTML into events, in document order.
pub fn parse_history(html: &str, kind: HistoryKind) -> Result<Vec<HistoryEvent>, PipelineError> {
    parse_history_entries(html, kind).map(|parsed| parsed.events)
}

/// Like [`parse_history`], also counting skipped containers.
pub fn parse_history_entries(html: &str, kind: HistoryKind) -> Result<ParsedHistory, PipelineError> {
    let selectors = HistorySelectors::new()?;
    let document = Html::parse_document(html);
    let mut parsed = ParsedHistory::default();
    for (idx, container) in document.select(&selectors.container).enumerate() {
        match parse_container(container, kind, &selectors) {
            Some(event) => parsed.events.push(event),
            None => {
                parsed.skipped += 1;
                debug!(container = idx, "[activity:history] skipping malformed entry");
            }
        }
    }
    Ok(parsed)
}

fn parse_container(
    container: ElementRef<'_>,
    kind: HistoryKind,
    selectors: &HistorySelectors,
) -> Option<HistoryEvent> {
    let content = container.select(&selectors.content).next()?;
    let lines = text_lines(content);
    // First line is the status ("Watched", "Searched for"); last is the timestamp.
    let (_status, rest) = lines.split_first()?;
    let timestamp = parse_history_timestamp(rest.last()?)?;
    let link = content.select(&selectors.link).next()?;

    let subject = match kind {
        HistoryKind::Video => video_id_from_link(link)?,
        HistoryKind::Search => {
            let query = normalize_inline_whitespace(link.text().collect::<String>());
            if query.is_empty() {
                return None;
            }
            query
        }
    };
    Some(HistoryEvent { timestamp, subject })
}

/// Direct, non-blank text children of `element`, whitespace-collapsed.
fn text_lines(element: ElementRef<'_>) -> Vec<String> {
    element
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| normalize_inline_whitespace(&**text))
        .filter(|line| !line.is_empty())
        .collect()
}

fn video_id_from_link(link: ElementRef<'_>) -> Option<String> {
    let from_href = link.value().attr("href").and_then(video_id_from_url);
    from_href.or_else(|| video_id_from_url(link.text().collect::<String>().trim()))
}

/// Extract the `v` query parameter from a watch URL.
pub fn video_id_from_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == VIDEO_ID_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Parse `Jan 5, 2023, 10:32:15 PM UTC` style timestamps.
///
/// The trailing token must be one of the zone abbreviations in
/// [`ZONE_OFFSETS`]; anything else is rejected.
pub fn parse_history_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let normalized = normalize_inline_whitespace(raw);
    let (local, zone) = normalized.rsplit_once(' ')?;
    let offset_minutes = ZONE_OFFSETS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(zone))
        .map(|(_, minutes)| *minutes)?;
    let naive = NaiveDateTime::parse_from_str(local, TIMESTAMP_FORMAT).ok()?;
    let offset = FixedOffset::east_opt(offset_minutes * 60)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|stamped| stamped.with_timezone(&Utc))
}

/// Render events as a two-column table: `timestamp` plus `id` or `query`.
pub fn events_to_table(events: &[HistoryEvent], kind: HistoryKind) -> Result<Table, PipelineError> {
    let rows = events
        .iter()
        .map(|event| {
            vec![
                Value::String(format_timestamp(&event.timestamp)),
                Value::String(event.subject.clone()),
            ]
        })
        .collect();
    Table::from_rows([TIMESTAMP, kind.subject_column()], rows)
}

/// Canonical timestamp rendering used in every output table.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
