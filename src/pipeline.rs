//! End-to-end runs: inputs → lookups → joined tables → CSV files.

use std::fmt;

use tracing::{info, warn};

use crate::assemble::assemble_output;
use crate::batch::fetch_all;
use crate::config::PipelineConfig;
use crate::constants::columns::{ARTIST_ID, CATEGORY_ID, PRIMARY_ARTIST_ID};
use crate::errors::PipelineError;
use crate::history::{HistoryEvent, HistoryKind, events_to_table, parse_history_file};
use crate::listening::{discover_listening_files, listening_table, load_listening_items};
use crate::mapping::ResponseSchema;
use crate::platform::youtube::{category_schema, video_schema};
use crate::platform::{JsonTransport, SpotifyClient, YouTubeClient};
use crate::table::Table;
use crate::transport::{read_table, write_table};
use crate::types::RecordId;

/// Joined video rows plus the category lookup they were joined with.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoTables {
    /// Details, tags, history timestamps, and category titles.
    pub output: Table,
    /// One row per category id that was looked up.
    pub categories: Table,
}

/// Row counts from a video run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VideoReport {
    /// History events parsed from the export.
    pub events: usize,
    /// Rows written to the joined video table.
    pub rows: usize,
    /// Rows written to the category table.
    pub categories: usize,
}

/// Row counts from a search run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchReport {
    /// Rows in the search table.
    pub rows: usize,
    /// True when an existing output was reused instead of re-parsing.
    pub cached: bool,
}

/// Row counts from a listening run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListeningReport {
    /// Export files read.
    pub files: usize,
    /// Rows written.
    pub rows: usize,
    /// Artist rows fetched, or `None` when the run had no Spotify client.
    pub artists: Option<usize>,
}

impl fmt::Display for VideoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "video: {} history events -> {} rows, {} categories",
            self.events, self.rows, self.categories
        )
    }
}

impl fmt::Display for SearchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let origin = if self.cached { "cached" } else { "parsed" };
        write!(f, "search: {} rows ({origin})", self.rows)
    }
}

impl fmt::Display for ListeningReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listening: {} files -> {} rows", self.files, self.rows)?;
        match self.artists {
            Some(artists) => write!(f, ", {artists} artists"),
            None => write!(f, ", artist details skipped"),
        }
    }
}

/// Look up every watched video and join details, tags, history, and categories.
///
/// Ids are looked up in history order, duplicates included, so each window's
/// history slice lines up with its ids.
pub fn build_video_tables<T: JsonTransport>(
    client: &YouTubeClient<T>,
    events: &[HistoryEvent],
    max_batch: usize,
) -> Result<VideoTables, PipelineError> {
    let history = events_to_table(events, HistoryKind::Video)?;
    let ids: Vec<RecordId> = events.iter().map(|event| event.subject.clone()).collect();

    let details = fetch_all("videos", &ids, max_batch, |joined, window| {
        client.video_details_window(joined, window, &history)
    })?;
    let details = or_schema_columns(details, video_schema(), CATEGORY_ID);

    let category_ids = details.unique_keys(CATEGORY_ID)?;
    let categories = fetch_all("videoCategories", &category_ids, max_batch, |joined, _| {
        client.video_categories(joined)
    })?;
    let categories = or_schema_columns(categories, category_schema(), CATEGORY_ID);

    let output = assemble_output(&details, &categories)?;
    Ok(VideoTables { output, categories })
}

/// An empty fetch has no columns; give it the schema's so joins still line up.
fn or_schema_columns(table: Table, schema: &ResponseSchema, key: &str) -> Table {
    if table.has_column(key) {
        table
    } else {
        Table::new(schema.columns())
    }
}

/// Parse the watch history, build the video tables, and write both CSVs.
pub fn run_video_pipeline<T: JsonTransport>(
    client: &YouTubeClient<T>,
    config: &PipelineConfig,
) -> Result<VideoReport, PipelineError> {
    let events = parse_history_file(&config.watch_history_path(), HistoryKind::Video)?;
    let tables = build_video_tables(client, &events, config.max_batch)?;
    write_table(&config.video_output_path(), &tables.output)?;
    write_table(&config.category_output_path(), &tables.categories)?;
    let report = VideoReport {
        events: events.len(),
        rows: tables.output.len(),
        categories: tables.categories.len(),
    };
    info!(
        events = report.events,
        rows = report.rows,
        categories = report.categories,
        "[activity:pipeline] video tables written"
    );
    Ok(report)
}

/// Parse the search history and write it, or reuse an existing output unless
/// `refresh` is set.
pub fn run_search_pipeline(config: &PipelineConfig) -> Result<SearchReport, PipelineError> {
    let output = config.search_output_path();
    if !config.refresh && output.is_file() {
        let cached = read_table(&output)?;
        info!(
            path = %output.display(),
            rows = cached.len(),
            "[activity:pipeline] reusing cached search history"
        );
        return Ok(SearchReport {
            rows: cached.len(),
            cached: true,
        });
    }

    let events = parse_history_file(&config.search_history_path(), HistoryKind::Search)?;
    let table = events_to_table(&events, HistoryKind::Search)?;
    write_table(&output, &table)?;
    info!(rows = table.len(), "[activity:pipeline] search history written");
    Ok(SearchReport {
        rows: table.len(),
        cached: false,
    })
}

/// Flatten the listening exports, attach artist details when `spotify` is
/// available, and write the result.
pub fn run_listening_pipeline<T: JsonTransport>(
    spotify: Option<&SpotifyClient<T>>,
    config: &PipelineConfig,
) -> Result<ListeningReport, PipelineError> {
    let files = discover_listening_files(&config.listening_dir())?;
    let items = load_listening_items(&files)?;
    let mut table = listening_table(&items)?;

    let artists = match spotify {
        Some(client) if table.has_column(PRIMARY_ARTIST_ID) => {
            let artist_ids = table.unique_keys(PRIMARY_ARTIST_ID)?;
            let artists = fetch_all("artists", &artist_ids, config.max_batch, |joined, _| {
                client.artist_details(joined)
            })?;
            if artists.has_column(ARTIST_ID) {
                table = table.left_join(&artists, PRIMARY_ARTIST_ID, ARTIST_ID)?;
            }
            Some(artists.len())
        }
        Some(_) => Some(0),
        None => {
            warn!("[activity:pipeline] no Spotify credentials; writing listening history without artist details");
            None
        }
    };

    write_table(&config.listening_output_path(), &table)?;
    info!(
        files = files.len(),
        rows = table.len(),
        "[activity:pipeline] listening history written"
    );
    Ok(ListeningReport {
        files: files.len(),
        rows: table.len(),
        artists,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::FakeTransport;
    use crate::types::Platform;
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};

    fn event(hour: u32, id: &str) -> HistoryEvent {
        HistoryEvent {
            timestamp: Utc.with_ymd_and_hms(2021, 3, 1, hour, 0, 0).unwrap(),
            subject: id.to_string(),
        }
    }

    fn video(id: &str, category: &str) -> Value {
        json!({"id": id, "snippet": {"title": id, "categoryId": category, "tags": ["t"]}})
    }

    #[test]
    fn video_tables_join_categories_across_windows() {
        let transport = FakeTransport::new(
            Platform::YouTube,
            vec![
                json!({"items": [video("a", "10"), video("b", "20")]}),
                json!({"items": [video("c", "10")]}),
                json!({"items": [{"id": "10", "snippet": {"title": "Music"}}]}),
            ],
        );
        let client = YouTubeClient::new(&transport);
        let events = vec![event(1, "a"), event(2, "b"), event(3, "c")];

        let tables = build_video_tables(&client, &events, 2).unwrap();

        assert_eq!(
            transport.query_values("id"),
            vec!["a,b".to_string(), "c".to_string(), "10,20".to_string()]
        );
        let output = &tables.output;
        assert_eq!(output.len(), 3);
        assert_eq!(output.value(2, "id"), Some(&json!("c")));
        assert_eq!(output.value(2, "timestamp"), Some(&json!("2021-03-01T03:00:00Z")));
        assert_eq!(output.value(0, "categoryTitle"), Some(&json!("Music")));
        assert_eq!(output.value(1, "categoryTitle"), Some(&Value::Null));
        assert_eq!(tables.categories.len(), 1);
    }

    #[test]
    fn no_events_means_no_calls_and_empty_tables() {
        let transport = FakeTransport::new(Platform::YouTube, Vec::new());
        let tables = build_video_tables(&YouTubeClient::new(&transport), &[], 50).unwrap();
        assert!(transport.requests.borrow().is_empty());
        assert!(tables.output.is_empty());
        assert!(tables.output.has_column("categoryTitle"));
    }

    #[test]
    fn reports_render_counts() {
        let report = ListeningReport {
            files: 2,
            rows: 9,
            artists: None,
        };
        assert_eq!(
            report.to_string(),
            "listening: 2 files -> 9 rows, artist details skipped"
        );
        let search = SearchReport {
            rows: 4,
            cached: true,
        };
        assert_eq!(search.to_string(), "search: 4 rows (cached)");
    }
}
