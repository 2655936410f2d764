//! Streaming-history exports: discovery, loading, and flattening into a table.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use serde_json::{Map, Value};
use tracing::info;

use crate::constants::columns::{ARTIST_NAMES, PLAYED_AT, PRIMARY_ARTIST_ID, PRIMARY_ARTIST_NAME};
use crate::constants::paths::LISTENING_FILE_PREFIX;
use crate::errors::PipelineError;
use crate::mapping::flatten_object;
use crate::table::Table;
use crate::transport::numbered_files;

/// Flattened track fields that carry no listening information.
pub const DROPPED_TRACK_FIELDS: &[&str] = &[
    "artists",
    "available_markets",
    "is_local",
    "href",
    "disc_number",
    "popularity",
    "track_number",
    "preview_url",
    "uri",
    "album.artists",
    "album.available_markets",
    "album.external_urls.spotify",
    "album.href",
    "album.release_date_precision",
    "album.total_tracks",
    "album.type",
    "album.uri",
    "external_ids.isrc",
    "external_urls.spotify",
];

const ITEMS_KEY: &str = "items";
const TRACK_KEY: &str = "track";
const ARTIST_NAME_DELIMITER: &str = ",";

/// Export files in `dir`, in numeric order of their suffix.
pub fn discover_listening_files(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    numbered_files(dir, LISTENING_FILE_PREFIX, "json")
}

/// Read the `items` arrays of every export file, in file order.
pub fn load_listening_items(files: &[PathBuf]) -> Result<Vec<Value>, PipelineError> {
    let mut items = Vec::new();
    for path in files {
        let text = fs::read_to_string(path).map_err(|source| PipelineError::InputUnavailable {
            path: path.clone(),
            source,
        })?;
        let document: Value =
            serde_json::from_str(&text).map_err(|err| PipelineError::MalformedInput {
                path: path.clone(),
                details: err.to_string(),
            })?;
        let Some(Value::Array(file_items)) = document.get(ITEMS_KEY) else {
            return Err(PipelineError::MalformedInput {
                path: path.clone(),
                details: format!("missing '{ITEMS_KEY}' array"),
            });
        };
        info!(
            path = %path.display(),
            rows = file_items.len(),
            "[activity:listening] export loaded"
        );
        items.extend(file_items.iter().cloned());
    }
    Ok(items)
}

/// One row per listening item.
///
/// Columns appear in first-seen order across items; an item lacking a column
/// gets null there.
pub fn listening_table(items: &[Value]) -> Result<Table, PipelineError> {
    let flattened: Vec<Map<String, Value>> = items.iter().map(flatten_item).collect();

    let mut columns: IndexSet<String> = IndexSet::new();
    for row in &flattened {
        columns.extend(row.keys().cloned());
    }
    let rows = flattened
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| row.get(column).cloned().unwrap_or(Value::Null))
                .collect()
        })
        .collect();
    Table::from_rows(columns, rows)
}

fn flatten_item(item: &Value) -> Map<String, Value> {
    let (track, played_at) = match item.get(TRACK_KEY) {
        Some(track) if track.is_object() => (track, item.get(PLAYED_AT)),
        _ => (item, None),
    };

    let mut row = flatten_object(track);
    for field in DROPPED_TRACK_FIELDS {
        row.remove(*field);
    }

    let artists = track
        .get("artists")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let primary = artists.first();
    row.insert(
        PRIMARY_ARTIST_ID.to_string(),
        primary
            .and_then(|artist| artist.get("id"))
            .cloned()
            .unwrap_or(Value::Null),
    );
    row.insert(
        PRIMARY_ARTIST_NAME.to_string(),
        primary
            .and_then(|artist| artist.get("name"))
            .cloned()
            .unwrap_or(Value::Null),
    );
    let names: Vec<&str> = artists
        .iter()
        .filter_map(|artist| artist.get("name").and_then(Value::as_str))
        .collect();
    row.insert(
        ARTIST_NAMES.to_string(),
        if names.is_empty() {
            Value::Null
        } else {
            Value::String(names.join(ARTIST_NAME_DELIMITER))
        },
    );
    if let Some(played_at) = played_at {
        row.insert(PLAYED_AT.to_string(), played_at.clone());
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn track(id: &str, artists: &[(&str, &str)]) -> Value {
        json!({
            "id": id,
            "name": format!("song {id}"),
            "duration_ms": 1000,
            "explicit": false,
            "href": "https://api.spotify.com/v1/tracks/x",
            "uri": "spotify:track:x",
            "popularity": 10,
            "available_markets": ["US"],
            "external_ids": {"isrc": "X"},
            "external_urls": {"spotify": "https://open.spotify.com/track/x"},
            "album": {
                "name": "album",
                "release_date": "2020-01-01",
                "uri": "spotify:album:y",
                "type": "album",
                "artists": [],
            },
            "artists": artists
                .iter()
                .map(|(id, name)| json!({"id": id, "name": name, "type": "artist"}))
                .collect::<Vec<_>>(),
        })
    }

    #[test]
    fn play_events_keep_played_at_and_primary_artist() {
        let items = vec![json!({
            "played_at": "2021-05-01T12:00:00Z",
            "track": track("t1", &[("ar1", "First"), ("ar2", "Second")]),
        })];

        let table = listening_table(&items).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.value(0, "played_at"), Some(&json!("2021-05-01T12:00:00Z")));
        assert_eq!(table.value(0, "artist.id"), Some(&json!("ar1")));
        assert_eq!(table.value(0, "artist.name"), Some(&json!("First")));
        assert_eq!(table.value(0, "artist.names"), Some(&json!("First,Second")));
        assert_eq!(table.value(0, "album.name"), Some(&json!("album")));
        assert_eq!(table.value(0, "album.release_date"), Some(&json!("2020-01-01")));
    }

    #[test]
    fn bookkeeping_fields_are_removed() {
        let table = listening_table(&[track("t1", &[("ar1", "A")])]).unwrap();
        for dropped in DROPPED_TRACK_FIELDS {
            assert!(!table.has_column(dropped), "{dropped} should be dropped");
        }
        assert!(table.has_column("duration_ms"));
        assert!(!table.has_column("played_at"));
    }

    #[test]
    fn items_without_artists_get_null_artist_columns() {
        let items = vec![track("t1", &[("ar1", "A")]), json!({"id": "t2", "name": "bare"})];
        let table = listening_table(&items).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(1, "artist.id"), Some(&Value::Null));
        assert_eq!(table.value(1, "artist.names"), Some(&Value::Null));
        assert_eq!(table.value(1, "album.name"), Some(&Value::Null));
    }

    #[test]
    fn load_reads_files_in_order() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join("StreamingHistory1.json"),
            json!({"items": [{"id": "second"}]}).to_string(),
        )
        .unwrap();
        fs::write(
            temp.path().join("StreamingHistory0.json"),
            json!({"items": [{"id": "first"}]}).to_string(),
        )
        .unwrap();

        let files = discover_listening_files(temp.path()).unwrap();
        let items = load_listening_items(&files).unwrap();

        assert_eq!(items, vec![json!({"id": "first"}), json!({"id": "second"})]);
    }

    #[test]
    fn file_without_items_is_malformed() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("StreamingHistory0.json");
        fs::write(&path, "[]").unwrap();
        let err = load_listening_items(&[path]).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { .. }));
    }
}
