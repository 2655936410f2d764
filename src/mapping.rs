//! Declarative flattening of nested API responses into tables.

use serde_json::{Map, Value};

use crate::errors::PipelineError;
use crate::table::Table;
use crate::types::{ColumnName, FieldPath};

/// Separator between segments of a nested field path.
pub const PATH_SEPARATOR: char = '.';

/// One source path → destination column entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldMapping {
    /// Dotted path into a response item, e.g. `snippet.title`.
    pub path: FieldPath,
    /// Column the value lands in, e.g. `videoTitle`.
    pub column: ColumnName,
}

impl FieldMapping {
    /// Map `path` to `column`.
    pub fn new(path: impl Into<FieldPath>, column: impl Into<ColumnName>) -> Self {
        Self {
            path: path.into(),
            column: column.into(),
        }
    }
}

/// How one endpoint's response becomes a table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseSchema {
    /// Top-level key holding the list of result objects.
    pub list_key: String,
    /// Field mappings, in output column order.
    pub fields: Vec<FieldMapping>,
}

impl ResponseSchema {
    /// Build a schema from `(path, column)` pairs.
    pub fn new(list_key: impl Into<String>, fields: &[(&str, &str)]) -> Self {
        Self {
            list_key: list_key.into(),
            fields: fields
                .iter()
                .map(|(path, column)| FieldMapping::new(*path, *column))
                .collect(),
        }
    }

    /// Output column names, in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.column.as_str())
    }

    /// Flatten a raw response body. A body without the list key yields an
    /// empty table carrying the schema's columns.
    pub fn extract(&self, response: &Value) -> Result<Table, PipelineError> {
        let items = response
            .get(&self.list_key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        self.extract_items(items)
    }

    /// Flatten a list of result objects, one row per object.
    pub fn extract_items(&self, items: &[Value]) -> Result<Table, PipelineError> {
        let rows: Vec<Vec<Value>> = items
            .iter()
            .map(|item| {
                self.fields
                    .iter()
                    .map(|field| lookup_path(item, &field.path).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Table::from_rows(self.columns(), rows)
    }
}

/// Resolve a dotted path inside nested objects.
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split(PATH_SEPARATOR)
        .try_fold(value, |current, segment| current.as_object()?.get(segment))
}

/// Flatten nested objects into dotted keys; arrays and scalars are leaves.
pub fn flatten_object(value: &Value) -> Map<String, Value> {
    let mut flat = Map::new();
    if let Value::Object(fields) = value {
        flatten_into(&mut flat, None, fields);
    }
    flat
}

fn flatten_into(flat: &mut Map<String, Value>, prefix: Option<&str>, fields: &Map<String, Value>) {
    for (key, value) in fields {
        let name = match prefix {
            Some(prefix) => format!("{prefix}{PATH_SEPARATOR}{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(nested) if !nested.is_empty() => {
                flatten_into(flat, Some(&name), nested);
            }
            other => {
                flat.insert(name, other.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extract_maps_nested_paths_and_fills_missing_with_null() {
        let schema = ResponseSchema::new(
            "items",
            &[("id", "id"), ("snippet.title", "title"), ("stats.views", "views")],
        );
        let response = json!({
            "items": [
                {"id": "a", "snippet": {"title": "First"}, "stats": {"views": "7"}},
                {"id": "b", "snippet": {}}
            ]
        });

        let table = schema.extract(&response).unwrap();

        assert_eq!(table.columns().collect::<Vec<_>>(), vec!["id", "title", "views"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, "title"), Some(&json!("First")));
        assert_eq!(table.value(1, "title"), Some(&Value::Null));
        assert_eq!(table.value(1, "views"), Some(&Value::Null));
    }

    #[test]
    fn extract_without_list_key_is_empty_but_typed() {
        let schema = ResponseSchema::new("items", &[("id", "categoryId")]);
        let table = schema
            .extract(&json!({"kind": "youtube#videoListResponse"}))
            .unwrap();
        assert!(table.is_empty());
        assert!(table.has_column("categoryId"));
    }

    #[test]
    fn lookup_path_stops_at_non_objects() {
        let value = json!({"a": {"b": [1, 2]}, "c": "leaf"});
        assert_eq!(lookup_path(&value, "a.b"), Some(&json!([1, 2])));
        assert_eq!(lookup_path(&value, "c.d"), None);
        assert_eq!(lookup_path(&value, "missing"), None);
    }

    #[test]
    fn flatten_object_uses_dotted_keys_and_keeps_arrays() {
        let flat = flatten_object(&json!({
            "id": "t1",
            "album": {"name": "Record", "external_urls": {"spotify": "u"}},
            "artists": [{"name": "x"}],
            "empty": {}
        }));
        assert_eq!(flat.get("album.name"), Some(&json!("Record")));
        assert_eq!(flat.get("album.external_urls.spotify"), Some(&json!("u")));
        assert_eq!(flat.get("artists"), Some(&json!([{"name": "x"}])));
        assert_eq!(flat.get("empty"), Some(&json!({})));
    }
}
