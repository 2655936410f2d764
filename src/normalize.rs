//! Splitting multi-valued attributes into deduplicated side tables.

use indexmap::IndexSet;
use serde_json::Value;

use crate::errors::PipelineError;
use crate::table::{Table, join_key};
use crate::utils::render_multi_value;

/// Delimiter used when rendering a list of tags into one cell.
pub const TAG_DELIMITER: &str = ",";

/// Move `tag_column` out of `table` into an `(id, tags)` side table.
///
/// Tag lists render as one comma-joined string, null or absent tags as null.
/// Identical `(id, tags)` pairs collapse to one side-table row; pairs keep
/// their first-seen order. A table without `tag_column` yields null tags for
/// every id.
pub fn normalize_tags(
    table: Table,
    id_column: &str,
    tag_column: &str,
) -> Result<(Table, Table), PipelineError> {
    let ids = table.column_values(id_column)?;
    let tags = table.column_values(tag_column).ok();

    let mut pairs: IndexSet<(Option<String>, Option<String>)> = IndexSet::new();
    for (row, id) in ids.iter().enumerate() {
        let rendered = tags
            .as_ref()
            .and_then(|values| render_multi_value(values[row], TAG_DELIMITER));
        pairs.insert((join_key(id), rendered));
    }

    let rows = pairs
        .into_iter()
        .map(|(id, rendered)| vec![optional_string(id), optional_string(rendered)])
        .collect();
    let side = Table::from_rows([id_column, tag_column], rows)?;
    Ok((table.drop_column(tag_column), side))
}

fn optional_string(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Null)
}
