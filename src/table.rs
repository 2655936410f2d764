//! In-memory tabular model shared by every pipeline stage.
//!
//! A `Table` is an ordered column set plus rows of JSON cells. Stages never
//! mutate a table they were handed; they consume it or build a new one.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use indexmap::IndexSet;
use serde_json::Value;

use crate::errors::PipelineError;
use crate::types::ColumnName;

/// Suffix applied to right-hand columns that collide with left-hand names in a join.
pub const JOIN_COLLISION_SUFFIX: &str = "_right";

/// Ordered columns plus rows of `serde_json::Value` cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: IndexSet<ColumnName>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given columns.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ColumnName>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Create a table from prebuilt rows; every row must match the column count.
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<ColumnName>,
    {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Append one row.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), PipelineError> {
        if row.len() != self.columns.len() {
            return Err(PipelineError::Configuration(format!(
                "row has {} cells but table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    /// True when the table has a column named `name`.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    /// Position of `name` in the column order.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.get_index_of(name)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows in order.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Cell at `row` in `column`, when both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|cells| &cells[idx])
    }

    /// All cells of `column`, in row order.
    pub fn column_values(&self, column: &str) -> Result<Vec<&Value>, PipelineError> {
        let idx = self.require_column(column)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Distinct non-null join keys of `column`, in first-seen order.
    pub fn unique_keys(&self, column: &str) -> Result<Vec<String>, PipelineError> {
        let mut seen = IndexSet::new();
        for value in self.column_values(column)? {
            if let Some(key) = join_key(value) {
                seen.insert(key);
            }
        }
        Ok(seen.into_iter().collect())
    }

    /// Rows `range` as a new table, or `None` when the range is out of bounds.
    pub fn slice(&self, range: Range<usize>) -> Option<Table> {
        let rows = self.rows.get(range)?;
        Some(Table {
            columns: self.columns.clone(),
            rows: rows.to_vec(),
        })
    }

    /// Concatenate tables row-wise in order.
    ///
    /// The result's columns are the union of all inputs in first-seen order;
    /// cells missing from a table's rows are null.
    pub fn concat(tables: Vec<Table>) -> Table {
        let mut columns: IndexSet<ColumnName> = IndexSet::new();
        let mut total = 0usize;
        for table in &tables {
            columns.extend(table.columns.iter().cloned());
            total += table.rows.len();
        }
        let mut rows = Vec::with_capacity(total);
        for table in tables {
            let positions: Vec<usize> = table
                .columns
                .iter()
                .filter_map(|name| columns.get_index_of(name))
                .collect();
            for row in table.rows {
                let mut aligned = vec![Value::Null; columns.len()];
                for (cell, pos) in row.into_iter().zip(&positions) {
                    aligned[*pos] = cell;
                }
                rows.push(aligned);
            }
        }
        Table { columns, rows }
    }

    /// Remove `column`; a table without it is returned unchanged.
    pub fn drop_column(mut self, column: &str) -> Table {
        let Some(idx) = self.columns.get_index_of(column) else {
            return self;
        };
        self.columns.shift_remove_index(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        self
    }

    /// Left join `right` onto `self` where `self[left_on] == right[right_on]`.
    ///
    /// Every left row survives. A left row matching several right rows is
    /// repeated once per match; an unmatched row gets null right-hand cells.
    /// When both keys share a name the key column appears once. Right columns
    /// colliding with left names get [`JOIN_COLLISION_SUFFIX`], then a numeric
    /// suffix if that name is taken too.
    pub fn left_join(
        &self,
        right: &Table,
        left_on: &str,
        right_on: &str,
    ) -> Result<Table, PipelineError> {
        let left_key = self.require_column(left_on)?;
        let right_key = right.require_column(right_on)?;

        let carried: Vec<usize> = (0..right.columns.len())
            .filter(|pos| !(*pos == right_key && left_on == right_on))
            .collect();
        let mut columns = self.columns.clone();
        for pos in &carried {
            let name = unique_column_name(&columns, &right.columns[*pos]);
            columns.insert(name);
        }

        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (pos, row) in right.rows.iter().enumerate() {
            if let Some(key) = join_key(&row[right_key]) {
                index.entry(key).or_default().push(pos);
            }
        }

        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let matches = join_key(&row[left_key])
                .and_then(|key| index.get(&key))
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            if matches.is_empty() {
                let mut joined = row.clone();
                joined.extend(std::iter::repeat_n(Value::Null, carried.len()));
                rows.push(joined);
                continue;
            }
            for matched in matches {
                let mut joined = row.clone();
                joined.extend(carried.iter().map(|pos| right.rows[*matched][*pos].clone()));
                rows.push(joined);
            }
        }
        Ok(Table { columns, rows })
    }

    /// Remove exact-duplicate rows, keeping the first occurrence of each.
    pub fn drop_duplicates(self) -> Table {
        let mut seen = HashSet::new();
        let rows = self
            .rows
            .into_iter()
            .filter(|row| seen.insert(Value::Array(row.clone()).to_string()))
            .collect();
        Table {
            columns: self.columns,
            rows,
        }
    }

    fn require_column(&self, name: &str) -> Result<usize, PipelineError> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }
}

/// `name`, or the first of `name_right`, `name_right_2`, ... not already in `columns`.
fn unique_column_name(columns: &IndexSet<ColumnName>, name: &str) -> ColumnName {
    if !columns.contains(name) {
        return name.to_string();
    }
    let base = format!("{name}{JOIN_COLLISION_SUFFIX}");
    let mut candidate = base.clone();
    let mut attempt = 2;
    while columns.contains(&candidate) {
        candidate = format!("{base}_{attempt}");
        attempt += 1;
    }
    candidate
}

/// Canonical join key for a cell; null cells never match.
pub fn join_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Render a cell for delimited text output.
///
/// Null is empty, strings are verbatim, lists of scalars are comma-joined,
/// everything else is compact JSON.
pub fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Array(items) if items.iter().all(is_scalar) => items
            .iter()
            .map(render_cell)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}
