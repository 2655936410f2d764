use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::errors::PipelineError;
use crate::table::{Table, render_cell};

/// Files directly under `dir` named `<prefix><N>.<extension>`, sorted by `N`.
///
/// A missing `dir` is `InputUnavailable`; names whose suffix is not a number
/// are ignored.
pub fn numbered_files(
    dir: &Path,
    prefix: &str,
    extension: &str,
) -> Result<Vec<PathBuf>, PipelineError> {
    let metadata = fs::metadata(dir).map_err(|source| PipelineError::InputUnavailable {
        path: dir.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(PipelineError::InputUnavailable {
            path: dir.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotADirectory, "expected a directory"),
        });
    }

    let mut numbered: Vec<(u64, PathBuf)> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let path = entry.into_path();
            let number = file_number(&path, prefix, extension)?;
            Some((number, path))
        })
        .collect();
    numbered.sort_by(|(left, left_path), (right, right_path)| {
        left.cmp(right).then_with(|| left_path.cmp(right_path))
    });
    debug!(
        dir = %dir.display(),
        files = numbered.len(),
        "[activity:fs] numbered files discovered"
    );
    Ok(numbered.into_iter().map(|(_, path)| path).collect())
}

fn file_number(path: &Path, prefix: &str, extension: &str) -> Option<u64> {
    if path.extension()?.to_str()? != extension {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix(prefix)?
        .parse()
        .ok()
}

/// Write `table` as CSV with a header row, replacing any existing file.
///
/// Parent directories are created as needed. Cells render through
/// [`render_cell`].
pub fn write_table(path: &Path, table: &Table) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(render_cell))?;
    }
    writer.flush()?;
    info!(
        path = %path.display(),
        rows = table.len(),
        "[activity:fs] table written"
    );
    Ok(())
}

/// Read a CSV written by [`write_table`]. Every cell comes back as a string;
/// empty fields come back as null.
pub fn read_table(path: &Path) -> Result<Table, PipelineError> {
    let mut reader = csv::Reader::from_path(path).map_err(|err| match err.into_kind() {
        csv::ErrorKind::Io(source) => PipelineError::InputUnavailable {
            path: path.to_path_buf(),
            source,
        },
        other => PipelineError::MalformedInput {
            path: path.to_path_buf(),
            details: format!("{other:?}"),
        },
    })?;
    let headers = reader.headers()?.clone();
    let mut table = Table::new(headers.iter());
    for record in reader.records() {
        let record = record?;
        table.push_row(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Value::Null
                    } else {
                        Value::String(field.to_string())
                    }
                })
                .collect(),
        )?;
    }
    debug!(
        path = %path.display(),
        rows = table.len(),
        "[activity:fs] table read"
    );
    Ok(table)
}
