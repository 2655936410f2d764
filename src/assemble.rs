//! Joining detail, tag, category, and history tables into one output table.

use tracing::warn;

use crate::batch::BatchWindow;
use crate::constants::columns::{CATEGORY_ID, ID};
use crate::errors::PipelineError;
use crate::table::Table;

/// Outcome of a best-effort history join.
#[derive(Clone, Debug, PartialEq)]
pub enum Enrichment {
    /// History was attached.
    Enriched(Table),
    /// History could not be attached; the input rows are returned untouched.
    Unenriched {
        /// Rows as they were before the attempt.
        table: Table,
        /// Why the join was skipped.
        reason: String,
    },
}

impl Enrichment {
    /// Take the table regardless of outcome, logging a warning when unenriched.
    pub fn into_table_logged(self, window: BatchWindow) -> Table {
        match self {
            Enrichment::Enriched(table) => table,
            Enrichment::Unenriched { table, reason } => {
                warn!(
                    window_start = window.start,
                    window_end = window.end,
                    reason = %reason,
                    "[activity:assemble] continuing without history timestamps"
                );
                table
            }
        }
    }

    /// True when history was attached.
    pub fn is_enriched(&self) -> bool {
        matches!(self, Enrichment::Enriched(_))
    }
}

/// Join one window's details with their tag side table on `id`.
pub fn attach_tags(details: &Table, tags: &Table) -> Result<Table, PipelineError> {
    details.left_join(tags, ID, ID)
}

/// Left join the history rows covering `window` onto `table` by `id`.
///
/// The history slice is taken from the same positions the window covered in
/// the id list. A slice outside the history, or tables lacking an `id`
/// column, produce `Enrichment::Unenriched`.
pub fn enrich_with_history(table: Table, history: &Table, window: BatchWindow) -> Enrichment {
    let Some(slice) = history.slice(window.start..window.end) else {
        return Enrichment::Unenriched {
            reason: format!(
                "history has {} rows, window is [{}, {})",
                history.len(),
                window.start,
                window.end
            ),
            table,
        };
    };
    match table.left_join(&slice, ID, ID) {
        Ok(joined) => Enrichment::Enriched(joined),
        Err(err) => Enrichment::Unenriched {
            reason: err.to_string(),
            table,
        },
    }
}

/// Attach category titles, then drop exact-duplicate rows.
pub fn assemble_output(details: &Table, categories: &Table) -> Result<Table, PipelineError> {
    Ok(details
        .left_join(categories, CATEGORY_ID, CATEGORY_ID)?
        .drop_duplicates())
}
