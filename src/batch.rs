//! Bulk lookups over identifier lists in fixed-size windows.
//!
//! Platforms cap how many ids one call may carry. `fetch_all` splits an id
//! list into consecutive windows under that cap, calls the lookup once per
//! window, and concatenates the per-window tables once at the end.

use std::time::Instant;

use tracing::{debug, info};

use crate::constants::batch::ID_DELIMITER;
use crate::errors::PipelineError;
use crate::table::Table;
use crate::types::RecordId;

/// Position of one window inside the original id list, as `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchWindow {
    /// First index covered by the window.
    pub start: usize,
    /// One past the last index covered by the window.
    pub end: usize,
}

impl BatchWindow {
    /// Number of ids covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True for a zero-width window.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Split `total` ids into `ceil(total / max_batch)` consecutive windows.
///
/// Every window holds `max_batch` ids except the last, which ends at `total`.
pub fn windows(total: usize, max_batch: usize) -> Result<Vec<BatchWindow>, PipelineError> {
    if max_batch == 0 {
        return Err(PipelineError::Configuration(
            "max batch size must be > 0".to_string(),
        ));
    }
    Ok((0..total.div_ceil(max_batch))
        .map(|idx| {
            let start = idx * max_batch;
            BatchWindow {
                start,
                end: (start + max_batch).min(total),
            }
        })
        .collect())
}

/// Run `lookup` over `ids` in windows of at most `max_batch` and concatenate
/// the results in window order.
///
/// `lookup` receives the window's ids joined with `,` and the window position.
/// The first failing window aborts the fetch with its error.
pub fn fetch_all<F>(
    label: &str,
    ids: &[RecordId],
    max_batch: usize,
    mut lookup: F,
) -> Result<Table, PipelineError>
where
    F: FnMut(&str, BatchWindow) -> Result<Table, PipelineError>,
{
    let plan = windows(ids.len(), max_batch)?;
    let started = Instant::now();
    info!(
        lookup = label,
        ids = ids.len(),
        windows = plan.len(),
        "[activity:batch] fetch start"
    );
    let mut parts = Vec::with_capacity(plan.len());
    for window in plan {
        let joined = ids[window.start..window.end].join(ID_DELIMITER);
        let part = lookup(&joined, window)?;
        debug!(
            lookup = label,
            window_start = window.start,
            window_end = window.end,
            rows = part.len(),
            "[activity:batch] window fetched"
        );
        parts.push(part);
    }
    let combined = Table::concat(parts);
    info!(
        lookup = label,
        rows = combined.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "[activity:batch] fetch done"
    );
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(values: &[&str]) -> Vec<RecordId> {
        values.iter().map(|value| value.to_string()).collect()
    }

    /// Echo lookup: one row per requested id, tagged with the window start.
    fn echo(joined: &str, window: BatchWindow) -> Result<Table, PipelineError> {
        let rows = joined
            .split(',')
            .map(|id| vec![json!(id), json!(window.start)])
            .collect();
        Table::from_rows(["id", "window"], rows)
    }

    #[test]
    fn windows_cover_list_and_clamp_last_to_total() {
        assert_eq!(
            windows(5, 2).unwrap(),
            vec![
                BatchWindow { start: 0, end: 2 },
                BatchWindow { start: 2, end: 4 },
                BatchWindow { start: 4, end: 5 },
            ]
        );
        assert_eq!(windows(4, 2).unwrap().len(), 2);
        assert_eq!(windows(1, 50).unwrap(), vec![BatchWindow { start: 0, end: 1 }]);
        assert!(windows(0, 50).unwrap().is_empty());
    }

    #[test]
    fn windows_reject_zero_batch_size() {
        assert!(matches!(
            windows(3, 0),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn fetch_all_three_ids_in_windows_of_two() {
        let mut calls = Vec::new();
        let table = fetch_all("test", &ids(&["a", "b", "c"]), 2, |joined, window| {
            calls.push((joined.to_string(), window));
            echo(joined, window)
        })
        .unwrap();

        assert_eq!(
            calls,
            vec![
                ("a,b".to_string(), BatchWindow { start: 0, end: 2 }),
                ("c".to_string(), BatchWindow { start: 2, end: 3 }),
            ]
        );
        assert_eq!(
            table.column_values("id").unwrap(),
            vec![&json!("a"), &json!("b"), &json!("c")]
        );
    }

    #[test]
    fn fetch_all_keeps_final_id_when_length_is_not_a_multiple() {
        let list = ids(&["a", "b", "c", "d", "e"]);
        let table = fetch_all("test", &list, 3, echo).unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table.value(4, "id"), Some(&json!("e")));
    }

    #[test]
    fn fetch_all_does_not_dedupe_across_windows() {
        let list = ids(&["a", "b", "a"]);
        let table = fetch_all("test", &list, 2, echo).unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn fetch_all_propagates_first_failure_without_further_calls() {
        let list = ids(&["a", "b", "c", "d"]);
        let mut calls = 0;
        let result = fetch_all("test", &list, 1, |joined, window| {
            calls += 1;
            if window.start == 1 {
                return Err(PipelineError::Configuration("boom".to_string()));
            }
            echo(joined, window)
        });
        assert!(result.is_err());
        assert_eq!(calls, 2);
    }

    #[test]
    fn fetch_all_on_empty_list_makes_no_calls() {
        let mut calls = 0;
        let table = fetch_all("test", &[], 50, |joined, window| {
            calls += 1;
            echo(joined, window)
        })
        .unwrap();
        assert_eq!(calls, 0);
        assert!(table.is_empty());
    }
}
