use serde_json::json;

use activity_tables::{BatchWindow, PipelineError, RecordId, Table, fetch_all, windows};

fn numbered_ids(total: usize) -> Vec<RecordId> {
    (0..total).map(|idx| format!("id{idx}")).collect()
}

#[test]
fn windows_partition_every_length_and_limit() {
    for total in 0..=130 {
        for max_batch in 1..=50 {
            let plan = windows(total, max_batch).unwrap();
            assert_eq!(plan.len(), total.div_ceil(max_batch), "L={total} M={max_batch}");

            let mut expected_start = 0;
            for window in &plan {
                assert_eq!(window.start, expected_start);
                assert!(!window.is_empty());
                assert!(window.len() <= max_batch);
                expected_start = window.end;
            }
            assert_eq!(expected_start, total);
        }
    }
}

#[test]
fn combined_rows_follow_window_then_item_order() {
    let ids = numbered_ids(123);
    let mut seen_windows: Vec<BatchWindow> = Vec::new();

    let table = fetch_all("ordering", &ids, 50, |joined, window| {
        seen_windows.push(window);
        let rows = joined.split(',').map(|id| vec![json!(id)]).collect();
        Table::from_rows(["id"], rows)
    })
    .unwrap();

    assert_eq!(seen_windows.len(), 3);
    assert_eq!(seen_windows[2], BatchWindow { start: 100, end: 123 });
    let fetched: Vec<String> = table
        .column_values("id")
        .unwrap()
        .into_iter()
        .map(|value| value.as_str().unwrap().to_string())
        .collect();
    assert_eq!(fetched, ids);
}

#[test]
fn every_call_carries_at_most_fifty_ids() {
    let ids = numbered_ids(101);
    let mut sizes = Vec::new();
    fetch_all("sizes", &ids, 50, |joined, _| {
        sizes.push(joined.split(',').count());
        Ok(Table::new(["id"]))
    })
    .unwrap();
    assert_eq!(sizes, vec![50, 50, 1]);
}

#[test]
fn lookup_failure_stops_the_fetch() {
    let ids = numbered_ids(10);
    let mut calls = 0;
    let result = fetch_all("failing", &ids, 3, |_, _| {
        calls += 1;
        Err(PipelineError::Configuration("lookup unavailable".to_string()))
    });
    assert!(matches!(result, Err(PipelineError::Configuration(_))));
    assert_eq!(calls, 1);
}
