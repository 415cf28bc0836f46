//! Integration tests for the merge store
//!
//! Exercises idempotence, the recency gate, and schema evolution against an
//! in-memory store.

use chrono::{NaiveDate, NaiveDateTime};
use settlecheck::core::merge::{MergeOptions, MergeRow, MergeStore, Value, PROCESSED_AT};

fn ts(second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 4, 17)
        .unwrap()
        .and_hms_opt(3, 0, second)
        .unwrap()
}

fn outcome_row(agency: &str, ticket: &str, message: &str, at: NaiveDateTime) -> MergeRow {
    MergeRow::new()
        .set("agency_code", agency)
        .set("ticket_number", ticket)
        .set("reason", message)
        .set(PROCESSED_AT, at)
}

fn match_on_identity() -> MergeOptions {
    MergeOptions {
        match_columns: vec!["agency_code".to_string(), "ticket_number".to_string()],
        exclude_columns: Vec::new(),
        evolve_schema: false,
    }
}

#[test]
fn first_contact_creates_table_and_inserts_all_rows() {
    let mut store = MergeStore::in_memory().unwrap();
    let rows = vec![
        outcome_row("000153", "20250416", "receipt value mismatch", ts(0)),
        outcome_row("000154", "20250416", "nothing to report", ts(0)),
    ];

    let affected = store
        .upsert("incongruent_tickets", rows, &match_on_identity())
        .unwrap();
    assert_eq!(affected, 2);
    assert_eq!(store.manifest_version("incongruent_tickets").unwrap(), Some(1));

    let snapshot = store.snapshot("incongruent_tickets").unwrap();
    assert_eq!(snapshot.rows.len(), 2);
    assert_eq!(
        snapshot.columns,
        vec!["agency_code", "ticket_number", "reason", PROCESSED_AT]
    );
}

#[test]
fn replaying_the_same_batch_is_a_noop() {
    let mut store = MergeStore::in_memory().unwrap();
    let rows = vec![outcome_row("000153", "20250416", "receipt value mismatch", ts(0))];

    let first = store
        .upsert("incongruent_tickets", rows.clone(), &match_on_identity())
        .unwrap();
    let second = store
        .upsert("incongruent_tickets", rows, &match_on_identity())
        .unwrap();

    assert_eq!(first, 1);
    assert_eq!(second, 0);
    assert_eq!(store.snapshot("incongruent_tickets").unwrap().rows.len(), 1);
}

#[test]
fn newer_incoming_row_overwrites_but_keeps_stored_timestamp() {
    let mut store = MergeStore::in_memory().unwrap();
    store
        .upsert(
            "incongruent_tickets",
            vec![outcome_row("000153", "20250416", "receipt value mismatch", ts(0))],
            &match_on_identity(),
        )
        .unwrap();

    let affected = store
        .upsert(
            "incongruent_tickets",
            vec![outcome_row(
                "000153",
                "20250416",
                "cancelled/returned values mismatch",
                ts(30),
            )],
            &match_on_identity(),
        )
        .unwrap();
    assert_eq!(affected, 1);

    let snapshot = store.snapshot("incongruent_tickets").unwrap();
    assert_eq!(snapshot.rows.len(), 1);
    let row = &snapshot.rows[0];
    assert_eq!(
        row[2],
        Value::Text("cancelled/returned values mismatch".to_string())
    );
    // The stored timestamp is not refreshed by the update phase.
    assert_eq!(row[3], Value::Text("2025-04-17 03:00:00.000000".to_string()));
}

#[test]
fn older_incoming_row_leaves_stored_row_untouched() {
    let mut store = MergeStore::in_memory().unwrap();
    store
        .upsert(
            "incongruent_tickets",
            vec![outcome_row("000153", "20250416", "newest reason", ts(30))],
            &match_on_identity(),
        )
        .unwrap();

    let affected = store
        .upsert(
            "incongruent_tickets",
            vec![outcome_row("000153", "20250416", "stale reason", ts(0))],
            &match_on_identity(),
        )
        .unwrap();
    assert_eq!(affected, 0);

    let snapshot = store.snapshot("incongruent_tickets").unwrap();
    assert_eq!(snapshot.rows[0][2], Value::Text("newest reason".to_string()));
}

#[test]
fn evolution_adds_columns_and_backfills_null() {
    let mut store = MergeStore::in_memory().unwrap();
    store
        .upsert(
            "valid_tickets",
            vec![outcome_row("000153", "20250416", "nothing to report", ts(0))],
            &match_on_identity(),
        )
        .unwrap();

    let mut options = match_on_identity();
    options.evolve_schema = true;
    let wider = outcome_row("000154", "20250416", "nothing to report", ts(10))
        .set("agency_name", "CURITIBA");
    store.upsert("valid_tickets", vec![wider], &options).unwrap();

    assert_eq!(store.manifest_version("valid_tickets").unwrap(), Some(2));
    let snapshot = store.snapshot("valid_tickets").unwrap();
    assert!(snapshot.columns.contains(&"agency_name".to_string()));

    let idx = snapshot
        .columns
        .iter()
        .position(|c| c == "agency_name")
        .unwrap();
    let first_row = snapshot
        .rows
        .iter()
        .find(|r| r[0] == Value::Text("000153".to_string()))
        .unwrap();
    assert_eq!(first_row[idx], Value::Null);
}

#[test]
fn unknown_columns_are_dropped_when_evolution_is_off() {
    let mut store = MergeStore::in_memory().unwrap();
    store
        .upsert(
            "valid_tickets",
            vec![outcome_row("000153", "20250416", "nothing to report", ts(0))],
            &match_on_identity(),
        )
        .unwrap();

    let wider = outcome_row("000154", "20250416", "nothing to report", ts(10))
        .set("agency_name", "CURITIBA");
    let affected = store
        .upsert("valid_tickets", vec![wider], &match_on_identity())
        .unwrap();

    assert_eq!(affected, 1);
    assert_eq!(store.manifest_version("valid_tickets").unwrap(), Some(1));
    let snapshot = store.snapshot("valid_tickets").unwrap();
    assert!(!snapshot.columns.contains(&"agency_name".to_string()));
    assert_eq!(snapshot.rows.len(), 2);
}

#[test]
fn default_match_tuple_excludes_timestamp_and_excluded_columns() {
    let mut store = MergeStore::in_memory().unwrap();
    let options = MergeOptions {
        match_columns: Vec::new(),
        exclude_columns: vec!["reason".to_string()],
        evolve_schema: false,
    };

    store
        .upsert(
            "incongruent_tickets",
            vec![outcome_row("000153", "20250416", "first reason", ts(0))],
            &options,
        )
        .unwrap();

    // Same identity, different reason and newer timestamp: matched on the
    // default tuple (identity only, reason excluded) and overwritten.
    let affected = store
        .upsert(
            "incongruent_tickets",
            vec![outcome_row("000153", "20250416", "second reason", ts(10))],
            &options,
        )
        .unwrap();

    assert_eq!(affected, 1);
    let snapshot = store.snapshot("incongruent_tickets").unwrap();
    assert_eq!(snapshot.rows.len(), 1);
    assert_eq!(snapshot.rows[0][2], Value::Text("second reason".to_string()));
}

#[test]
fn missing_processed_at_is_defaulted() {
    let mut store = MergeStore::in_memory().unwrap();
    let row = MergeRow::new()
        .set("agency_code", "000153")
        .set("ticket_number", "20250416");

    store
        .upsert("valid_tickets", vec![row], &match_on_identity())
        .unwrap();

    let snapshot = store.snapshot("valid_tickets").unwrap();
    assert!(snapshot.columns.contains(&PROCESSED_AT.to_string()));
    let idx = snapshot
        .columns
        .iter()
        .position(|c| c == PROCESSED_AT)
        .unwrap();
    assert!(matches!(snapshot.rows[0][idx], Value::Text(_)));
}

#[test]
fn conflicting_column_options_fail_without_touching_storage() {
    let mut store = MergeStore::in_memory().unwrap();
    let options = MergeOptions {
        match_columns: vec!["agency_code".to_string()],
        exclude_columns: vec!["reason".to_string()],
        evolve_schema: false,
    };

    let err = store
        .upsert(
            "valid_tickets",
            vec![outcome_row("000153", "20250416", "x", ts(0))],
            &options,
        )
        .unwrap_err();
    assert!(err.to_string().contains("cannot be used together"));
    assert!(store.manifest_version("valid_tickets").unwrap().is_none());
}

#[test]
fn empty_batch_returns_zero() {
    let mut store = MergeStore::in_memory().unwrap();
    let affected = store
        .upsert("valid_tickets", Vec::new(), &match_on_identity())
        .unwrap();
    assert_eq!(affected, 0);
}
