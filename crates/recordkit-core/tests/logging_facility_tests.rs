#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use recordkit_core::errors::RecordError;
use recordkit_core::logging_facility::test_capture::init_test_capture;
use recordkit_core::{
    fields, log_op_end, log_op_error, log_op_start, CollectionDiffOptions, DiffOptions, Record,
    RecordCollection, RecordSchema, SetMode, TypeExpr,
};
use recordkit_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_DIFF_COUNT, FIELD_ERR_CODE, FIELD_ERR_KIND,
    FIELD_LEFT_LEN, FIELD_PATH, FIELD_RIGHT_LEN,
};

/// A record type whose name is unique to one test, so that parallel tests
/// sharing the capture buffer can be told apart.
fn probe_schema(name: &str) -> Arc<RecordSchema> {
    RecordSchema::builder(name)
        .field("id", TypeExpr::int())
        .identify_by_field("id")
        .build()
        .unwrap()
}

fn probe(schema: &Arc<RecordSchema>, id: i64) -> Record {
    Record::create_from_flat(schema, fields! { "id" => id }).unwrap()
}

// ===== MACRO TESTS =====

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name);

    capture.assert_event_exists(op_name, EVENT_START);
}

#[test]
fn test_log_op_end_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42, record = "Probe");

    let end_events = capture.events_for(op_name);
    assert_eq!(end_events.len(), 1, "Should have exactly one end event");
    assert!(end_events[0].is(op_name, EVENT_END));
    assert_eq!(end_events[0].duration_ms(), Some(42));
    assert_eq!(end_events[0].record(), Some("Probe"));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = RecordError::NotFound {
        identifier: "7".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 10, record = "Probe");

    let error_events = capture.events_for(op_name);
    assert_eq!(error_events.len(), 1, "Should have exactly one error event");
    assert!(error_events[0].is(op_name, EVENT_END_ERROR));
    assert_eq!(error_events[0].field(FIELD_ERR_CODE), Some("ERR_NOT_FOUND"));
    assert_eq!(error_events[0].field(FIELD_ERR_KIND), Some("NotFound"));
    assert_eq!(
        capture.last_error_code(op_name, "Probe").as_deref(),
        Some("ERR_NOT_FOUND")
    );
}

// ===== BOUNDARY OPERATION TESTS =====

#[test]
fn test_record_create_logs_single_start_and_end() {
    let capture = init_test_capture();
    let schema = probe_schema("LogProbeCreate");

    probe(&schema, 1);

    let counts = capture.boundary_counts("record_create", "LogProbeCreate");
    assert_eq!(counts.starts, 1);
    assert_eq!(counts.ends, 1);
    assert_eq!(counts.errors, 0);
}

#[test]
fn test_record_create_failure_logs_error_code() {
    let capture = init_test_capture();
    let schema = probe_schema("LogProbeCreateFail");

    let result = Record::create_from_flat(&schema, fields! {});
    assert!(result.is_err());

    let counts = capture.boundary_counts("record_create", "LogProbeCreateFail");
    assert!(counts.is_single_call());
    assert_eq!(counts.ends, 0);
    assert_eq!(
        capture
            .last_error_code("record_create", "LogProbeCreateFail")
            .as_deref(),
        Some("ERR_MISSING_FIELD")
    );
}

#[test]
fn test_all_sentinel_create_is_its_own_operation() {
    let capture = init_test_capture();
    let schema = probe_schema("LogProbeSentinel");

    Record::create_all_sentinel(&schema, true).unwrap();

    assert!(capture
        .boundary_counts("record_create_all_sentinel", "LogProbeSentinel")
        .is_single_call());
    assert_eq!(
        capture.boundary_counts("record_create", "LogProbeSentinel"),
        Default::default()
    );
}

#[test]
fn test_record_set_logs_path() {
    let capture = init_test_capture();
    let schema = probe_schema("LogProbeSet");
    let record = probe(&schema, 1);

    record.set_with_mode("id", 2, SetMode::Partial).unwrap();

    let mine = capture.events_for_record("record_set", "LogProbeSet");
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|e| e.field(FIELD_PATH) == Some("id")));
}

#[test]
fn test_record_set_failure_logs_error_code() {
    let capture = init_test_capture();
    let schema = probe_schema("LogProbeSetFail");
    let record = probe(&schema, 1);

    assert!(record.set("id", "one").is_err());

    assert!(capture
        .boundary_counts("record_set", "LogProbeSetFail")
        .is_single_call());
    let failed = capture
        .events_for_record("record_set", "LogProbeSetFail")
        .into_iter()
        .find(|e| e.is("record_set", EVENT_END_ERROR))
        .expect("error event");
    assert_eq!(failed.field(FIELD_ERR_KIND), Some("TypeMismatch"));
    assert_eq!(failed.field(FIELD_PATH), Some("id"));
    assert_eq!(
        capture
            .last_error_code("record_set", "LogProbeSetFail")
            .as_deref(),
        Some("ERR_TYPE_MISMATCH")
    );
}

#[test]
fn test_record_diff_logs_diff_count() {
    let capture = init_test_capture();
    let schema = probe_schema("LogProbeDiff");
    let a = probe(&schema, 1);
    let b = probe(&schema, 2);

    let messages = a.diff(&b, &DiffOptions::strict()).unwrap();

    let mine = capture.events_for_record("record_diff", "LogProbeDiff");
    let end = mine
        .iter()
        .find(|e| e.event.as_deref() == Some(EVENT_END))
        .expect("end event");
    assert_eq!(
        end.field(FIELD_DIFF_COUNT),
        Some(messages.len().to_string().as_str())
    );
}

#[test]
fn test_collection_diff_does_not_log_item_diffs() {
    let capture = init_test_capture();
    let schema = probe_schema("LogProbeCollection");
    let items: RecordCollection = (0..3).map(|id| probe(&schema, id)).collect();

    items
        .diff(&items.copy(), &CollectionDiffOptions::default())
        .unwrap();

    capture.assert_event_exists("collection_diff", EVENT_START);
    let sized = capture.count_events(|e| {
        e.is("collection_diff", EVENT_END)
            && e.field(FIELD_LEFT_LEN) == Some("3")
            && e.field(FIELD_RIGHT_LEN) == Some("3")
    });
    assert!(sized >= 1);
    assert!(capture
        .events_for_record("record_diff", "LogProbeCollection")
        .is_empty());
}
