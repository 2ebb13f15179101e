// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn board() -> Blackboard {
    Blackboard::new(
        "flows/demo.yml",
        json!({"n": 1}),
        None,
        Some("job-1"),
        "20260101120000".to_string(),
    )
}

#[test]
fn reserved_keys_initialized() {
    let bb = board();
    assert_eq!(bb.get(ERRORS_KEY), Some(&json!([])));
    assert_eq!(bb.get(INPUT_KEY), Some(&json!({"n": 1})));
    assert_eq!(bb.get(LOOP_INDEX_KEY), Some(&Value::Null));
    assert_eq!(bb.get(JOB_ID_KEY), Some(&json!("job-1")));
    assert_eq!(bb.get(TIMESTAMP_KEY), Some(&json!("20260101120000")));
    assert_eq!(bb.get(FLOW_PATH_KEY), Some(&json!("flows/demo.yml")));
}

#[test]
fn loop_index_is_set_for_iterations() {
    let bb = Blackboard::new("f.yml", Value::Null, Some(3), None, String::new());
    assert_eq!(bb.get(LOOP_INDEX_KEY), Some(&json!(3)));
}

#[test]
fn set_and_get_roundtrip() {
    let mut bb = board();
    bb.set("result", json!({"x": 2}));
    assert_eq!(bb.get("result"), Some(&json!({"x": 2})));
}

#[test]
fn data_by_key_dot_selects_everything() {
    let mut bb = board();
    bb.set("a", json!(1));
    let all = bb.data_by_key(".").unwrap();
    assert_eq!(all["a"], json!(1));
    assert_eq!(all[INPUT_KEY], json!({"n": 1}));
}

#[test]
fn data_by_key_missing_is_none() {
    assert!(board().data_by_key("nope").is_none());
}

#[test]
fn errors_grow_monotonically() {
    let mut bb = board();
    bb.push_error(ErrorRecord {
        step: "a".into(),
        error: json!("boom"),
        ignored: None,
    });
    bb.push_error(ErrorRecord {
        step: "b".into(),
        error: json!("bang"),
        ignored: Some("Error ignored based on regex: ^b".into()),
    });
    let errors = bb.errors();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["step"], json!("a"));
    assert!(errors[0].get("ignored").is_none());
    assert_eq!(errors[1]["ignored"], json!("Error ignored based on regex: ^b"));
}

#[test]
fn extend_errors_appends_in_order() {
    let mut bb = board();
    bb.push_error(ErrorRecord {
        step: "parent".into(),
        error: json!("x"),
        ignored: None,
    });
    bb.extend_errors(vec![json!({"step": "child", "error": "y"})]);
    let errors = bb.errors();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[1]["step"], json!("child"));
}

#[test]
fn to_value_is_an_object() {
    let bb = board();
    let value = bb.to_value();
    assert!(value.is_object());
    assert_eq!(value[FLOW_PATH_KEY], json!("flows/demo.yml"));
}
