// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::test_env;
use serde_json::json;
use spooler_core::FlowOutcome;
use yare::parameterized;

#[parameterized(
    spaces = { "Story Points", "story_points" },
    dots = { "Epic.Link", "epic_link" },
    dashes = { "due-date", "due_date" },
    mixed = { "My.Field-Name x", "my_field_name_x" },
)]
fn field_names_normalize(input: &str, expected: &str) {
    assert_eq!(normalize_field_name(input), expected);
}

fn jira_payload() -> serde_json::Value {
    json!({
        "issues": [
            {
                "key": "OPS-1",
                "fields": {
                    "summary": "broken router",
                    "customfield_10001": 5,
                    "customfield_10002": null,
                    "customfield_10003": [],
                    "customfield_99999": "unmapped",
                    "labels": []
                }
            }
        ],
        "names": {
            "customfield_10001": "Story Points",
            "customfield_10002": "Epic.Link",
            "customfield_10003": "Sprint"
        }
    })
}

const MERGE_FLOW: &str = r#"
name: merge
steps:
  - name: merged
    type: jira_names_merge
    jira_names_merge:
      data_key: __input__
"#;

#[tokio::test]
async fn renames_customfields_and_drops_empties() {
    let env = test_env();
    env.write_flow("merge.yml", MERGE_FLOW);

    let (board, outcome) = env.run_with_payload("merge.yml", jira_payload()).await;
    assert!(outcome.is_success(), "outcome: {outcome:?}");
    let fields = &board.get("merged").unwrap()[0]["fields"];

    assert_eq!(fields["summary"], json!("broken router"));
    assert_eq!(fields["story_points"], json!(5));
    // null and empty-list fields are dropped before renaming applies
    assert!(fields.get("epic_link").is_none());
    assert!(fields.get("sprint").is_none());
    assert!(fields.get("labels").is_none());
    // fields without a mapped name keep their customfield key
    assert_eq!(fields["customfield_99999"], json!("unmapped"));
    assert!(fields.get("customfield_10001").is_none());
}

#[tokio::test]
async fn merge_is_idempotent() {
    let env = test_env();
    env.write_flow("merge.yml", MERGE_FLOW);
    let (board, _) = env.run_with_payload("merge.yml", jira_payload()).await;
    let once = board.get("merged").unwrap().clone();

    // feed the merged issues back through with the same names table
    let again = json!({"issues": once, "names": jira_payload()["names"]});
    let (board, outcome) = env.run_with_payload("merge.yml", again).await;
    assert!(outcome.is_success());
    assert_eq!(board.get("merged").unwrap(), &once);
}

#[tokio::test]
async fn missing_names_table_fails() {
    let env = test_env();
    env.write_flow("merge.yml", MERGE_FLOW);

    let payload = json!({"issues": []});
    let (_board, outcome) = env.run_with_payload("merge.yml", payload).await;
    let FlowOutcome::Failed(message) = outcome else {
        panic!("expected failed outcome");
    };
    assert!(message.contains("expand=names"));
}
