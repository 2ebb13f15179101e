// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `jira_names_merge` step: rename `customfield_*` keys in a JIRA search
//! result to their human field names and drop null/empty fields.

use super::{require_data, RunEnv, StepOutput};
use crate::error::StepError;
use serde::Deserialize;
use serde_json::Value;
use spooler_core::Blackboard;
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct JiraConfig {
    /// Key of a JIRA payload shaped `{issues: […], names: {…}}`.
    pub data_key: String,
    #[serde(default = "default_list_key")]
    pub list_key: String,
}

fn default_list_key() -> String {
    "issues".to_string()
}

/// Lowercase a field name and collapse `.`, `-` and spaces to underscores.
fn normalize_field_name(name: &str) -> String {
    name.replace(['.', '-', ' '], "_").to_lowercase()
}

pub(crate) fn execute(
    config: JiraConfig,
    board: &Blackboard,
    env: &RunEnv<'_>,
) -> Result<StepOutput, StepError> {
    info!("{} -> Transpose Jira customfields with names", env.repr);
    let data = require_data(board, &config.data_key)?;
    let issues = data
        .get(&config.list_key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let names = data
        .get("names")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            StepError::Invalid(format!(
                "field names not found in {} list, add expand=names to the query",
                config.list_key
            ))
        })?
        .clone();

    let mut merged = Vec::with_capacity(issues.len());
    for mut issue in issues {
        if let Some(fields) = issue.get_mut("fields").and_then(Value::as_object_mut) {
            let keys: Vec<String> = fields.keys().cloned().collect();
            for key in keys {
                let empty = match fields.get(&key) {
                    Some(Value::Null) => true,
                    Some(Value::Array(items)) => items.is_empty(),
                    _ => false,
                };
                if empty {
                    fields.remove(&key);
                    continue;
                }
                if !key.starts_with("customfield_") {
                    continue;
                }
                let Some(name) = names.get(&key).and_then(Value::as_str) else {
                    continue;
                };
                if name.is_empty() {
                    continue;
                }
                if let Some(value) = fields.remove(&key) {
                    fields.insert(normalize_field_name(name), value);
                }
            }
        }
        merged.push(issue);
    }
    Ok(StepOutput::value(Value::Array(merged)))
}

#[cfg(test)]
#[path = "jira_tests.rs"]
mod tests;
