// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-run key/value store threaded through a flow's steps.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Reserved key: ordered error records accumulated during the run.
pub const ERRORS_KEY: &str = "__errors__";
/// Reserved key: the caller-supplied payload.
pub const INPUT_KEY: &str = "__input__";
/// Reserved key: 1-based index when the run is a loop iteration body.
pub const LOOP_INDEX_KEY: &str = "__loop_index__";
/// Reserved key: owning job id, when launched by the runner.
pub const JOB_ID_KEY: &str = "__job_id__";
/// Reserved key: `YYYYMMDDHHMMSS` stamp fixed at flow creation.
pub const TIMESTAMP_KEY: &str = "__timestamp__";
/// Reserved key: the flow's own relative path.
pub const FLOW_PATH_KEY: &str = "__flow_path__";

/// One entry of `__errors__`.
///
/// `ignored` carries the explanation when an `ignore_errors` pattern demoted
/// the error to a warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub step: String,
    pub error: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignored: Option<String>,
}

/// Mutable key→value store scoped to a single flow invocation.
///
/// Exactly one interpreter owns a blackboard at a time; child flows get their
/// own and hand their final state back to the parent as a plain value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blackboard {
    data: Map<String, Value>,
}

impl Blackboard {
    /// Initialize the reserved keys for a fresh run.
    pub fn new(
        flow_path: &str,
        payload: Value,
        loop_index: Option<usize>,
        job_id: Option<&str>,
        timestamp: String,
    ) -> Self {
        let mut data = Map::new();
        data.insert(ERRORS_KEY.to_string(), json!([]));
        data.insert(INPUT_KEY.to_string(), payload);
        data.insert(
            LOOP_INDEX_KEY.to_string(),
            loop_index.map(|i| json!(i)).unwrap_or(Value::Null),
        );
        data.insert(
            JOB_ID_KEY.to_string(),
            job_id.map(|id| json!(id)).unwrap_or(Value::Null),
        );
        data.insert(TIMESTAMP_KEY.to_string(), json!(timestamp));
        data.insert(FLOW_PATH_KEY.to_string(), json!(flow_path));
        Self { data }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Store a step result under its result key.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Select step input by `data_key`. The key `"."` selects the whole
    /// blackboard.
    pub fn data_by_key(&self, key: &str) -> Option<Value> {
        if key == "." {
            return Some(Value::Object(self.data.clone()));
        }
        self.data.get(key).cloned()
    }

    /// Append an error record to `__errors__`. The list only ever grows.
    pub fn push_error(&mut self, record: ErrorRecord) {
        let value = serde_json::to_value(&record).unwrap_or(Value::Null);
        match self.data.get_mut(ERRORS_KEY) {
            Some(Value::Array(errors)) => errors.push(value),
            _ => {
                self.data.insert(ERRORS_KEY.to_string(), json!([value]));
            }
        }
    }

    /// Append a batch of error values (used when merging child-flow errors).
    pub fn extend_errors(&mut self, values: Vec<Value>) {
        if let Some(Value::Array(errors)) = self.data.get_mut(ERRORS_KEY) {
            errors.extend(values);
        }
    }

    /// The `__errors__` list as raw values.
    pub fn errors(&self) -> Vec<Value> {
        match self.data.get(ERRORS_KEY) {
            Some(Value::Array(errors)) => errors.clone(),
            _ => Vec::new(),
        }
    }

    /// Snapshot the blackboard as a JSON object value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.data.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.data)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }
}

#[cfg(test)]
#[path = "blackboard_tests.rs"]
mod tests;
