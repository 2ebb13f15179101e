// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSONPath-style value filters (`jq_expression` fields).

use serde_json::Value;
use serde_json_path::JsonPath;

#[derive(Debug, thiserror::Error)]
#[error("error applying filter '{expression}': {message}")]
pub struct FilterError {
    pub expression: String,
    pub message: String,
}

/// Rewrite jq-style dot expressions into JSONPath: `"."` selects the root
/// and a leading dot becomes `$.`. Expressions already starting with `$`
/// pass through unchanged.
fn normalize(expression: &str) -> String {
    let trimmed = expression.trim();
    if trimmed == "." {
        "$".to_string()
    } else if let Some(rest) = trimmed.strip_prefix('.') {
        format!("$.{rest}")
    } else {
        trimmed.to_string()
    }
}

/// Apply a filter expression to a value.
///
/// Single-result semantics: exactly one match returns that value, anything
/// else (zero or many) returns null.
pub fn apply_filter(expression: &str, data: &Value) -> Result<Value, FilterError> {
    let path = normalize(expression);
    let compiled = JsonPath::parse(&path).map_err(|e| FilterError {
        expression: expression.to_string(),
        message: e.to_string(),
    })?;
    let nodes = compiled.query(data).all();
    Ok(match nodes.as_slice() {
        [single] => (*single).clone(),
        _ => Value::Null,
    })
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
