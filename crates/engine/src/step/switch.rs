// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `switch` step: run the first case whose regex matches the selected value.

use super::{RunEnv, StepOutput};
use crate::error::StepError;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use spooler_core::Blackboard;
use spooler_flow::StepDef;
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct SwitchCase {
    /// Regex matched against the string form of the selected value.
    pub when: String,
    /// A full step definition, executed through the normal step machinery.
    pub step: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SwitchConfig {
    pub data_key: String,
    pub cases: Vec<SwitchCase>,
}

/// String form of the switched-on value for regex matching. Bare strings
/// compare without quotes.
fn as_match_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) async fn execute(
    config: SwitchConfig,
    board: &mut Blackboard,
    env: &RunEnv<'_>,
) -> Result<StepOutput, StepError> {
    info!("{} -> {}", env.repr, config.data_key);
    let value = board.data_by_key(&config.data_key).unwrap_or(Value::Null);
    let text = as_match_text(&value);

    for case in &config.cases {
        let re = Regex::new(&case.when)
            .map_err(|e| StepError::Parse(format!("invalid case regex '{}': {e}", case.when)))?;
        if !re.is_match(&text) {
            continue;
        }
        let inner: StepDef = serde_json::from_value(case.step.clone())
            .map_err(|e| StepError::Parse(format!("invalid case step: {e}")))?;
        // The inner step stores its own result under its own result key;
        // only the control directive is surfaced to the interpreter.
        let inner_output = super::run(&inner, board, env).await?;
        return Ok(StepOutput { value: None, goto: inner_output.goto });
    }
    Ok(StepOutput::skipped())
}
