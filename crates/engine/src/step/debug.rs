// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `debug` step: dump a blackboard key (or the whole board) to the log.

use super::{RunEnv, StepOutput};
use crate::error::StepError;
use serde::Deserialize;
use spooler_core::Blackboard;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum DebugFormat {
    Yaml,
    Json,
    Text,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DebugConfig {
    #[serde(rename = "type", default = "default_format")]
    pub format: DebugFormat,
    /// Empty or missing selects the whole blackboard.
    #[serde(default)]
    pub data_key: Option<String>,
}

fn default_format() -> DebugFormat {
    DebugFormat::Yaml
}

pub(crate) fn execute(
    config: DebugConfig,
    board: &Blackboard,
    env: &RunEnv<'_>,
) -> Result<StepOutput, StepError> {
    let key = config.data_key.as_deref().filter(|k| !k.is_empty());
    let data = match key {
        Some(key) => board.data_by_key(key).unwrap_or(serde_json::Value::Null),
        None => board.to_value(),
    };

    info!("{} -> dumping debug data_key {}", env.repr, key.unwrap_or(""));
    let dump = match config.format {
        DebugFormat::Yaml => {
            serde_yaml::to_string(&data).map_err(|e| StepError::Io(e.to_string()))?
        }
        DebugFormat::Json => {
            serde_json::to_string_pretty(&data).map_err(|e| StepError::Io(e.to_string()))?
        }
        DebugFormat::Text => format!("{data:#?}"),
    };
    info!("{dump}");

    Ok(StepOutput::value(data))
}
