// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `jinja` step: render a template file against the blackboard, optionally
//! parsing the result as JSON or YAML.

use super::{RunEnv, StepOutput};
use crate::error::StepError;
use serde::Deserialize;
use serde_json::Value;
use spooler_core::Blackboard;
use spooler_flow::render_str;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ParseFormat {
    Json,
    Yaml,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JinjaConfig {
    /// Template path relative to the templates directory.
    pub path: String,
    #[serde(default)]
    pub parse: Option<ParseFormat>,
    #[serde(default)]
    pub data_key: Option<String>,
}

pub(crate) fn execute(
    config: JinjaConfig,
    board: &Blackboard,
    env: &RunEnv<'_>,
) -> Result<StepOutput, StepError> {
    let path = env.ctx.templates_root.join(&config.path);
    info!("{} -> {}", env.repr, path.display());

    let template = std::fs::read_to_string(&path)
        .map_err(|e| StepError::Io(format!("{}: {e}", path.display())))?;
    let rendered = render_str(&template, &board.to_value())?;

    let value = match config.parse {
        Some(ParseFormat::Json) => serde_json::from_str(&rendered)
            .map_err(|e| StepError::Invalid(format!("rendered template is not JSON: {e}")))?,
        Some(ParseFormat::Yaml) => serde_yaml::from_str(&rendered)
            .map_err(|e| StepError::Invalid(format!("rendered template is not YAML: {e}")))?,
        None => Value::String(rendered),
    };
    Ok(StepOutput::value(value))
}
