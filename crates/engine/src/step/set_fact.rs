// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `set_fact` step: store a template-rendered value on the blackboard.

use super::{RunEnv, StepOutput};
use crate::error::StepError;
use serde::Deserialize;
use serde_json::Value;
use spooler_core::Blackboard;
use spooler_flow::render_value;
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct SetFactConfig {
    pub value: Value,
}

pub(crate) fn execute(
    config: SetFactConfig,
    board: &Blackboard,
    env: &RunEnv<'_>,
) -> Result<StepOutput, StepError> {
    info!("{} -> {}", env.repr, config.value);
    let rendered = render_value(&config.value, &board.to_value())?;
    Ok(StepOutput::value(rendered))
}
