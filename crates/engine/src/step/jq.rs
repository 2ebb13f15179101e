// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `jq` step: apply a filter expression to a blackboard key.

use super::{require_data, RunEnv, StepOutput};
use crate::error::StepError;
use serde::Deserialize;
use spooler_core::Blackboard;
use spooler_flow::apply_filter;
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct JqConfig {
    pub expression: String,
    pub data_key: String,
}

pub(crate) fn execute(
    config: JqConfig,
    board: &Blackboard,
    env: &RunEnv<'_>,
) -> Result<StepOutput, StepError> {
    info!("{} -> {}", env.repr, config.expression);
    let data = require_data(board, &config.data_key)?;
    let filtered = apply_filter(&config.expression, &data)?;
    Ok(StepOutput::value(filtered))
}
