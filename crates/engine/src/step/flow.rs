// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `flow` step: run a child flow synchronously and store its final
//! blackboard.

use super::{RunEnv, StepOutput};
use crate::error::StepError;
use crate::interpreter::run_child;
use serde::Deserialize;
use serde_json::Value;
use spooler_core::Blackboard;
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct FlowConfig {
    /// Child flow path, relative to the flows directory.
    pub path: String,
    /// Blackboard key supplying the child's input payload.
    pub data_key: String,
}

pub(crate) async fn execute(
    config: FlowConfig,
    board: &Blackboard,
    env: &RunEnv<'_>,
) -> Result<StepOutput, StepError> {
    info!("{} -> {}", env.repr, config.path);
    let payload = board.data_by_key(&config.data_key).unwrap_or(Value::Null);
    let (child_board, _outcome) = run_child(
        env.ctx.clone(),
        config.path,
        payload,
        None,
        env.cancel.clone(),
    )
    .await?;
    Ok(StepOutput::value(child_board.into_value()))
}
