// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `flow_loop` step: run a child flow once per list element, concurrently.

use super::{require_data, RunEnv, StepOutput};
use crate::error::StepError;
use crate::interpreter::run_child;
use serde::Deserialize;
use serde_json::Value;
use spooler_core::Blackboard;
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct FlowLoopConfig {
    /// Child flow path, relative to the flows directory.
    pub path: String,
    /// Blackboard key holding the list to iterate.
    pub data_key: String,
}

pub(crate) async fn execute(
    config: FlowLoopConfig,
    board: &mut Blackboard,
    env: &RunEnv<'_>,
) -> Result<StepOutput, StepError> {
    info!("{} -> {}", env.repr, config.path);
    let items = match require_data(board, &config.data_key)? {
        Value::Array(items) => items,
        _ => return Err(StepError::Invalid("data key must produce a list".into())),
    };

    // One task per element; results are aggregated in input order. Children
    // get a 1-based loop index and observe the parent's cancellation token.
    let handles: Vec<_> = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            tokio::spawn(run_child(
                env.ctx.clone(),
                config.path.clone(),
                item,
                Some(i + 1),
                env.cancel.clone(),
            ))
        })
        .collect();

    let mut boards = Vec::with_capacity(handles.len());
    let mut child_errors = Vec::new();
    for handle in handles {
        let (child_board, _outcome) =
            handle.await.map_err(|e| StepError::Invalid(e.to_string()))??;
        child_errors.extend(child_board.errors());
        boards.push(child_board.into_value());
    }
    board.extend_errors(child_errors);

    Ok(StepOutput::value(Value::Array(boards)))
}
