// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `goto` step: jump to a named step or a reserved sentinel.

use super::{Goto, RunEnv, StepOutput};
use crate::error::StepError;
use serde::Deserialize;
use spooler_core::Blackboard;
use spooler_flow::render_str;
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct GotoConfig {
    /// Template-rendered target: a step name, `__start__`, `__end__`, or
    /// `__exit`.
    pub step_name: String,
}

pub(crate) fn execute(
    config: GotoConfig,
    board: &Blackboard,
    env: &RunEnv<'_>,
) -> Result<StepOutput, StepError> {
    let target = render_str(&config.step_name, &board.to_value())?;
    if target.is_empty() {
        return Err(StepError::Invalid("goto step name cannot be empty".into()));
    }
    info!("{} -> {}", env.repr, target);
    Ok(StepOutput::goto(Goto::from_target(&target)))
}
