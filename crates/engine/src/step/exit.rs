// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `exit` step: terminate the run with status `exit` and a message.

use super::{RunEnv, StepOutput};
use crate::error::StepError;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct ExitConfig {
    pub message: String,
}

pub(crate) fn execute(config: ExitConfig, env: &RunEnv<'_>) -> Result<StepOutput, StepError> {
    info!("{} -> exiting with message: {}", env.repr, config.message);
    Err(StepError::Exit(config.message))
}
