// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sleep` step: cooperative suspension that aborts early on cancellation.

use super::{RunEnv, StepOutput};
use crate::error::StepError;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct SleepConfig {
    pub seconds: u64,
}

pub(crate) async fn execute(
    config: SleepConfig,
    env: &RunEnv<'_>,
) -> Result<StepOutput, StepError> {
    info!("{} -> sleeping for {} seconds", env.repr, config.seconds);
    tokio::select! {
        _ = env.cancel.cancelled() => {}
        _ = tokio::time::sleep(Duration::from_secs(config.seconds)) => {}
    }
    Ok(StepOutput::value(json!({})))
}
