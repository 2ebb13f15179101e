// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal outcome of one flow run.

use crate::job::JobStatus;
use serde::{Deserialize, Serialize};

/// How a flow run ended, with its human-readable message.
///
/// The runner maps this onto the job's terminal status; everything that is
/// not one of these three kinds lands on [`JobStatus::Error`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message", rename_all = "snake_case")]
pub enum FlowOutcome {
    Success(String),
    Failed(String),
    Exit(String),
}

impl FlowOutcome {
    pub fn message(&self) -> &str {
        match self {
            Self::Success(m) | Self::Failed(m) | Self::Exit(m) => m,
        }
    }

    pub fn status(&self) -> JobStatus {
        match self {
            Self::Success(_) => JobStatus::Success,
            Self::Failed(_) => JobStatus::Failed,
            Self::Exit(_) => JobStatus::Exit,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

crate::simple_display! {
    FlowOutcome {
        Success(..) => "success",
        Failed(..) => "failed",
        Exit(..) => "exit",
    }
}
