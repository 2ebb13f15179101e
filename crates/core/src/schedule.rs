// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule specification and listing entry.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("schedule for '{0}' needs exactly one of 'cron' or 'every_seconds'")]
    NoTrigger(String),
    #[error("schedule for '{0}' sets both 'cron' and 'every_seconds'")]
    BothTriggers(String),
}

/// A request to run a flow on a cron expression or a fixed interval.
///
/// Exactly one of `cron` / `every_seconds` must be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSpec {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub every_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl ScheduleSpec {
    pub fn validate(&self) -> Result<(), ScheduleError> {
        match (&self.cron, self.every_seconds) {
            (Some(_), Some(_)) => Err(ScheduleError::BothTriggers(self.path.clone())),
            (None, None) => Err(ScheduleError::NoTrigger(self.path.clone())),
            _ => Ok(()),
        }
    }
}

/// Snapshot of one registered schedule, as returned by the listing API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: Uuid,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub every_seconds: Option<u64>,
    pub timeout_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_job_id: Option<Uuid>,
    pub running: bool,
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
