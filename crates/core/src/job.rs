// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job record and lifecycle enums.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Lifecycle state of a job row.
///
/// Transitions only move forward: `pending → running → (stopping →)? finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Stopping,
    Finished,
}

crate::simple_display! {
    JobState {
        Pending => "pending",
        Running => "running",
        Stopping => "stopping",
        Finished => "finished",
    }
}

impl JobState {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "stopping" => Some(Self::Stopping),
            "finished" => Some(Self::Finished),
            _ => None,
        }
    }
}

/// Terminal outcome of a job. `Unknown` until the run finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Unknown,
    Success,
    Failed,
    Error,
    Exit,
}

crate::simple_display! {
    JobStatus {
        Unknown => "unknown",
        Success => "success",
        Failed => "failed",
        Error => "error",
        Exit => "exit",
    }
}

impl JobStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unknown" => Some(Self::Unknown),
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            "error" => Some(Self::Error),
            "exit" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Where a job was launched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobSource {
    Api,
    Scheduler,
}

crate::simple_display! {
    JobSource {
        Api => "api",
        Scheduler => "scheduler",
    }
}

/// Structured metadata stored on the job row.
///
/// `flow_path` doubles as the uniqueness key: at most one non-finished job
/// may exist per flow path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMeta {
    pub flow_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    pub source: JobSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub every_seconds: Option<u64>,
}

impl JobMeta {
    /// Metadata for an API-launched job.
    pub fn api(flow_path: impl Into<String>, payload: Option<Value>, timeout: Option<u64>) -> Self {
        Self {
            flow_path: flow_path.into(),
            payload,
            timeout,
            source: JobSource::Api,
            schedule_id: None,
            cron: None,
            every_seconds: None,
        }
    }

    /// Metadata for a scheduler-launched job.
    pub fn scheduled(
        flow_path: impl Into<String>,
        timeout: Option<u64>,
        schedule_id: Uuid,
        cron: Option<String>,
        every_seconds: Option<u64>,
    ) -> Self {
        Self {
            flow_path: flow_path.into(),
            payload: None,
            timeout,
            source: JobSource::Scheduler,
            schedule_id: Some(schedule_id),
            cron,
            every_seconds,
        }
    }
}

/// One persisted job row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub meta: JobMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
    pub state: JobState,
    pub status: JobStatus,
    /// Seconds since epoch, set when the row is created / moved to running.
    pub start_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
