// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron and fixed-interval schedules driving the runner.

use crate::context::FlowContext;
use crate::runner::FlowRunner;
use chrono::Utc;
use parking_lot::Mutex;
use spooler_core::{JobMeta, ScheduleEntry, ScheduleError, ScheduleSpec};
use spooler_flow::{FlowDef, FlowError};
use spooler_storage::StoreError;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Flow {0} is already added to the scheduler.")]
    AlreadyAdded(String),
    #[error("schedule {0} not found")]
    NotFound(Uuid),
    #[error(transparent)]
    Spec(#[from] ScheduleError),
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error("invalid cron expression '{expression}': {message}")]
    BadCron { expression: String, message: String },
}

struct ScheduleState {
    path: String,
    cron: Option<String>,
    every_seconds: Option<u64>,
    timeout_seconds: u64,
    last_job_id: Option<Uuid>,
    running: bool,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

struct Shared {
    flows: Mutex<HashMap<Uuid, ScheduleState>>,
    runner: Arc<FlowRunner>,
    ctx: Arc<FlowContext>,
    started: watch::Sender<bool>,
}

/// The in-process scheduler. Each registered flow owns one trigger task:
/// cron triggers sleep until the next timezone-aware fire time, interval
/// triggers tick on a fixed period once [`Scheduler::start`] has been
/// called.
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl Scheduler {
    pub fn new(runner: Arc<FlowRunner>, ctx: Arc<FlowContext>) -> Self {
        let (started, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                flows: Mutex::new(HashMap::new()),
                runner,
                ctx,
                started,
            }),
        }
    }

    /// Register a schedule: validates the spec and the flow file, refuses
    /// duplicate paths, and spawns the trigger task.
    pub fn add_flow(&self, spec: &ScheduleSpec) -> Result<Uuid, SchedulerError> {
        spec.validate()?;
        info!("Loading flow configuration from {}", spec.path);
        FlowDef::validate_path(&self.shared.ctx.flows_root, &spec.path)?;

        {
            let flows = self.shared.flows.lock();
            if flows.values().any(|s| s.path == spec.path) {
                return Err(SchedulerError::AlreadyAdded(spec.path.clone()));
            }
        }

        let cron_schedule = spec
            .cron
            .as_deref()
            .map(|expr| {
                cron::Schedule::from_str(expr).map_err(|e| SchedulerError::BadCron {
                    expression: expr.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()?;

        let id = Uuid::new_v4();
        let timeout = spec.timeout_seconds.unwrap_or(self.shared.ctx.default_timeout);
        let cancel = CancellationToken::new();
        self.shared.flows.lock().insert(
            id,
            ScheduleState {
                path: spec.path.clone(),
                cron: spec.cron.clone(),
                every_seconds: spec.every_seconds,
                timeout_seconds: timeout,
                last_job_id: None,
                running: false,
                cancel: cancel.clone(),
                handle: None,
            },
        );

        let meta = JobMeta::scheduled(
            spec.path.clone(),
            Some(timeout),
            id,
            spec.cron.clone(),
            spec.every_seconds,
        );
        let handle = match (cron_schedule, spec.every_seconds) {
            (Some(schedule), _) => {
                info!("Scheduled flow {} with cron: {}", spec.path, spec.cron.as_deref().unwrap_or(""));
                tokio::spawn(cron_trigger(self.shared.clone(), id, schedule, meta, cancel))
            }
            (None, Some(every)) => {
                info!("Scheduled flow {} to run every {} seconds", spec.path, every);
                tokio::spawn(interval_trigger(self.shared.clone(), id, every, meta, cancel))
            }
            // validate() ruled this out
            (None, None) => unreachable!("schedule spec without trigger"),
        };
        if let Some(state) = self.shared.flows.lock().get_mut(&id) {
            state.handle = Some(handle);
        }

        info!("Added flow {} with ID: {}", spec.path, id);
        Ok(id)
    }

    /// Cancel a schedule's trigger task and drop the entry. Waits up to
    /// five seconds for the task to wind down.
    pub async fn remove_flow(&self, id: Uuid) -> Result<(), SchedulerError> {
        let state = self
            .shared
            .flows
            .lock()
            .remove(&id)
            .ok_or(SchedulerError::NotFound(id))?;
        state.cancel.cancel();
        if let Some(handle) = state.handle {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }
        info!("Removed flow with ID: {id}");
        Ok(())
    }

    /// Snapshot of all registered schedules, ordered by path.
    pub fn list_flows(&self) -> Vec<ScheduleEntry> {
        let flows = self.shared.flows.lock();
        let mut entries: Vec<ScheduleEntry> = flows
            .iter()
            .map(|(id, s)| ScheduleEntry {
                id: *id,
                path: s.path.clone(),
                cron: s.cron.clone(),
                every_seconds: s.every_seconds,
                timeout_seconds: s.timeout_seconds,
                last_job_id: s.last_job_id,
                running: s.running,
            })
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
    }

    /// Open the gate for interval triggers. Cron triggers run from the
    /// moment they are added; interval triggers wait for this.
    pub fn start(&self) {
        self.shared.started.send_replace(true);
        info!("Scheduler started");
    }
}

/// Launch one scheduled run, stamping `last_job_id`/`running` on the entry.
/// A still-running previous job drops the tick with a warning; the runner's
/// uniqueness gate is the only check.
async fn fire(shared: &Arc<Shared>, id: Uuid, meta: JobMeta) {
    match shared.runner.launch(meta).await {
        Ok(launch) => {
            if let Some(state) = shared.flows.lock().get_mut(&id) {
                state.last_job_id = Some(launch.job_id);
                state.running = true;
            }
            let shared = shared.clone();
            tokio::spawn(async move {
                let _ = launch.done.await;
                if let Some(state) = shared.flows.lock().get_mut(&id) {
                    state.running = false;
                }
            });
        }
        Err(StoreError::FlowAlreadyRunning(path)) => {
            warn!("A job for flow '{path}' is already running.");
        }
        Err(e) => error!("Error running scheduled flow: {e}"),
    }
}

async fn cron_trigger(
    shared: Arc<Shared>,
    id: Uuid,
    schedule: cron::Schedule,
    meta: JobMeta,
    cancel: CancellationToken,
) {
    let tz = shared.ctx.timezone;
    loop {
        let now = Utc::now().with_timezone(&tz);
        let Some(next) = schedule.upcoming(tz).next() else {
            warn!("cron schedule for {} has no upcoming fire times", meta.flow_path);
            return;
        };
        let delay = (next - now).to_std().unwrap_or_default();
        info!("Next run for {} is at {}", meta.flow_path, next);
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
        fire(&shared, id, meta.clone()).await;
    }
}

async fn interval_trigger(
    shared: Arc<Shared>,
    id: Uuid,
    every_seconds: u64,
    meta: JobMeta,
    cancel: CancellationToken,
) {
    // Interval triggers only tick once the scheduler has been started.
    let mut started = shared.started.subscribe();
    while !*started.borrow() {
        tokio::select! {
            _ = cancel.cancelled() => return,
            changed = started.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(Duration::from_secs(every_seconds)) => {}
        }
        fire(&shared, id, meta.clone()).await;
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
