// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Asynchronous flow launching: job rows, bounded worker concurrency, and
//! the per-run wall-clock timeout with graceful stop.

use crate::context::FlowContext;
use crate::interpreter::Flow;
use serde_json::Value;
use spooler_core::{Clock, FlowOutcome, JobMeta, JobState, JobStatus, SystemClock};
use spooler_storage::{JobStore, JobUpdate, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use uuid::Uuid;

/// A launched job: its id, plus a receiver resolving to the terminal status
/// when the run finishes. Dropping the receiver is fine.
#[derive(Debug)]
pub struct Launch {
    pub job_id: Uuid,
    pub done: oneshot::Receiver<JobStatus>,
}

/// Launches flows as jobs on a shared bounded worker pool.
#[derive(Clone)]
pub struct FlowRunner {
    store: JobStore,
    ctx: Arc<FlowContext>,
    workers: Arc<Semaphore>,
    clock: SystemClock,
}

impl FlowRunner {
    pub fn new(store: JobStore, ctx: Arc<FlowContext>, max_workers: usize) -> Self {
        Self {
            store,
            ctx,
            workers: Arc::new(Semaphore::new(max_workers.max(1))),
            clock: SystemClock,
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Create the job row and launch the flow asynchronously.
    ///
    /// Fails immediately with [`StoreError::FlowAlreadyRunning`] when a
    /// non-finished job exists for the same flow path; that check is the
    /// single uniqueness gate.
    pub async fn launch(&self, meta: JobMeta) -> Result<Launch, StoreError> {
        let path = meta.flow_path.clone();
        let payload = meta.payload.clone().unwrap_or(Value::Null);
        let timeout = meta.timeout.unwrap_or(self.ctx.default_timeout);

        let job_id = self.store.create(&meta, self.clock.epoch_secs()).await?;

        let cancel = CancellationToken::new();
        let handle = self.spawn_run(job_id, path.clone(), payload, cancel.clone());
        let (done_tx, done_rx) = oneshot::channel();
        self.spawn_supervisor(job_id, path, timeout, cancel, handle, done_tx);

        Ok(Launch { job_id, done: done_rx })
    }

    /// The worker task: waits for a pool slot, runs the interpreter, and
    /// finalizes the job row from the outcome.
    fn spawn_run(
        &self,
        job_id: Uuid,
        path: String,
        payload: Value,
        cancel: CancellationToken,
    ) -> JoinHandle<JobStatus> {
        let store = self.store.clone();
        let ctx = self.ctx.clone();
        let workers = self.workers.clone();
        let clock = self.clock.clone();

        tokio::spawn(async move {
            let _permit = workers.acquire_owned().await;

            let update = JobUpdate::default()
                .state(JobState::Running)
                .start_time(clock.epoch_secs());
            if let Err(e) = store.update(job_id, update).await {
                error!(%job_id, "failed to mark job running: {e}");
            }

            let (result, outcome) =
                match Flow::load(ctx, &path, payload, None, Some(&job_id.to_string())) {
                    Ok(flow) => {
                        let (board, outcome) = flow.process(cancel).await;
                        (Some(board.into_value()), outcome)
                    }
                    Err(e) => (None, FlowOutcome::Failed(e.to_string())),
                };

            let status = outcome.status();
            let mut update = JobUpdate::default()
                .state(JobState::Finished)
                .status(status)
                .end_time(clock.epoch_secs());
            if let Some(result) = result {
                update = update.result(result);
            }
            if !outcome.is_success() {
                update = update.errors(outcome.message());
            }
            if let Err(e) = store.update(job_id, update).await {
                error!(%job_id, "failed to finalize job: {e}");
            }
            status
        })
    }

    /// The supervisor task: waits on the worker with the wall-clock timeout.
    /// On elapse it raises the cancellation signal, moves the job to
    /// `stopping`, waits for the worker to return at the next step boundary,
    /// and finalizes the row as a timeout failure.
    fn spawn_supervisor(
        &self,
        job_id: Uuid,
        path: String,
        timeout: u64,
        cancel: CancellationToken,
        mut handle: JoinHandle<JobStatus>,
        done_tx: oneshot::Sender<JobStatus>,
    ) {
        let store = self.store.clone();
        let clock = self.clock.clone();

        tokio::spawn(async move {
            let status = match tokio::time::timeout(Duration::from_secs(timeout), &mut handle).await
            {
                Ok(Ok(status)) => status,
                Ok(Err(join_err)) => {
                    error!(%job_id, "flow worker task failed: {join_err}");
                    let update = JobUpdate::default()
                        .state(JobState::Finished)
                        .status(JobStatus::Failed)
                        .errors(join_err.to_string())
                        .end_time(clock.epoch_secs());
                    if let Err(e) = store.update(job_id, update).await {
                        error!(%job_id, "failed to finalize job: {e}");
                    }
                    JobStatus::Failed
                }
                Err(_elapsed) => {
                    let message = format!("Flow {path} timed out after {timeout} seconds");
                    warn!(%job_id, "{message}");
                    cancel.cancel();
                    if let Err(e) = store
                        .update(job_id, JobUpdate::default().state(JobState::Stopping))
                        .await
                    {
                        error!(%job_id, "failed to mark job stopping: {e}");
                    }
                    // The interpreter exits at the next step boundary; wait
                    // for it, then record the timeout as the final word.
                    let _ = (&mut handle).await;
                    let update = JobUpdate::default()
                        .state(JobState::Finished)
                        .status(JobStatus::Failed)
                        .errors(message)
                        .end_time(clock.epoch_secs());
                    if let Err(e) = store.update(job_id, update).await {
                        error!(%job_id, "failed to finalize timed-out job: {e}");
                    }
                    JobStatus::Failed
                }
            };
            let _ = done_tx.send(status);
        });
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
