// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job lifecycle table: create, partial update, filtered list/delete, and
//! restart recovery.

use spooler_core::{JobMeta, JobRecord, JobState, JobStatus};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, SqlitePool};
use std::path::Path;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("a job for flow '{0}' is already running")]
    FlowAlreadyRunning(String),
    #[error("invalid job row {id}: {message}")]
    Corrupt { id: String, message: String },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS jobs (
    id         TEXT PRIMARY KEY,
    meta       TEXT NOT NULL,
    result     TEXT,
    errors     TEXT,
    state      TEXT NOT NULL DEFAULT 'pending',
    status     TEXT NOT NULL DEFAULT 'unknown',
    start_time INTEGER NOT NULL,
    end_time   INTEGER
);
CREATE INDEX IF NOT EXISTS idx_jobs_start_time ON jobs (start_time);
";

/// Partial update of a job row. Unset fields are left untouched.
#[derive(Debug, Default, Clone)]
pub struct JobUpdate {
    pub state: Option<JobState>,
    pub status: Option<JobStatus>,
    pub result: Option<serde_json::Value>,
    pub errors: Option<String>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

impl JobUpdate {
    pub fn state(mut self, state: JobState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn result(mut self, result: serde_json::Value) -> Self {
        self.result = Some(result);
        self
    }

    pub fn errors(mut self, errors: impl Into<String>) -> Self {
        self.errors = Some(errors.into());
        self
    }

    pub fn start_time(mut self, secs: i64) -> Self {
        self.start_time = Some(secs);
        self
    }

    pub fn end_time(mut self, secs: i64) -> Self {
        self.end_time = Some(secs);
        self
    }
}

/// Listing filter. Time bounds are epoch seconds, inclusive.
#[derive(Debug, Clone)]
pub struct JobFilter {
    pub limit: i64,
    pub offset: i64,
    pub state: Option<JobState>,
    pub status: Option<JobStatus>,
    pub start_time_from: Option<i64>,
    pub start_time_to: Option<i64>,
    pub end_time_from: Option<i64>,
    pub end_time_to: Option<i64>,
}

impl Default for JobFilter {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
            state: None,
            status: None,
            start_time_from: None,
            start_time_to: None,
            end_time_from: None,
            end_time_to: None,
        }
    }
}

/// The persistent job table.
///
/// The database is opened in WAL mode so worker tasks and API handlers can
/// use the pool concurrently.
#[derive(Clone)]
pub struct JobStore {
    pool: SqlitePool,
}

impl JobStore {
    /// Open (or create) the job database at `path` and ensure the schema.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Create a job row in `pending`/`unknown`.
    ///
    /// Fails with [`StoreError::FlowAlreadyRunning`] when any non-finished
    /// job exists for the same `meta.flow_path`. The probe matches the
    /// serialized meta blob; `flow_path` is application-controlled, so the
    /// substring match is unambiguous.
    pub async fn create(&self, meta: &JobMeta, now: i64) -> Result<Uuid, StoreError> {
        let probe = format!(r#"%"flow_path":"{}"%"#, meta.flow_path);
        let running: Option<(String,)> =
            sqlx::query_as("SELECT id FROM jobs WHERE state != 'finished' AND meta LIKE ? LIMIT 1")
                .bind(&probe)
                .fetch_optional(&self.pool)
                .await?;
        if running.is_some() {
            return Err(StoreError::FlowAlreadyRunning(meta.flow_path.clone()));
        }

        let id = Uuid::new_v4();
        let meta_json = serde_json::to_string(meta)
            .map_err(|e| StoreError::Corrupt { id: id.to_string(), message: e.to_string() })?;
        sqlx::query(
            "INSERT INTO jobs (id, meta, state, status, start_time) \
             VALUES (?, ?, 'pending', 'unknown', ?)",
        )
        .bind(id.to_string())
        .bind(meta_json)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<JobRecord>, StoreError> {
        let row = sqlx::query("SELECT * FROM jobs WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(record_from_row).transpose()
    }

    /// Apply a partial update. Unknown ids are ignored, matching the
    /// fire-and-forget updates of the runner's finalization path.
    pub async fn update(&self, id: Uuid, patch: JobUpdate) -> Result<(), StoreError> {
        let mut builder = QueryBuilder::new("UPDATE jobs SET ");
        let mut fields = builder.separated(", ");
        let mut any = false;
        if let Some(state) = patch.state {
            fields.push("state = ").push_bind_unseparated(state.to_string());
            any = true;
        }
        if let Some(status) = patch.status {
            fields.push("status = ").push_bind_unseparated(status.to_string());
            any = true;
        }
        if let Some(result) = patch.result {
            fields.push("result = ").push_bind_unseparated(result.to_string());
            any = true;
        }
        if let Some(errors) = patch.errors {
            fields.push("errors = ").push_bind_unseparated(errors);
            any = true;
        }
        if let Some(start_time) = patch.start_time {
            fields.push("start_time = ").push_bind_unseparated(start_time);
            any = true;
        }
        if let Some(end_time) = patch.end_time {
            fields.push("end_time = ").push_bind_unseparated(end_time);
            any = true;
        }
        if !any {
            return Ok(());
        }
        builder.push(" WHERE id = ").push_bind(id.to_string());
        builder.build().execute(&self.pool).await?;
        Ok(())
    }

    /// List jobs ordered by `start_time DESC`.
    pub async fn list(&self, filter: &JobFilter) -> Result<Vec<JobRecord>, StoreError> {
        let mut builder = QueryBuilder::new("SELECT * FROM jobs WHERE 1 = 1");
        if let Some(state) = filter.state {
            builder.push(" AND state = ").push_bind(state.to_string());
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.to_string());
        }
        if let Some(from) = filter.start_time_from {
            builder.push(" AND start_time >= ").push_bind(from);
        }
        if let Some(to) = filter.start_time_to {
            builder.push(" AND start_time <= ").push_bind(to);
        }
        if let Some(from) = filter.end_time_from {
            builder.push(" AND end_time >= ").push_bind(from);
        }
        if let Some(to) = filter.end_time_to {
            builder.push(" AND end_time <= ").push_bind(to);
        }
        builder
            .push(" ORDER BY start_time DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);
        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.into_iter().map(record_from_row).collect()
    }

    /// Delete one job. Returns the number of deleted rows (0 or 1).
    pub async fn delete(&self, id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Bulk delete by age / status / state.
    ///
    /// The age filter only applies to rows with an `end_time`; jobs that
    /// never finished are not age-deleted.
    pub async fn delete_filtered(
        &self,
        older_than_days: Option<i64>,
        status: Option<JobStatus>,
        state: Option<JobState>,
        now: i64,
    ) -> Result<u64, StoreError> {
        let mut builder = QueryBuilder::new("DELETE FROM jobs WHERE 1 = 1");
        if let Some(days) = older_than_days {
            let cutoff = now - days * 86_400;
            builder
                .push(" AND end_time IS NOT NULL AND end_time < ")
                .push_bind(cutoff);
        }
        if let Some(status) = status {
            builder.push(" AND status = ").push_bind(status.to_string());
        }
        if let Some(state) = state {
            builder.push(" AND state = ").push_bind(state.to_string());
        }
        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Close out every non-finished job after a service restart.
    ///
    /// Interrupted runs cannot be resumed, so they finish as
    /// `finished`/`unknown` with a note appended to their errors.
    pub async fn abandon_running(&self, now: i64) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE jobs SET state = 'finished', status = 'unknown', \
             errors = COALESCE(errors, '') || char(10) || 'Abandoned due to service restart.', \
             end_time = ? \
             WHERE state != 'finished'",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        let abandoned = result.rows_affected();
        if abandoned > 0 {
            info!(abandoned, "abandoned unfinished jobs from previous run");
        }
        Ok(abandoned)
    }
}

fn record_from_row(row: SqliteRow) -> Result<JobRecord, StoreError> {
    let id: String = row.try_get("id")?;
    let corrupt = |message: String| StoreError::Corrupt { id: id.clone(), message };

    let meta: String = row.try_get("meta")?;
    let meta: JobMeta = serde_json::from_str(&meta).map_err(|e| corrupt(e.to_string()))?;
    let result: Option<String> = row.try_get("result")?;
    let result = result
        .map(|r| serde_json::from_str(&r))
        .transpose()
        .map_err(|e| corrupt(e.to_string()))?;
    let state: String = row.try_get("state")?;
    let state = JobState::parse(&state).ok_or_else(|| corrupt(format!("bad state '{state}'")))?;
    let status: String = row.try_get("status")?;
    let status =
        JobStatus::parse(&status).ok_or_else(|| corrupt(format!("bad status '{status}'")))?;

    Ok(JobRecord {
        id: Uuid::parse_str(&id).map_err(|e| corrupt(e.to_string()))?,
        meta,
        result,
        errors: row.try_get("errors")?,
        state,
        status,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
    })
}

#[cfg(test)]
#[path = "job_store_tests.rs"]
mod tests;
