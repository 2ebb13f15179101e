// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Route handlers for schedules, jobs and logs.

use super::{ApiError, ApiState};
use crate::logs::{self, LogError};
use crate::timeparse::{parse_time_param, to_iso};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use spooler_core::{JobMeta, JobRecord, JobState, JobStatus, ScheduleSpec};
use spooler_engine::SchedulerError;
use spooler_flow::{FlowDef, FlowError};
use spooler_storage::{JobFilter, StoreError};
use tracing::error;
use uuid::Uuid;

fn scheduler_error(e: SchedulerError) -> ApiError {
    match e {
        SchedulerError::AlreadyAdded(_) => ApiError::new(StatusCode::CONFLICT, e.to_string()),
        SchedulerError::NotFound(_) => ApiError::not_found(e.to_string()),
        SchedulerError::Flow(FlowError::NotFound(_)) => ApiError::not_found(e.to_string()),
        SchedulerError::Flow(_) | SchedulerError::Spec(_) | SchedulerError::BadCron { .. } => {
            ApiError::bad_request(e.to_string())
        }
    }
}

fn flow_error(e: FlowError) -> ApiError {
    match e {
        FlowError::NotFound(_) => ApiError::not_found(e.to_string()),
        other => ApiError::bad_request(other.to_string()),
    }
}

fn store_error(e: StoreError) -> ApiError {
    match e {
        StoreError::FlowAlreadyRunning(_) => ApiError::new(StatusCode::CONFLICT, e.to_string()),
        other => {
            error!("job store failure: {other}");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

// --- schedules ---

pub async fn list_schedules(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({"schedules": state.scheduler.list_flows()}))
}

pub async fn add_schedule(
    State(state): State<ApiState>,
    Json(spec): Json<ScheduleSpec>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let path = spec.path.clone();
    let schedule_id = state.scheduler.add_flow(&spec).map_err(scheduler_error)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": format!("Schedule for '{path}' added successfully"),
            "schedule_id": schedule_id,
        })),
    ))
}

pub async fn remove_schedule(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::not_found(format!("schedule {id} not found")))?;
    state.scheduler.remove_flow(id).await.map_err(scheduler_error)?;
    Ok(Json(json!({"status": format!("Removed flow with ID: {id}")})))
}

// --- jobs ---

#[derive(Debug, Deserialize)]
pub struct LaunchRequest {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

pub async fn launch_job(
    State(state): State<ApiState>,
    Json(request): Json<LaunchRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Some(path) = request.path else {
        return Err(ApiError::bad_request("flow path is required"));
    };
    FlowDef::validate_path(&state.ctx.flows_root, &path).map_err(flow_error)?;

    let meta = JobMeta::api(path, request.data, request.timeout_seconds);
    let launch = state.runner.launch(meta).await.map_err(store_error)?;
    Ok((StatusCode::ACCEPTED, Json(json!({"job_id": launch.job_id}))))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListJobsQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub state: Option<String>,
    pub status: Option<String>,
    pub start_time_from: Option<String>,
    pub start_time_to: Option<String>,
    pub end_time_from: Option<String>,
    pub end_time_to: Option<String>,
}

fn parse_number(value: Option<&str>, default: i64) -> Result<i64, ApiError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ApiError::bad_request("Invalid parameter")),
    }
}

fn parse_state(value: Option<&str>) -> Result<Option<JobState>, ApiError> {
    value
        .map(|raw| JobState::parse(raw).ok_or_else(|| ApiError::bad_request("Invalid parameter")))
        .transpose()
}

fn parse_status(value: Option<&str>) -> Result<Option<JobStatus>, ApiError> {
    value
        .map(|raw| JobStatus::parse(raw).ok_or_else(|| ApiError::bad_request("Invalid parameter")))
        .transpose()
}

fn parse_time(value: Option<&str>, state: &ApiState) -> Result<Option<i64>, ApiError> {
    value
        .map(|raw| {
            parse_time_param(raw, state.ctx.timezone)
                .map_err(|e| ApiError::bad_request(e.to_string()))
        })
        .transpose()
}

/// Listing DTO: metadata only, ISO timestamps, no result payload.
fn job_summary(job: &JobRecord) -> Value {
    json!({
        "id": job.id,
        "meta": job.meta,
        "errors": job.errors,
        "state": job.state,
        "status": job.status,
        "start_time": to_iso(job.start_time),
        "end_time": job.end_time.map(to_iso),
    })
}

pub async fn list_jobs(
    State(state): State<ApiState>,
    Query(query): Query<ListJobsQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = parse_number(query.limit.as_deref(), 50)?;
    let offset = parse_number(query.offset.as_deref(), 0)?;
    let filter = JobFilter {
        limit,
        offset,
        state: parse_state(query.state.as_deref())?,
        status: parse_status(query.status.as_deref())?,
        start_time_from: parse_time(query.start_time_from.as_deref(), &state)?,
        start_time_to: parse_time(query.start_time_to.as_deref(), &state)?,
        end_time_from: parse_time(query.end_time_from.as_deref(), &state)?,
        end_time_to: parse_time(query.end_time_to.as_deref(), &state)?,
    };

    let jobs = state.runner.store().list(&filter).await.map_err(store_error)?;
    let jobs: Vec<Value> = jobs.iter().map(job_summary).collect();
    Ok(Json(json!({"jobs": jobs, "limit": limit, "offset": offset})))
}

pub async fn get_job(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::not_found("Job not found"))?;
    let job = state
        .runner
        .store()
        .get(id)
        .await
        .map_err(store_error)?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;
    Ok(Json(json!({
        "id": job.id,
        "meta": job.meta,
        "state": job.state,
        "status": job.status,
        "start_time": to_iso(job.start_time),
        "end_time": job.end_time.map(to_iso),
        "result": job.result,
        "errors": job.errors,
    })))
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteJobsQuery {
    pub older_than_days: Option<String>,
    pub status: Option<String>,
    pub state: Option<String>,
}

pub async fn delete_jobs(
    State(state): State<ApiState>,
    Query(query): Query<DeleteJobsQuery>,
) -> Result<Json<Value>, ApiError> {
    let days = query
        .older_than_days
        .as_deref()
        .map(|raw| raw.parse::<i64>().map_err(|_| ApiError::bad_request("Invalid parameter")))
        .transpose()?;
    let status = parse_status(query.status.as_deref())?;
    let job_state = parse_state(query.state.as_deref())?;

    let now = chrono::Utc::now().timestamp();
    let deleted = state
        .runner
        .store()
        .delete_filtered(days, status, job_state, now)
        .await
        .map_err(store_error)?;
    Ok(Json(json!({
        "deleted": deleted,
        "older_than_days": days,
        "status": query.status,
        "state": query.state,
    })))
}

pub async fn delete_job(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::not_found("Job not found"))?;
    let deleted = state.runner.store().delete(id).await.map_err(store_error)?;
    if deleted == 0 {
        return Err(ApiError::not_found("Job not found"));
    }
    Ok(Json(json!({"deleted": 1, "job_id": id})))
}

// --- logs ---

#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    pub lines: Option<String>,
}

pub async fn fetch_logs(
    State(state): State<ApiState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Value>, ApiError> {
    let lines = match query.lines.as_deref() {
        None => 100,
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| ApiError::bad_request("Invalid 'lines' parameter"))?,
    };
    let lines = logs::tail(&state.log_file, lines).map_err(|e| match e {
        LogError::InvalidLines => ApiError::bad_request(e.to_string()),
        LogError::NotFound(_) => ApiError::not_found(e.to_string()),
        LogError::Io(_) => ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    })?;
    Ok(Json(json!({"logs": lines})))
}
