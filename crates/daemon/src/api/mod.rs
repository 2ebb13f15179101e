// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP API surface: router, bearer-token middleware and error mapping.

pub mod handlers;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;
use spooler_engine::{FlowContext, FlowRunner, Scheduler};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    pub scheduler: Scheduler,
    pub runner: Arc<FlowRunner>,
    pub ctx: Arc<FlowContext>,
    pub token: String,
    pub log_file: PathBuf,
}

/// A handler failure: status code plus a JSON `{"error": …}` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({"error": self.message}))).into_response()
    }
}

/// Build the full router with auth, CORS and request tracing.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/schedules", get(handlers::list_schedules).post(handlers::add_schedule))
        .route("/api/v1/schedules/{id}", delete(handlers::remove_schedule))
        .route(
            "/api/v1/jobs",
            post(handlers::launch_job)
                .get(handlers::list_jobs)
                .delete(handlers::delete_jobs),
        )
        .route("/api/v1/jobs/{id}", get(handlers::get_job).delete(handlers::delete_job))
        .route("/api/v1/logs", get(handlers::fetch_logs))
        .layer(middleware::from_fn_with_state(state.clone(), validate_token))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bearer-token check. Docs and static assets stay reachable without it.
async fn validate_token(
    State(state): State<ApiState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if path.starts_with("/api/docs") || path.starts_with("/static") {
        return next.run(request).await;
    }

    let expected = format!("Bearer {}", state.token);
    let authorized = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        return ApiError::new(StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }
    next.run(request).await
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
