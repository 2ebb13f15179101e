// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use spooler_storage::JobStore;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

const QUICK_FLOW: &str = r#"
name: quick
steps:
  - name: A
    type: set_fact
    set_fact:
      value: { x: 1 }
"#;

struct TestApi {
    _dir: TempDir,
    state: ApiState,
    router: Router,
}

async fn test_api() -> TestApi {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("flows")).unwrap();
    std::fs::create_dir_all(dir.path().join("templates")).unwrap();
    std::fs::write(dir.path().join("flows/quick.yml"), QUICK_FLOW).unwrap();

    let ctx = Arc::new(FlowContext::new(dir.path()));
    let store = JobStore::open(&dir.path().join("jobs.sqlite")).await.unwrap();
    let runner = Arc::new(FlowRunner::new(store, ctx.clone(), 4));
    let scheduler = Scheduler::new(runner.clone(), ctx.clone());
    let state = ApiState {
        scheduler,
        runner,
        ctx,
        token: "t-test".to_string(),
        log_file: dir.path().join("logs/svc.log"),
    };
    TestApi { router: router(state.clone()), state, _dir: dir }
}

impl TestApi {
    async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, "Bearer t-test");
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response =
            self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Poll until the job leaves the running states.
    async fn wait_finished(&self, job_id: &str) -> Value {
        for _ in 0..100 {
            let (status, job) = self.request("GET", &format!("/api/v1/jobs/{job_id}"), None).await;
            assert_eq!(status, StatusCode::OK);
            if job["state"] == json!("finished") {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("job {job_id} did not finish");
    }
}

#[tokio::test]
async fn requests_without_token_are_unauthorized() {
    let api = test_api().await;
    let response = api
        .router
        .clone()
        .oneshot(Request::builder().uri("/api/v1/schedules").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_token_is_unauthorized() {
    let api = test_api().await;
    let response = api
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/schedules")
                .header(header::AUTHORIZATION, "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn schedule_lifecycle_over_http() {
    let api = test_api().await;

    let (status, body) = api
        .request(
            "POST",
            "/api/v1/schedules",
            Some(json!({"path": "quick.yml", "every_seconds": 300})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let schedule_id = body["schedule_id"].as_str().unwrap().to_string();

    let (status, body) = api.request("GET", "/api/v1/schedules", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["schedules"].as_array().unwrap().len(), 1);
    assert_eq!(body["schedules"][0]["path"], json!("quick.yml"));

    // same path again conflicts
    let (status, _) = api
        .request(
            "POST",
            "/api/v1/schedules",
            Some(json!({"path": "quick.yml", "every_seconds": 60})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) =
        api.request("DELETE", &format!("/api/v1/schedules/{schedule_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) =
        api.request("DELETE", &format!("/api/v1/schedules/{schedule_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn schedule_for_missing_flow_is_404() {
    let api = test_api().await;
    let (status, _) = api
        .request("POST", "/api/v1/schedules", Some(json!({"path": "ghost.yml", "cron": "* * * * * *"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn schedule_with_both_triggers_is_400() {
    let api = test_api().await;
    let (status, _) = api
        .request(
            "POST",
            "/api/v1/schedules",
            Some(json!({"path": "quick.yml", "cron": "* * * * * *", "every_seconds": 5})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn job_lifecycle_over_http() {
    let api = test_api().await;

    let (status, body) =
        api.request("POST", "/api/v1/jobs", Some(json!({"path": "quick.yml"}))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let job_id = body["job_id"].as_str().unwrap().to_string();

    let job = api.wait_finished(&job_id).await;
    assert_eq!(job["status"], json!("success"));
    assert_eq!(job["result"]["A"], json!({"x": 1}));
    assert_eq!(job["meta"]["source"], json!("api"));

    // the listing carries metadata but no result payload
    let (status, body) = api.request("GET", "/api/v1/jobs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["limit"], json!(50));
    let jobs = body["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert!(jobs[0].get("result").is_none());

    let (status, body) = api.request("DELETE", &format!("/api/v1/jobs/{job_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], json!(1));
    let (status, _) = api.request("GET", &format!("/api/v1/jobs/{job_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn launch_without_path_is_400() {
    let api = test_api().await;
    let (status, body) = api.request("POST", "/api/v1/jobs", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("flow path is required"));
}

#[tokio::test]
async fn launch_of_missing_flow_is_404() {
    let api = test_api().await;
    let (status, _) =
        api.request("POST", "/api/v1/jobs", Some(json!({"path": "ghost.yml"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn launch_of_unparseable_flow_is_400() {
    let api = test_api().await;
    std::fs::write(api.state.ctx.flows_root.join("bad.yml"), "name: [unclosed").unwrap();
    let (status, _) = api.request("POST", "/api/v1/jobs", Some(json!({"path": "bad.yml"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn second_launch_conflicts_while_running() {
    let api = test_api().await;
    std::fs::write(
        api.state.ctx.flows_root.join("slow.yml"),
        "name: slow\nsteps:\n  - name: nap\n    type: sleep\n    sleep:\n      seconds: 5\n",
    )
    .unwrap();

    let (status, _) =
        api.request("POST", "/api/v1/jobs", Some(json!({"path": "slow.yml"}))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let (status, _) =
        api.request("POST", "/api/v1/jobs", Some(json!({"path": "slow.yml"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn list_jobs_rejects_bad_filters() {
    let api = test_api().await;
    let (status, _) = api.request("GET", "/api/v1/jobs?state=paused", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = api.request("GET", "/api/v1/jobs?limit=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = api.request("GET", "/api/v1/jobs?start_time_from=whenever", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_jobs_filtered_reports_the_filters() {
    let api = test_api().await;
    let (status, body) =
        api.request("DELETE", "/api/v1/jobs?older_than_days=7&status=failed", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], json!(0));
    assert_eq!(body["older_than_days"], json!(7));
    assert_eq!(body["status"], json!("failed"));
}

#[tokio::test]
async fn logs_endpoint_tails_the_file() {
    let api = test_api().await;
    std::fs::create_dir_all(api.state.log_file.parent().unwrap()).unwrap();
    std::fs::write(&api.state.log_file, "alpha\nbeta\ngamma\n").unwrap();

    let (status, body) = api.request("GET", "/api/v1/logs?lines=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["logs"], json!(["beta", "gamma"]));

    let (status, _) = api.request("GET", "/api/v1/logs?lines=nope", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logs_endpoint_404_when_file_missing() {
    let api = test_api().await;
    let (status, _) = api.request("GET", "/api/v1/logs", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
