// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{test_env, TestEnv};

async fn runner(env: &TestEnv) -> FlowRunner {
    let store = JobStore::open(&env.dir.path().join("jobs.sqlite")).await.unwrap();
    FlowRunner::new(store, env.ctx.clone(), 4)
}

const QUICK_FLOW: &str = r#"
name: quick
steps:
  - name: A
    type: set_fact
    set_fact:
      value: { x: 1 }
"#;

#[tokio::test]
async fn successful_run_finalizes_the_job() {
    let env = test_env();
    env.write_flow("quick.yml", QUICK_FLOW);
    let runner = runner(&env).await;

    let launch = runner
        .launch(JobMeta::api("quick.yml", None, Some(10)))
        .await
        .unwrap();
    let status = launch.done.await.unwrap();
    assert_eq!(status, JobStatus::Success);

    let job = runner.store().get(launch.job_id).await.unwrap().unwrap();
    assert_eq!(job.state, JobState::Finished);
    assert_eq!(job.status, JobStatus::Success);
    assert!(job.end_time.is_some());
    assert!(job.errors.is_none());
    let result = job.result.unwrap();
    assert_eq!(result["A"], serde_json::json!({"x": 1}));
    assert_eq!(result["__job_id__"], serde_json::json!(launch.job_id.to_string()));
}

#[tokio::test]
async fn exit_outcome_maps_to_exit_status() {
    let env = test_env();
    env.write_flow(
        "bail.yml",
        r#"
name: bail
steps:
  - name: out
    type: exit
    exit:
      message: done
"#,
    );
    let runner = runner(&env).await;

    let launch = runner.launch(JobMeta::api("bail.yml", None, Some(10))).await.unwrap();
    assert_eq!(launch.done.await.unwrap(), JobStatus::Exit);

    let job = runner.store().get(launch.job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Exit);
    assert!(job.errors.unwrap().contains("done"));
}

#[tokio::test]
async fn failed_flow_records_the_message() {
    let env = test_env();
    env.write_flow(
        "broken.yml",
        r#"
name: broken
steps:
  - name: nope
    type: jq
    jq:
      expression: "."
      data_key: missing
"#,
    );
    let runner = runner(&env).await;

    let launch = runner.launch(JobMeta::api("broken.yml", None, Some(10))).await.unwrap();
    assert_eq!(launch.done.await.unwrap(), JobStatus::Failed);

    let job = runner.store().get(launch.job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.errors.unwrap().starts_with("Flow broken failed,"));
    // the structured error list rides along in the stored result
    let result = job.result.unwrap();
    assert_eq!(result["__errors__"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_flow_file_fails_the_job() {
    let env = test_env();
    let runner = runner(&env).await;

    let launch = runner.launch(JobMeta::api("ghost.yml", None, Some(10))).await.unwrap();
    assert_eq!(launch.done.await.unwrap(), JobStatus::Failed);

    let job = runner.store().get(launch.job_id).await.unwrap().unwrap();
    assert!(job.errors.unwrap().contains("ghost.yml"));
    assert!(job.result.is_none());
}

#[tokio::test]
async fn timeout_stops_the_flow_and_fails_the_job() {
    let env = test_env();
    env.write_flow(
        "slow.yml",
        r#"
name: slow
steps:
  - name: nap
    type: sleep
    sleep:
      seconds: 30
"#,
    );
    let runner = runner(&env).await;

    let launch = runner.launch(JobMeta::api("slow.yml", None, Some(1))).await.unwrap();
    assert_eq!(launch.done.await.unwrap(), JobStatus::Failed);

    let job = runner.store().get(launch.job_id).await.unwrap().unwrap();
    assert_eq!(job.state, JobState::Finished);
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.errors.unwrap().contains("timed out after 1 seconds"));
    assert!(job.end_time.is_some());
}

#[tokio::test]
async fn second_launch_for_same_flow_is_rejected() {
    let env = test_env();
    env.write_flow(
        "slow.yml",
        r#"
name: slow
steps:
  - name: nap
    type: sleep
    sleep:
      seconds: 5
"#,
    );
    let runner = runner(&env).await;

    let first = runner.launch(JobMeta::api("slow.yml", None, Some(30))).await.unwrap();
    let err = runner.launch(JobMeta::api("slow.yml", None, Some(30))).await.unwrap_err();
    assert!(matches!(err, StoreError::FlowAlreadyRunning(_)));

    // a different flow is unaffected
    env.write_flow("quick.yml", QUICK_FLOW);
    runner.launch(JobMeta::api("quick.yml", None, Some(30))).await.unwrap();

    drop(first);
}
