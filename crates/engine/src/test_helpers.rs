// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests: a temp data directory with the
//! standard layout and a ready-made context.

use crate::context::FlowContext;
use crate::interpreter::Flow;
use serde_json::Value;
use spooler_core::{Blackboard, FlowOutcome};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

pub(crate) struct TestEnv {
    pub dir: TempDir,
    pub ctx: Arc<FlowContext>,
}

pub(crate) fn test_env() -> TestEnv {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("flows")).unwrap();
    std::fs::create_dir_all(dir.path().join("templates")).unwrap();
    let ctx = Arc::new(FlowContext::new(dir.path()));
    TestEnv { dir, ctx }
}

impl TestEnv {
    pub fn with_ctx(mut self, f: impl FnOnce(FlowContext) -> FlowContext) -> Self {
        self.ctx = Arc::new(f((*self.ctx).clone()));
        self
    }

    pub fn write_flow(&self, rel: &str, src: &str) {
        let path = self.ctx.flows_root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, src).unwrap();
    }

    pub fn write_template(&self, rel: &str, src: &str) {
        std::fs::write(self.ctx.templates_root.join(rel), src).unwrap();
    }

    pub fn write_secrets(&self, src: &str) {
        std::fs::write(&self.ctx.secrets_path, src).unwrap();
    }

    pub async fn run(&self, rel: &str) -> (Blackboard, FlowOutcome) {
        self.run_with_payload(rel, Value::Null).await
    }

    pub async fn run_with_payload(&self, rel: &str, payload: Value) -> (Blackboard, FlowOutcome) {
        let flow = Flow::load(self.ctx.clone(), rel, payload, None, None).unwrap();
        flow.process(CancellationToken::new()).await
    }
}
