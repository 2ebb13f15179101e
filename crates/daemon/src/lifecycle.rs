// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service startup and the running state handed to the binary.

use crate::api::{self, ApiState};
use crate::config::{ConfigError, ServiceConfig};
use crate::{env, logs};
use spooler_core::{Clock, SystemClock};
use spooler_engine::{FlowContext, FlowRunner, Scheduler};
use spooler_storage::{JobStore, StoreError};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everything the binary needs to serve: the bound listener, the router and
/// the logging guard that must stay alive for file logging to flush.
pub struct ServiceState {
    pub listener: tokio::net::TcpListener,
    pub router: axum::Router,
    pub scheduler: Scheduler,
    _log_guard: tracing_appender::non_blocking::WorkerGuard,
}

impl ServiceState {
    pub async fn serve(self) -> Result<(), std::io::Error> {
        axum::serve(self.listener, self.router).await
    }
}

/// Start the service.
pub async fn startup() -> Result<ServiceState, LifecycleError> {
    // 1. Create the data directory layout
    let data_path = env::data_path();
    let flows_path = env::flows_path();
    let templates_path = env::templates_path();
    let log_path = env::log_path();
    for dir in [&data_path, &flows_path, &templates_path, &log_path] {
        std::fs::create_dir_all(dir)?;
    }

    // 2. Logging: stderr plus the rolling file the logs endpoint tails
    let (log_guard, log_file) = logs::init(&log_path, &env::log_file_name(), &env::log_level());
    info!("Starting spooler service");

    // 3. Job store; anything unfinished from a previous run is recovered
    let store = JobStore::open(&env::jobs_db_path()).await?;
    store.abandon_running(SystemClock.epoch_secs()).await?;

    // 4. Execution context shared by runner, scheduler and interpreters
    let mut ctx = FlowContext::new(data_path)
        .flows_root(flows_path)
        .templates_root(templates_path)
        .secrets_path(env::secrets_path())
        .timezone(env::timezone())
        .default_timeout(env::flow_timeout_seconds())
        .vault_cache_ttl(env::hashicorp_vault_cache_ttl());
    if let Some(token) = env::hashicorp_vault_token() {
        ctx = ctx.vault_token(token);
    }
    let ctx = Arc::new(ctx);

    let runner = Arc::new(FlowRunner::new(store, ctx.clone(), env::flow_max_workers()));
    let scheduler = Scheduler::new(runner.clone(), ctx.clone());

    // 5. Autostart schedules; individual failures are logged, not fatal
    let config = ServiceConfig::load(&env::config_file())?;
    for spec in &config.autostart_flows {
        if let Err(e) = scheduler.add_flow(spec) {
            error!("Failed to add flow: {e}");
        }
    }
    scheduler.start();

    // 6. Bind the API listener last, once everything behind it is ready
    let listener =
        tokio::net::TcpListener::bind(("0.0.0.0", env::api_port())).await?;
    info!("API listening on port {}", env::api_port());

    let router = api::router(ApiState {
        scheduler: scheduler.clone(),
        runner,
        ctx,
        token: env::api_token(),
        log_file,
    });

    Ok(ServiceState { listener, router, scheduler, _log_guard: log_guard })
}
