// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

fn path_var(name: &str, default: impl FnOnce() -> PathBuf) -> PathBuf {
    std::env::var(name).map(PathBuf::from).unwrap_or_else(|_| default())
}

/// API listen port (default 5000).
pub fn api_port() -> u16 {
    std::env::var("API_PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(5000)
}

/// Bearer token expected on API requests.
pub fn api_token() -> String {
    std::env::var("API_TOKEN").unwrap_or_else(|_| "default_token".to_string())
}

/// Root data directory; everything else defaults to paths under it.
pub fn data_path() -> PathBuf {
    path_var("DATA_PATH", || PathBuf::from("data"))
}

pub fn flows_path() -> PathBuf {
    path_var("FLOWS_PATH", || data_path().join("flows"))
}

pub fn templates_path() -> PathBuf {
    path_var("TEMPLATES_PATH", || data_path().join("templates"))
}

pub fn secrets_path() -> PathBuf {
    path_var("SECRETS_PATH", || data_path().join("secrets.yml"))
}

pub fn jobs_db_path() -> PathBuf {
    path_var("JOBS_DB_PATH", || data_path().join("jobs.sqlite"))
}

pub fn config_file() -> PathBuf {
    path_var("CONFIG_FILE", || data_path().join("config.yml"))
}

pub fn log_path() -> PathBuf {
    path_var("LOG_PATH", || data_path().join("logs"))
}

pub fn log_file_name() -> String {
    std::env::var("LOG_FILE_NAME").unwrap_or_else(|_| "spooler.log".to_string())
}

/// Log level filter (default `info`).
pub fn log_level() -> String {
    std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()).to_lowercase()
}

/// IANA timezone used for cron fire times and date-string filters.
pub fn timezone() -> chrono_tz::Tz {
    std::env::var("TIMEZONE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(chrono_tz::Europe::Brussels)
}

/// Default per-run timeout (default 600s).
pub fn flow_timeout_seconds() -> u64 {
    std::env::var("FLOW_TIMEOUT_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(600)
}

/// Size of the shared flow worker pool (default 4).
pub fn flow_max_workers() -> usize {
    std::env::var("FLOW_MAX_WORKERS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(4)
}

pub fn hashicorp_vault_token() -> Option<String> {
    std::env::var("HASHICORP_VAULT_TOKEN").ok().filter(|s| !s.is_empty())
}

/// Vault response cache TTL (default 60s).
pub fn hashicorp_vault_cache_ttl() -> Duration {
    let secs = std::env::var("HASHICORP_VAULT_CACHE_TTL")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(60);
    Duration::from_secs(secs)
}
