// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared execution environment for flow runs.

use std::path::PathBuf;
use std::time::Duration;

/// Paths and settings every flow run needs: where flows, templates and data
/// files live, which secrets file to load, and the vault/timeout defaults.
///
/// One instance is built at service startup and shared (`Arc`) by the
/// runner, the scheduler, and every interpreter they spawn.
#[derive(Debug, Clone)]
pub struct FlowContext {
    pub flows_root: PathBuf,
    pub templates_root: PathBuf,
    pub data_root: PathBuf,
    pub secrets_path: PathBuf,
    pub timezone: chrono_tz::Tz,
    /// Default per-run timeout in seconds when neither the request nor the
    /// schedule sets one.
    pub default_timeout: u64,
    pub vault_token: Option<String>,
    pub vault_cache_ttl: Duration,
}

impl FlowContext {
    /// Context rooted at a data directory, with the standard layout
    /// (`flows/`, `templates/`, `secrets.yml`) and defaults.
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        let data_root = data_root.into();
        Self {
            flows_root: data_root.join("flows"),
            templates_root: data_root.join("templates"),
            secrets_path: data_root.join("secrets.yml"),
            data_root,
            timezone: chrono_tz::Europe::Brussels,
            default_timeout: 600,
            vault_token: None,
            vault_cache_ttl: Duration::from_secs(60),
        }
    }

    pub fn flows_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.flows_root = path.into();
        self
    }

    pub fn templates_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.templates_root = path.into();
        self
    }

    pub fn secrets_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.secrets_path = path.into();
        self
    }

    pub fn timezone(mut self, tz: chrono_tz::Tz) -> Self {
        self.timezone = tz;
        self
    }

    pub fn default_timeout(mut self, seconds: u64) -> Self {
        self.default_timeout = seconds;
        self
    }

    pub fn vault_token(mut self, token: impl Into<String>) -> Self {
        self.vault_token = Some(token.into());
        self
    }

    pub fn vault_cache_ttl(mut self, ttl: Duration) -> Self {
        self.vault_cache_ttl = ttl;
        self
    }
}
