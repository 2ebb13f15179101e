// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service configuration file (`config.yml`).

use serde::Deserialize;
use spooler_core::ScheduleSpec;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
#[error("failed to load config file {path}: {message}")]
pub struct ConfigError {
    pub path: String,
    pub message: String,
}

/// Service-level configuration. Currently just the schedules registered at
/// startup.
#[derive(Debug, Default, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub autostart_flows: Vec<ScheduleSpec>,
}

impl ServiceConfig {
    /// Load `config.yml`. A missing file means an empty configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let src = match std::fs::read_to_string(path) {
            Ok(src) => src,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }
        };
        serde_yaml::from_str(&src).map_err(|e| ConfigError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
