// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `file` step: read, write or append YAML/JSON files under the data root.

use super::{require_data, RunEnv, StepOutput};
use crate::error::StepError;
use serde::Deserialize;
use serde_json::json;
use spooler_core::Blackboard;
use spooler_flow::render_str;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum FileFormat {
    Yaml,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum FileMode {
    Read,
    Write,
    Append,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileConfig {
    /// Template-rendered path, relative to the data root.
    pub path: String,
    #[serde(rename = "type", default = "default_format")]
    pub format: FileFormat,
    #[serde(default = "default_mode")]
    pub mode: FileMode,
    /// Blackboard key holding the data to write/append.
    #[serde(default)]
    pub data_key: Option<String>,
}

fn default_format() -> FileFormat {
    FileFormat::Yaml
}

fn default_mode() -> FileMode {
    FileMode::Read
}

fn io_err(e: std::io::Error, path: &std::path::Path) -> StepError {
    StepError::Io(format!("{}: {e}", path.display()))
}

pub(crate) async fn execute(
    config: FileConfig,
    board: &Blackboard,
    env: &RunEnv<'_>,
) -> Result<StepOutput, StepError> {
    let rel = render_str(&config.path, &board.to_value())?;
    let path = env.ctx.data_root.join(&rel);
    info!("{} -> {:?} {}", env.repr, config.mode, path.display());

    match config.mode {
        FileMode::Read => {
            let src = tokio::fs::read_to_string(&path).await.map_err(|e| io_err(e, &path))?;
            let parsed = match config.format {
                FileFormat::Yaml => serde_yaml::from_str(&src)
                    .map_err(|e| StepError::Io(format!("{}: {e}", path.display())))?,
                FileFormat::Json => serde_json::from_str(&src)
                    .map_err(|e| StepError::Io(format!("{}: {e}", path.display())))?,
            };
            Ok(StepOutput::value(parsed))
        }
        FileMode::Write | FileMode::Append => {
            let key = config
                .data_key
                .as_deref()
                .ok_or_else(|| StepError::Parse("file write requires 'data_key'".into()))?;
            let data = require_data(board, key)?;
            let rendered = match config.format {
                FileFormat::Yaml => serde_yaml::to_string(&data)
                    .map_err(|e| StepError::Io(e.to_string()))?,
                FileFormat::Json => data.to_string(),
            };
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| io_err(e, &path))?;
            }
            if config.mode == FileMode::Write {
                tokio::fs::write(&path, rendered).await.map_err(|e| io_err(e, &path))?;
            } else {
                use tokio::io::AsyncWriteExt;
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .await
                    .map_err(|e| io_err(e, &path))?;
                file.write_all(rendered.as_bytes()).await.map_err(|e| io_err(e, &path))?;
            }
            Ok(StepOutput::value(json!({})))
        }
    }
}
