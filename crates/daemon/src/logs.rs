// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log initialization and the tail endpoint's file reader.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("Lines must be positive")]
    InvalidLines,
    #[error("Log file {0} not found")]
    NotFound(String),
    #[error("{0}")]
    Io(String),
}

/// Install the stderr + rolling-file subscriber. Returns the appender guard
/// (dropping it stops the background writer) and the active log file path.
pub fn init(log_dir: &Path, file_name: &str, level: &str) -> (tracing_appender::non_blocking::WorkerGuard, PathBuf) {
    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    (guard, log_dir.join(file_name))
}

/// Read the last `lines` lines of the active log file.
pub fn tail(log_file: &Path, lines: usize) -> Result<Vec<String>, LogError> {
    if lines == 0 {
        return Err(LogError::InvalidLines);
    }
    let file = std::fs::File::open(log_file).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LogError::NotFound(log_file.display().to_string())
        } else {
            LogError::Io(e.to_string())
        }
    })?;
    let all: Vec<String> = BufReader::new(file)
        .lines()
        .collect::<Result<_, _>>()
        .map_err(|e| LogError::Io(e.to_string()))?;
    let skip = all.len().saturating_sub(lines);
    Ok(all.into_iter().skip(skip).collect())
}

#[cfg(test)]
#[path = "logs_tests.rs"]
mod tests;
