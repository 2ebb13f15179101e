// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `spoolerd`: the spooler workflow service.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let state = match spooler_daemon::startup().await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("spoolerd failed to start: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = state.serve().await {
        eprintln!("spoolerd terminated: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
