// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! spooler-storage: persistent job store backed by a single-file SQLite
//! database.

pub mod job_store;

pub use job_store::{JobFilter, JobStore, JobUpdate, StoreError};
