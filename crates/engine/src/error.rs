// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step execution errors and their structured representation.

use serde_json::{json, Value};
use spooler_flow::{FilterError, FlowError, SecretError, TemplateError};

/// Everything that can go wrong while constructing or running one step.
///
/// `Exit` is not an error in the usual sense: the interpreter routes it to
/// the `exit` outcome before any error handling applies.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// Step definition is malformed (unknown type, missing required field).
    #[error("{0}")]
    Parse(String),
    /// Explicit termination via the `exit` step.
    #[error("Flow exited with message: {0}")]
    Exit(String),
    /// Non-2xx REST response.
    #[error("REST request failed with status code {status}")]
    Rest { status: u16, body: Value },
    /// Runtime validation failure (missing data key, wrong shape, …).
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Secret(#[from] SecretError),
    /// Child flow could not be loaded.
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error("{0}")]
    Io(String),
    #[error("{0}")]
    Http(String),
}

impl StepError {
    /// Structured representation stored in `__errors__`. REST failures keep
    /// their status code and response body; everything else is its message.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Rest { status, body } => json!({
                "message": "REST request failed",
                "status_code": status,
                "response_content": body,
            }),
            other => json!(other.to_string()),
        }
    }

    /// One-line serialization matched against `ignore_errors` patterns.
    pub fn one_line(&self) -> String {
        self.to_value().to_string().replace(['\n', '\r'], " ")
    }
}
