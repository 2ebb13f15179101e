// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flow documents: an ordered list of named, typed steps loaded from YAML.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("flow file not found: {0}")]
    NotFound(String),
    #[error("failed to parse flow file {path}: {message}")]
    Parse { path: String, message: String },
    #[error("flow '{flow}' has duplicate step name '{step}'")]
    DuplicateStep { flow: String, step: String },
}

/// One step of a flow.
///
/// The kind-specific configuration lives in a nested mapping keyed by the
/// step's `type` (`rest: {…}`, `file: {…}`, …) and is captured in `config`
/// together with any other unrecognized keys.
#[derive(Debug, Clone, Deserialize)]
pub struct StepDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Boolean template expressions; all must hold or the step is skipped.
    #[serde(default)]
    pub when: Vec<String>,
    /// Blackboard key for the step's output. Defaults to the step name.
    #[serde(default)]
    pub result_key: Option<String>,
    /// Post-filter applied to the output before it is stored.
    #[serde(default)]
    pub jq_expression: Option<String>,
    /// Regex patterns; a matching error is demoted to a warning.
    #[serde(default)]
    pub ignore_errors: Vec<String>,
    /// Step to jump to when an unignored error occurs.
    #[serde(default)]
    pub on_error_goto: Option<String>,
    #[serde(flatten)]
    pub config: Map<String, Value>,
}

impl StepDef {
    pub fn result_key(&self) -> &str {
        self.result_key.as_deref().unwrap_or(&self.name)
    }

    /// The nested configuration mapping for this step's kind, if present.
    pub fn kind_config(&self) -> Option<&Value> {
        self.config.get(&self.kind)
    }
}

/// An immutable flow document.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowDef {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<StepDef>,
    /// Recovery step run (with `when` ignored) when a step error propagates.
    #[serde(default)]
    pub finally_step: Option<String>,
    /// The document's own relative path, stamped by the loader.
    #[serde(skip)]
    pub path: String,
}

impl FlowDef {
    /// Parse a flow document from YAML source. `path` is kept for reference
    /// and error messages.
    pub fn from_str(src: &str, path: &str) -> Result<Self, FlowError> {
        let mut def: FlowDef = serde_yaml::from_str(src).map_err(|e| FlowError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        def.path = path.to_string();
        def.name_index()?;
        Ok(def)
    }

    /// Load a flow by path relative to the flows directory.
    pub fn load(flows_root: &Path, rel_path: &str) -> Result<Self, FlowError> {
        let full = flows_root.join(rel_path);
        let src = match std::fs::read_to_string(&full) {
            Ok(src) => src,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FlowError::NotFound(rel_path.to_string()))
            }
            Err(e) => {
                return Err(FlowError::Parse {
                    path: rel_path.to_string(),
                    message: e.to_string(),
                })
            }
        };
        Self::from_str(&src, rel_path)
    }

    /// Validate that a flow file exists and parses, without keeping it.
    pub fn validate_path(flows_root: &Path, rel_path: &str) -> Result<(), FlowError> {
        Self::load(flows_root, rel_path).map(|_| ())
    }

    /// The name→index lookup for goto resolution. Step names must be unique
    /// within the flow.
    pub fn name_index(&self) -> Result<IndexMap<String, usize>, FlowError> {
        let mut index = IndexMap::with_capacity(self.steps.len());
        for (i, step) in self.steps.iter().enumerate() {
            if index.insert(step.name.clone(), i).is_some() {
                return Err(FlowError::DuplicateStep {
                    flow: self.name.clone(),
                    step: step.name.clone(),
                });
            }
        }
        Ok(index)
    }
}

#[cfg(test)]
#[path = "def_tests.rs"]
mod tests;
