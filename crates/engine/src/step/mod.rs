// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step kinds and the machinery shared by all of them: `when` guards,
//! result storage with the optional post-filter, and control directives.

pub mod debug;
pub mod exit;
pub mod file;
pub mod flow;
pub mod flow_loop;
pub mod jinja;
pub mod jira;
pub mod jq;
pub mod rest;
pub mod set_fact;
pub mod sleep;
pub mod switch;

mod goto;

use crate::context::FlowContext;
use crate::error::StepError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use spooler_core::Blackboard;
use spooler_flow::{apply_filter, eval_when, SecretDef, StepDef};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Reserved goto target: jump past the last step (clean end).
pub const GOTO_END: &str = "__end__";
/// Reserved goto target: re-enter the flow at index 0.
pub const GOTO_START: &str = "__start__";
/// Reserved goto target: terminate the run with status `exit`.
pub const GOTO_EXIT: &str = "__exit";

/// A control directive redirecting the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Goto {
    Step(String),
    Start,
    End,
    Exit,
}

impl Goto {
    pub fn from_target(target: &str) -> Self {
        match target {
            GOTO_END => Self::End,
            GOTO_START => Self::Start,
            GOTO_EXIT => Self::Exit,
            name => Self::Step(name.to_string()),
        }
    }
}

/// What one step produced: an output value (already stored on the
/// blackboard under the step's result key), an optional control directive,
/// or neither when the step was skipped by its `when` guard.
#[derive(Debug, Default)]
pub struct StepOutput {
    pub value: Option<Value>,
    pub goto: Option<Goto>,
}

impl StepOutput {
    pub fn value(value: Value) -> Self {
        Self { value: Some(value), goto: None }
    }

    pub fn goto(goto: Goto) -> Self {
        Self { value: None, goto: Some(goto) }
    }

    pub fn skipped() -> Self {
        Self::default()
    }
}

/// Everything a step needs besides the blackboard.
pub(crate) struct RunEnv<'a> {
    pub ctx: &'a Arc<FlowContext>,
    pub secrets: &'a [SecretDef],
    pub repr: &'a str,
    pub cancel: &'a CancellationToken,
}

/// The closed set of step kinds, constructed (and validated) from a step
/// definition's type tag and nested config.
enum StepKind {
    File(file::FileConfig),
    Rest(rest::RestConfig),
    Jq(jq::JqConfig),
    Jinja(jinja::JinjaConfig),
    Flow(flow::FlowConfig),
    FlowLoop(flow_loop::FlowLoopConfig),
    JiraNamesMerge(jira::JiraConfig),
    Debug(debug::DebugConfig),
    Sleep(sleep::SleepConfig),
    Exit(exit::ExitConfig),
    Goto(goto::GotoConfig),
    Switch(switch::SwitchConfig),
    SetFact(set_fact::SetFactConfig),
}

impl StepKind {
    fn build(def: &StepDef) -> Result<Self, StepError> {
        match def.kind.as_str() {
            "file" => Ok(Self::File(parse_config(def)?)),
            "rest" => Ok(Self::Rest(parse_config(def)?)),
            "jq" => Ok(Self::Jq(parse_config(def)?)),
            "jinja" => Ok(Self::Jinja(parse_config(def)?)),
            "flow" => Ok(Self::Flow(parse_config(def)?)),
            "flow_loop" => Ok(Self::FlowLoop(parse_config(def)?)),
            "jira_names_merge" => Ok(Self::JiraNamesMerge(parse_config(def)?)),
            "debug" => Ok(Self::Debug(parse_config(def)?)),
            "sleep" => Ok(Self::Sleep(parse_config(def)?)),
            "exit" => Ok(Self::Exit(parse_config(def)?)),
            "goto" => Ok(Self::Goto(parse_config(def)?)),
            "switch" => Ok(Self::Switch(parse_config(def)?)),
            "set_fact" => Ok(Self::SetFact(parse_config(def)?)),
            other => Err(StepError::Parse(format!("unsupported step type: {other}"))),
        }
    }
}

fn parse_config<T: DeserializeOwned>(def: &StepDef) -> Result<T, StepError> {
    let raw = def
        .kind_config()
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()));
    serde_json::from_value(raw).map_err(|e| {
        StepError::Parse(format!("invalid {} step '{}': {e}", def.kind, def.name))
    })
}

/// Select step input by `data_key`; a missing key is an error. The key
/// `"."` selects the whole blackboard.
pub(crate) fn require_data(board: &Blackboard, key: &str) -> Result<Value, StepError> {
    board
        .data_by_key(key)
        .ok_or_else(|| StepError::Invalid(format!("data key '{key}' not found")))
}

/// Construct and run one step against the blackboard.
///
/// Boxed because `switch` recurses into this for its selected case. The
/// guard/dispatch/store order matches the step base contract: evaluate
/// `when`, run the kind, post-filter with `jq_expression`, store under
/// `result_key`.
pub(crate) fn run<'a>(
    def: &'a StepDef,
    board: &'a mut Blackboard,
    env: &'a RunEnv<'a>,
) -> Pin<Box<dyn Future<Output = Result<StepOutput, StepError>> + Send + 'a>> {
    Box::pin(async move {
        let kind = StepKind::build(def)?;

        if !eval_when(&def.when, &board.to_value())? {
            tracing::debug!("{}[{}] skipped by when guard", env.repr, def.name);
            return Ok(StepOutput::skipped());
        }

        let mut output = match kind {
            StepKind::File(config) => file::execute(config, board, env).await?,
            StepKind::Rest(config) => rest::execute(config, board, env).await?,
            StepKind::Jq(config) => jq::execute(config, board, env)?,
            StepKind::Jinja(config) => jinja::execute(config, board, env)?,
            StepKind::Flow(config) => flow::execute(config, board, env).await?,
            StepKind::FlowLoop(config) => flow_loop::execute(config, board, env).await?,
            StepKind::JiraNamesMerge(config) => jira::execute(config, board, env)?,
            StepKind::Debug(config) => debug::execute(config, board, env)?,
            StepKind::Sleep(config) => sleep::execute(config, env).await?,
            StepKind::Exit(config) => exit::execute(config, env)?,
            StepKind::Goto(config) => goto::execute(config, board, env)?,
            StepKind::Switch(config) => switch::execute(config, board, env).await?,
            StepKind::SetFact(config) => set_fact::execute(config, board, env)?,
        };

        if let Some(value) = output.value.take() {
            let value = match &def.jq_expression {
                Some(expression) => apply_filter(expression, &value)?,
                None => value,
            };
            board.set(def.result_key(), value.clone());
            output.value = Some(value);
        }
        Ok(output)
    })
}
