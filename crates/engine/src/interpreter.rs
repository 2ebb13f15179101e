// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The flow interpreter: walks a step list by index, threading the
//! blackboard through each step, with goto/sentinel redirection, ordered
//! error routing (`ignore_errors → on_error_goto → propagate`) and
//! cooperative cancellation between steps.

use crate::context::FlowContext;
use crate::error::StepError;
use crate::step::{self, Goto, RunEnv, StepOutput};
use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use spooler_core::{make_timestamp, Blackboard, ErrorRecord, FlowOutcome};
use spooler_flow::{load_secrets, FlowDef, SecretDef};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// One loaded, ready-to-run flow invocation.
///
/// Loading parses the document, builds the name→index map, reads the
/// secrets table, and seeds the blackboard's reserved keys. Running
/// consumes the flow and hands the blackboard back with the outcome.
pub struct Flow {
    def: FlowDef,
    index: IndexMap<String, usize>,
    secrets: Vec<SecretDef>,
    board: Blackboard,
    ctx: Arc<FlowContext>,
    repr: String,
}

impl Flow {
    pub fn load(
        ctx: Arc<FlowContext>,
        path: &str,
        payload: Value,
        loop_index: Option<usize>,
        job_id: Option<&str>,
    ) -> Result<Self, StepError> {
        let def = FlowDef::load(&ctx.flows_root, path)?;
        let index = def.name_index()?;
        let secrets = load_secrets(&ctx.secrets_path)?;
        let board = Blackboard::new(path, payload, loop_index, job_id, make_timestamp());
        let mut repr = format!("[{}]", def.name);
        if let Some(i) = loop_index {
            repr.push_str(&format!("[{i}]"));
        }
        Ok(Self { def, index, secrets, board, ctx, repr })
    }

    /// Run the flow to completion, a terminal directive, a propagated error,
    /// or cancellation. The cancellation token is only checked between
    /// steps; long-running steps observe it themselves.
    pub async fn process(mut self, cancel: CancellationToken) -> (Blackboard, FlowOutcome) {
        let steps = self.def.steps.clone();
        let mut i = 0;

        while i < steps.len() && !cancel.is_cancelled() {
            let def = &steps[i];
            let env = RunEnv {
                ctx: &self.ctx,
                secrets: &self.secrets,
                repr: &self.repr,
                cancel: &cancel,
            };

            let result = step::run(def, &mut self.board, &env).await;
            let output = match result {
                Ok(output) => output,
                Err(StepError::Exit(message)) => {
                    let message = format!("Flow exited with message: {message}");
                    return (self.board, FlowOutcome::Exit(message));
                }
                Err(err) => {
                    error!("{} Error in step {}: {err}", self.repr, def.name);
                    let one_line = err.one_line();
                    let mut record = ErrorRecord {
                        step: def.name.clone(),
                        error: err.to_value(),
                        ignored: None,
                    };
                    for pattern in &def.ignore_errors {
                        let matched = Regex::new(pattern)
                            .map(|re| re.is_match(&one_line))
                            .unwrap_or(false);
                        if matched {
                            warn!("{} Ignoring error in step {}: {err}", self.repr, def.name);
                            record.ignored =
                                Some(format!("Error ignored based on regex: {pattern}"));
                            break;
                        }
                    }
                    let ignored = record.ignored.is_some();
                    self.board.push_error(record);
                    if ignored {
                        // Treated as success; the interpreter just advances.
                        i += 1;
                        continue;
                    }
                    match &def.on_error_goto {
                        Some(target) => StepOutput::goto(Goto::from_target(target)),
                        None => return self.fail(err.to_string(), &cancel).await,
                    }
                }
            };

            match output.goto {
                Some(Goto::Exit) => {
                    return (self.board, FlowOutcome::Exit("Flow exited.".into()));
                }
                Some(Goto::End) => i = steps.len(),
                Some(Goto::Start) => i = 0,
                Some(Goto::Step(name)) => match self.index.get(&name) {
                    Some(&target) => i = target,
                    None => {
                        let message = format!("goto target step '{name}' not found");
                        error!("{} {message}", self.repr);
                        return self.fail(message, &cancel).await;
                    }
                },
                None => i += 1,
            }
        }

        if i < steps.len() {
            // Loop left early: the stop signal fired between steps.
            return (self.board, FlowOutcome::Failed("Flow stopped on request.".into()));
        }
        (self.board, FlowOutcome::Success("Flow completed successfully.".into()))
    }

    /// Propagated-error path. When the flow names a `finally_step`, run it
    /// with its `when` guard ignored; a completed recovery step swallows the
    /// failure.
    async fn fail(
        mut self,
        message: String,
        cancel: &CancellationToken,
    ) -> (Blackboard, FlowOutcome) {
        let failed_message = format!("Flow {} failed, {message}", self.def.name);
        let Some(finally_name) = self.def.finally_step.clone() else {
            return (self.board, FlowOutcome::Failed(failed_message));
        };
        let Some(&target) = self.index.get(&finally_name) else {
            return (self.board, FlowOutcome::Failed(failed_message));
        };

        info!("{} Calling finally step {}", self.repr, finally_name);
        let mut def = self.def.steps[target].clone();
        def.when = Vec::new();
        let env = RunEnv {
            ctx: &self.ctx,
            secrets: &self.secrets,
            repr: &self.repr,
            cancel,
        };
        let result = step::run(&def, &mut self.board, &env).await;
        match result {
            Ok(_) => (self.board, FlowOutcome::Success("Flow completed successfully.".into())),
            Err(err) => {
                error!("{} Error in finally step {finally_name}: {err}", self.repr);
                (self.board, FlowOutcome::Failed(failed_message))
            }
        }
    }
}

/// Run a child flow for a `flow` / `flow_loop` step. Boxed to break the
/// interpreter → step → interpreter recursion; children never inherit the
/// parent's job id.
pub(crate) fn run_child(
    ctx: Arc<FlowContext>,
    path: String,
    payload: Value,
    loop_index: Option<usize>,
    cancel: CancellationToken,
) -> Pin<Box<dyn Future<Output = Result<(Blackboard, FlowOutcome), StepError>> + Send>> {
    Box::pin(async move {
        let flow = Flow::load(ctx, &path, payload, loop_index, None)?;
        Ok(flow.process(cancel).await)
    })
}

#[cfg(test)]
#[path = "interpreter_tests.rs"]
mod tests;
