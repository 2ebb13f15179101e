// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Template rendering against the blackboard.
//!
//! Flow documents embed `{{ … }}` expressions in string fields (`uri`, file
//! paths, goto targets, `set_fact` values) and in `when` guards. Rendering
//! context is always the full blackboard object.

use minijinja::Environment;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
#[error("error processing template: {0}")]
pub struct TemplateError(String);

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(minijinja::UndefinedBehavior::Lenient);
    env
}

/// Render one template string against the blackboard context.
pub fn render_str(template: &str, ctx: &Value) -> Result<String, TemplateError> {
    environment()
        .render_str(template, ctx)
        .map_err(|e| TemplateError(e.to_string()))
}

/// Recursively render every string inside a value. Mappings and lists keep
/// their shape; non-string scalars pass through untouched.
pub fn render_value(value: &Value, ctx: &Value) -> Result<Value, TemplateError> {
    Ok(match value {
        Value::String(s) => Value::String(render_str(s, ctx)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| render_value(v, ctx))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), render_value(v, ctx)?)))
                .collect::<Result<_, TemplateError>>()?,
        ),
        other => other.clone(),
    })
}

/// Evaluate a step's `when` guards. Each entry is wrapped as `{{ expr }}`,
/// rendered, lowercased and compared against the truthy set
/// {`true`, `1`, `yes`}. All entries must hold.
pub fn eval_when(conditions: &[String], ctx: &Value) -> Result<bool, TemplateError> {
    for condition in conditions {
        let rendered = render_str(&format!("{{{{ {condition} }}}}"), ctx)?;
        if !matches!(rendered.trim().to_lowercase().as_str(), "true" | "1" | "yes") {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
