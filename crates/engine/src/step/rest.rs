// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rest` step: HTTP requests with optional secret-backed authentication.

use super::{require_data, RunEnv, StepOutput};
use crate::error::StepError;
use crate::secret::resolve_secret;
use base64::Engine as _;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use spooler_core::Blackboard;
use spooler_flow::render_str;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
pub(crate) struct RestAuth {
    #[serde(rename = "type")]
    pub kind: String,
    pub secret: String,
    /// Scheme word for token auth. Defaults to `Bearer`.
    #[serde(default)]
    pub bearer: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RestConfig {
    /// Template-rendered request URI.
    pub uri: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    /// URL-encoded and appended to the URI.
    #[serde(default)]
    pub query: IndexMap<String, String>,
    #[serde(default)]
    pub body: Option<Value>,
    /// Blackboard key supplying the request body (wins over `body`).
    #[serde(default)]
    pub data_key: Option<String>,
    #[serde(default)]
    pub authentication: Option<RestAuth>,
}

async fn auth_header(auth: &RestAuth, env: &RunEnv<'_>) -> Result<String, StepError> {
    let secret = resolve_secret(env.ctx, env.secrets, &auth.secret).await?;
    match auth.kind.as_str() {
        "token" => {
            let token = secret
                .get("token")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    StepError::Invalid(format!("token not found in secret {}", auth.secret))
                })?;
            let bearer = auth.bearer.as_deref().unwrap_or("Bearer");
            Ok(format!("{bearer} {token}"))
        }
        "basic" => {
            let username = secret.get("username").and_then(Value::as_str);
            let password = secret.get("password").and_then(Value::as_str);
            let (Some(username), Some(password)) = (username, password) else {
                return Err(StepError::Invalid(format!(
                    "username or password missing in secret {}",
                    auth.secret
                )));
            };
            let encoded =
                base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
            Ok(format!("Basic {encoded}"))
        }
        other => Err(StepError::Invalid(format!("unsupported authentication type: {other}"))),
    }
}

pub(crate) async fn execute(
    config: RestConfig,
    board: &Blackboard,
    env: &RunEnv<'_>,
) -> Result<StepOutput, StepError> {
    let uri = render_str(&config.uri, &board.to_value())?;

    let method: reqwest::Method = config
        .method
        .as_deref()
        .unwrap_or("GET")
        .to_uppercase()
        .parse()
        .map_err(|_| {
            StepError::Invalid(format!(
                "unsupported HTTP method: {}",
                config.method.as_deref().unwrap_or_default()
            ))
        })?;

    let body = match &config.data_key {
        Some(key) => Some(require_data(board, key)?),
        None => config.body.clone(),
    };

    info!("{} -> {} {}", env.repr, method, uri);

    // Flows regularly target appliances with self-signed certificates.
    let client = reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .build()
        .map_err(|e| StepError::Http(e.to_string()))?;

    let mut request = client.request(method, &uri);
    if !config.query.is_empty() {
        let pairs: Vec<(&str, &str)> =
            config.query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        request = request.query(&pairs);
    }
    for (name, value) in &config.headers {
        request = request.header(name, value);
    }
    if let Some(auth) = &config.authentication {
        request = request.header("Authorization", auth_header(auth, env).await?);
    }
    if let Some(body) = &body {
        request = request.json(body);
    }

    let response = request.send().await.map_err(|e| StepError::Http(e.to_string()))?;
    let status = response.status();
    let text = response.text().await.map_err(|e| StepError::Http(e.to_string()))?;

    if !status.is_success() {
        error!("{} REST request failed with status code {}: {:?}", env.repr, status, text);
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        return Err(StepError::Rest { status: status.as_u16(), body });
    }

    let parsed = serde_json::from_str(&text)
        .map_err(|e| StepError::Http(format!("response is not JSON: {e}")))?;
    Ok(StepOutput::value(parsed))
}

#[cfg(test)]
#[path = "rest_tests.rs"]
mod tests;
