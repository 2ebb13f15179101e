// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secret resolution: materialize a named secret definition via its backend.

use crate::context::FlowContext;
use crate::error::StepError;
use parking_lot::Mutex;
use serde_json::{json, Value};
use spooler_flow::{apply_filter, SecretDef, SecretError, SecretKind};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::Instant;
use tracing::debug;

/// Process-wide vault response cache, keyed by `(uri, jq_expression)`.
static VAULT_CACHE: LazyLock<Mutex<HashMap<(String, String), (Instant, Value)>>> =
    LazyLock::new(Mutex::default);

/// Look up a secret by name in the flow's secret table and materialize it.
pub(crate) async fn resolve_secret(
    ctx: &Arc<FlowContext>,
    secrets: &[SecretDef],
    name: &str,
) -> Result<Value, StepError> {
    let def = secrets
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| SecretError::NotFound(name.to_string()))?;

    match def.kind {
        SecretKind::Credential => {
            let (Some(username), Some(password)) = (&def.username, &def.password) else {
                return Err(SecretError::BadSecret(format!(
                    "credential secret '{}' missing username or password",
                    def.name
                ))
                .into());
            };
            Ok(json!({"username": username, "password": password}))
        }
        SecretKind::Token => {
            let Some(token) = &def.token else {
                return Err(
                    SecretError::BadSecret(format!("token secret '{}' missing token", def.name))
                        .into(),
                );
            };
            Ok(json!({"token": token}))
        }
        SecretKind::ApiKey => {
            let (Some(key), Some(value)) = (&def.key, &def.value) else {
                return Err(SecretError::BadSecret(format!(
                    "API key secret '{}' missing 'key' or 'value'",
                    def.name
                ))
                .into());
            };
            Ok(json!({"key": key, "value": value}))
        }
        SecretKind::HashicorpVault => vault_secret(ctx, def).await,
    }
}

async fn vault_secret(ctx: &Arc<FlowContext>, def: &SecretDef) -> Result<Value, StepError> {
    let Some(uri) = &def.uri else {
        return Err(SecretError::BadSecret(format!(
            "Hashicorp Vault secret '{}' missing uri",
            def.name
        ))
        .into());
    };
    let filter = def.jq_expression.clone().unwrap_or_default();
    let cache_key = (uri.clone(), filter);

    if let Some((fetched_at, value)) = VAULT_CACHE.lock().get(&cache_key) {
        if fetched_at.elapsed() < ctx.vault_cache_ttl {
            debug!("vault cache hit for {uri}");
            return Ok(value.clone());
        }
    }

    let Some(token) = &ctx.vault_token else {
        return Err(SecretError::BadSecret(format!(
            "Hashicorp Vault secret '{}' missing token, please set HASHICORP_VAULT_TOKEN in the environment",
            def.name
        ))
        .into());
    };

    let client = reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .build()
        .map_err(|e| StepError::Http(e.to_string()))?;
    let response = client
        .get(uri)
        .header("X-Vault-Token", token)
        .send()
        .await
        .map_err(|e| {
            SecretError::BadSecret(format!(
                "Failed to fetch secret '{}' from Hashicorp Vault: {e}",
                def.name
            ))
        })?;
    if !response.status().is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SecretError::BadSecret(format!(
            "Failed to fetch secret '{}' from Hashicorp Vault: {body}",
            def.name
        ))
        .into());
    }
    let payload: Value = response
        .json()
        .await
        .map_err(|e| StepError::Http(e.to_string()))?;

    // Vault KV v2 wraps the entry as data.data.
    let data = payload
        .get("data")
        .and_then(|d| d.get("data"))
        .cloned()
        .ok_or_else(|| {
            SecretError::BadSecret(format!("Hashicorp Vault secret '{}' has no data", def.name))
        })?;
    let data = match &def.jq_expression {
        Some(expression) => apply_filter(expression, &data)?,
        None => data,
    };

    VAULT_CACHE
        .lock()
        .insert(cache_key, (Instant::now(), data.clone()));
    Ok(data)
}

#[cfg(test)]
#[path = "secret_tests.rs"]
mod tests;
