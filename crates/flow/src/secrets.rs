// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secret definitions loaded from the secrets YAML.
//!
//! Definitions are validated lazily: a malformed entry only fails the step
//! that asks for it, as [`SecretError::BadSecret`].

use serde::Deserialize;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("secret '{0}' not found")]
    NotFound(String),
    #[error("bad secret: {0}")]
    BadSecret(String),
    #[error("failed to load secrets file {path}: {message}")]
    Load { path: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecretKind {
    Credential,
    Token,
    ApiKey,
    HashicorpVault,
}

spooler_core::simple_display! {
    SecretKind {
        Credential => "credential",
        Token => "token",
        ApiKey => "api-key",
        HashicorpVault => "hashicorp-vault",
    }
}

/// One entry of the secrets file. Which fields are required depends on the
/// kind; the resolver enforces that when the secret is materialized.
#[derive(Debug, Clone, Deserialize)]
pub struct SecretDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SecretKind,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub jq_expression: Option<String>,
}

/// Load the secrets table. A missing file yields an empty table so flows
/// without secrets do not require one.
pub fn load_secrets(path: &Path) -> Result<Vec<SecretDef>, SecretError> {
    let src = match std::fs::read_to_string(path) {
        Ok(src) => src,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(SecretError::Load {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        }
    };
    serde_yaml::from_str(&src).map_err(|e| SecretError::Load {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
#[path = "secrets_tests.rs"]
mod tests;
