// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const SECRETS: &str = r#"
- name: gitlab
  type: credential
  username: bot
  password: hunter2
- name: jira
  type: token
  token: abc123
- name: grafana
  type: api-key
  key: X-Api-Key
  value: k-42
- name: netbox
  type: hashicorp-vault
  uri: https://vault.example.org/v1/kv/data/netbox
  jq_expression: ".token"
"#;

#[test]
fn parses_all_kinds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secrets.yml");
    std::fs::write(&path, SECRETS).unwrap();

    let secrets = load_secrets(&path).unwrap();
    assert_eq!(secrets.len(), 4);
    assert_eq!(secrets[0].kind, SecretKind::Credential);
    assert_eq!(secrets[0].username.as_deref(), Some("bot"));
    assert_eq!(secrets[1].kind, SecretKind::Token);
    assert_eq!(secrets[2].kind, SecretKind::ApiKey);
    assert_eq!(secrets[2].key.as_deref(), Some("X-Api-Key"));
    assert_eq!(secrets[3].kind, SecretKind::HashicorpVault);
    assert_eq!(secrets[3].jq_expression.as_deref(), Some(".token"));
}

#[test]
fn missing_file_is_an_empty_table() {
    let dir = tempfile::tempdir().unwrap();
    let secrets = load_secrets(&dir.path().join("absent.yml")).unwrap();
    assert!(secrets.is_empty());
}

#[test]
fn unknown_kind_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secrets.yml");
    std::fs::write(&path, "- name: x\n  type: gpg\n").unwrap();
    assert!(matches!(load_secrets(&path), Err(SecretError::Load { .. })));
}

#[test]
fn kind_display_matches_wire_names() {
    assert_eq!(SecretKind::ApiKey.to_string(), "api-key");
    assert_eq!(SecretKind::HashicorpVault.to_string(), "hashicorp-vault");
}
