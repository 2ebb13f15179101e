// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::test_env;
use spooler_flow::load_secrets;

fn defs(src: &str) -> Vec<SecretDef> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secrets.yml");
    std::fs::write(&path, src).unwrap();
    load_secrets(&path).unwrap()
}

#[tokio::test]
async fn credential_secret_materializes() {
    let env = test_env();
    let secrets = defs("- name: git\n  type: credential\n  username: bot\n  password: pw\n");
    let value = resolve_secret(&env.ctx, &secrets, "git").await.unwrap();
    assert_eq!(value, json!({"username": "bot", "password": "pw"}));
}

#[tokio::test]
async fn token_secret_materializes() {
    let env = test_env();
    let secrets = defs("- name: jira\n  type: token\n  token: t-1\n");
    let value = resolve_secret(&env.ctx, &secrets, "jira").await.unwrap();
    assert_eq!(value, json!({"token": "t-1"}));
}

#[tokio::test]
async fn api_key_secret_materializes() {
    let env = test_env();
    let secrets = defs("- name: graf\n  type: api-key\n  key: X-Key\n  value: v\n");
    let value = resolve_secret(&env.ctx, &secrets, "graf").await.unwrap();
    assert_eq!(value, json!({"key": "X-Key", "value": "v"}));
}

#[tokio::test]
async fn unknown_name_is_not_found() {
    let env = test_env();
    let err = resolve_secret(&env.ctx, &[], "ghost").await.unwrap_err();
    assert!(matches!(err, StepError::Secret(SecretError::NotFound(_))));
}

#[tokio::test]
async fn incomplete_credential_is_a_bad_secret() {
    let env = test_env();
    let secrets = defs("- name: half\n  type: credential\n  username: bot\n");
    let err = resolve_secret(&env.ctx, &secrets, "half").await.unwrap_err();
    assert!(matches!(err, StepError::Secret(SecretError::BadSecret(_))));
}

#[tokio::test]
async fn vault_secret_fetches_and_caches() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/kv/data/netbox")
        .match_header("x-vault-token", "vault-t")
        .with_body(r#"{"data": {"data": {"token": "nb-1", "url": "https://nb"}}}"#)
        .expect(1)
        .create_async()
        .await;

    let env = test_env().with_ctx(|ctx| ctx.vault_token("vault-t"));
    let secrets = defs(&format!(
        "- name: netbox\n  type: hashicorp-vault\n  uri: {}/v1/kv/data/netbox\n",
        server.url()
    ));

    let first = resolve_secret(&env.ctx, &secrets, "netbox").await.unwrap();
    assert_eq!(first, json!({"token": "nb-1", "url": "https://nb"}));

    // second resolve is served from the process-wide cache
    let second = resolve_secret(&env.ctx, &secrets, "netbox").await.unwrap();
    assert_eq!(second, first);
    mock.assert_async().await;
}

#[tokio::test]
async fn vault_secret_applies_filter() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v1/kv/data/filtered")
        .with_body(r#"{"data": {"data": {"token": "only-this", "noise": 1}}}"#)
        .create_async()
        .await;

    let env = test_env().with_ctx(|ctx| ctx.vault_token("vault-t"));
    let secrets = defs(&format!(
        "- name: f\n  type: hashicorp-vault\n  uri: {}/v1/kv/data/filtered\n  jq_expression: \".token\"\n",
        server.url()
    ));

    let value = resolve_secret(&env.ctx, &secrets, "f").await.unwrap();
    assert_eq!(value, json!("only-this"));
}

#[tokio::test]
async fn vault_without_process_token_is_a_bad_secret() {
    let env = test_env();
    let secrets = defs("- name: v\n  type: hashicorp-vault\n  uri: https://vault.invalid/x\n");
    let err = resolve_secret(&env.ctx, &secrets, "v").await.unwrap_err();
    let StepError::Secret(SecretError::BadSecret(message)) = err else {
        panic!("expected bad secret");
    };
    assert!(message.contains("HASHICORP_VAULT_TOKEN"));
}

#[tokio::test]
async fn vault_error_response_is_a_bad_secret() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v1/kv/data/denied")
        .with_status(403)
        .with_body("permission denied")
        .create_async()
        .await;

    let env = test_env().with_ctx(|ctx| ctx.vault_token("vault-t"));
    let secrets = defs(&format!(
        "- name: denied\n  type: hashicorp-vault\n  uri: {}/v1/kv/data/denied\n",
        server.url()
    ));

    let err = resolve_secret(&env.ctx, &secrets, "denied").await.unwrap_err();
    let StepError::Secret(SecretError::BadSecret(message)) = err else {
        panic!("expected bad secret");
    };
    assert!(message.contains("permission denied"));
}
