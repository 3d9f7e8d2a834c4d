//! Tests for secret resolution.

use crate::support::*;

#[test]
fn test_reference_resolved() {
    let t = Test::with_store(STANDARD_STORE);
    let output = t
        .sh("echo \"$API_KEY\"")
        .env("API_KEY", "vault:secret/app#API_KEY")
        .output()
        .unwrap();

    assert_success(&output);
    assert_eq!(stdout(&output).trim(), "sk-test-12345");
}

#[test]
fn test_bulk_path_injection() {
    let t = Test::with_store(STANDARD_STORE);
    let output = t
        .cmd()
        .env("VAULT_ENV_FROM_PATH", "secret/app")
        .arg("env")
        .output()
        .unwrap();

    assert_success(&output);
    assert_eq!(env_value(&output, "API_KEY").as_deref(), Some("sk-test-12345"));
    assert_eq!(env_value(&output, "REGION").as_deref(), Some("eu-west-1"));
    assert!(!env_names(&output).contains(&"VAULT_ENV_FROM_PATH".to_string()));
}

#[test]
fn test_missing_secret_is_fatal() {
    let t = Test::with_store(STANDARD_STORE);
    let output = t
        .sh("echo should-not-run")
        .env("DB_PASSWORD", "vault:secret/nope#password")
        .output()
        .unwrap();

    assert_exit_code(&output, 1);
    assert!(!stdout(&output).contains("should-not-run"));
    assert_stderr_contains(&output, "secret/nope");
}

#[test]
fn test_missing_secret_ignored_when_requested() {
    let t = Test::with_store(STANDARD_STORE);
    let output = t
        .sh("echo \"db=${DB_PASSWORD:-unset}\"")
        .env("DB_PASSWORD", "vault:secret/nope#password")
        .env("VAULT_IGNORE_MISSING_SECRETS", "true")
        .output()
        .unwrap();

    assert_success(&output);
    assert_eq!(stdout(&output).trim(), "db=unset");
}

#[test]
fn test_token_file_authenticates() {
    let t = Test::with_store(TOKEN_STORE);
    let token_file = t.path("token");
    std::fs::write(&token_file, "s.test-token\n").unwrap();

    let output = t
        .sh("echo \"$API_KEY\"")
        .env("VAULT_TOKEN_FILE", &token_file)
        .env("API_KEY", "vault:secret/app#API_KEY")
        .output()
        .unwrap();

    assert_success(&output);
    assert_eq!(stdout(&output).trim(), "sk-test-12345");
}

#[test]
fn test_wrong_token_rejected() {
    let t = Test::with_store(TOKEN_STORE);
    let output = t
        .sh("true")
        .env("VAULT_TOKEN", "s.wrong")
        .output()
        .unwrap();

    assert_exit_code(&output, 1);
    assert_stderr_contains(&output, "failed to create vault client");
}

#[test]
fn test_revoke_token_does_not_block_launch() {
    let t = Test::with_store(STANDARD_STORE);
    let output = t
        .sh("echo launched")
        .env("VAULT_REVOKE_TOKEN", "true")
        .output()
        .unwrap();

    assert_success(&output);
    assert_eq!(stdout(&output).trim(), "launched");
}
