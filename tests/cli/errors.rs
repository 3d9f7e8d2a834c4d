//! Tests for startup failures.

use predicates::prelude::*;

use crate::support::*;

#[test]
fn test_no_command() {
    let t = Test::new();
    t.cmd()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no command is given"));
}

#[test]
fn test_unknown_binary() {
    let t = Test::new();
    t.cmd()
        .arg("no-such-binary-for-vault-env")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("binary not found"));
}

#[test]
fn test_missing_store() {
    let t = Test::new();
    t.sh("true")
        .env("VAULT_ENV_SECRETS_FILE", t.path("absent.json"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read secret store"));
}

#[test]
fn test_malformed_store() {
    let t = Test::with_store("{ not json");
    t.sh("true")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to parse secret store"));
}

#[test]
fn test_unreadable_token_file() {
    let t = Test::new();
    t.sh("true")
        .env("VAULT_TOKEN_FILE", t.path("missing-token"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("could not read vault token file"));
}

#[test]
fn test_invalid_reference() {
    let t = Test::with_store(STANDARD_STORE);
    t.sh("true")
        .env("DB_PASSWORD", "vault:secret/db")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid secret reference for DB_PASSWORD"));
}
