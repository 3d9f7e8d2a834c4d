//! Tests for the environment handed to the child.

use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;

use crate::support::*;

#[test]
fn test_login_mode_hides_login_inputs() {
    let t = Test::new();
    let output = t
        .cmd()
        .env("VAULT_TOKEN", "vault:login")
        .env("VAULT_ROLE", "foo")
        .env("VAULT_ADDR", "https://vault:8200")
        .env("APP_MODE", "prod")
        .arg("env")
        .output()
        .unwrap();

    assert_success(&output);
    let names = env_names(&output);
    assert!(!names.contains(&"VAULT_ROLE".to_string()));
    assert_eq!(env_value(&output, "VAULT_TOKEN").as_deref(), Some("vault:login"));
    assert_eq!(
        env_value(&output, "VAULT_ADDR").as_deref(),
        Some("https://vault:8200")
    );
    assert_eq!(env_value(&output, "APP_MODE").as_deref(), Some("prod"));
}

#[test]
fn test_passthrough_forwards_listed_names_only() {
    let t = Test::new();
    let output = t
        .cmd()
        .env("VAULT_ADDR", "https://vault:8200")
        .env("VAULT_NAMESPACE", "team")
        .env("VAULT_ENV_PASSTHROUGH", "VAULT_ADDR")
        .arg("env")
        .output()
        .unwrap();

    assert_success(&output);
    let names = env_names(&output);
    assert_eq!(
        env_value(&output, "VAULT_ADDR").as_deref(),
        Some("https://vault:8200")
    );
    assert!(!names.contains(&"VAULT_NAMESPACE".to_string()));
    assert!(!names.contains(&"VAULT_ENV_PASSTHROUGH".to_string()));
}

#[test]
fn test_internal_variables_never_reach_child() {
    let t = Test::with_store(TOKEN_STORE);
    let output = t
        .cmd()
        .env("VAULT_TOKEN", "s.test-token")
        .env("VAULT_REVOKE_TOKEN", "false")
        .env("VAULT_IGNORE_MISSING_SECRETS", "false")
        .arg("env")
        .output()
        .unwrap();

    assert_success(&output);
    let names = env_names(&output);
    for hidden in [
        "VAULT_TOKEN",
        "VAULT_REVOKE_TOKEN",
        "VAULT_IGNORE_MISSING_SECRETS",
        "VAULT_ENV_SECRETS_FILE",
        "VAULT_LOG_LEVEL",
    ] {
        assert!(!names.contains(&hidden.to_string()), "{hidden} leaked");
    }
}

#[test]
fn test_unmanaged_variables_pass_through() {
    let t = Test::new();
    let output = t
        .cmd()
        .env("VAULT_CUSTOM_SETTING", "kept")
        .env("DATABASE_HOST", "db.local")
        .arg("env")
        .output()
        .unwrap();

    assert_success(&output);
    assert_eq!(env_value(&output, "VAULT_CUSTOM_SETTING").as_deref(), Some("kept"));
    assert_eq!(env_value(&output, "DATABASE_HOST").as_deref(), Some("db.local"));
}

#[test]
fn test_argv_passed_verbatim() {
    let t = Test::new();
    let output = t
        .cmd()
        .args(["sh", "-c", "printf '%s|' \"$@\"", "argv0", "--flag", "two words"])
        .output()
        .unwrap();

    assert_success(&output);
    assert_eq!(stdout(&output), "--flag|two words|");
}

fn has_line(stdout: &[u8], line: &[u8]) -> bool {
    stdout.split(|b| *b == b'\n').any(|l| l == line)
}

#[test]
fn test_non_utf8_values_reach_child() {
    let t = Test::new();
    let latin1 = OsStr::from_bytes(b"caf\xe9");

    for daemon in ["false", "true"] {
        let output = t
            .cmd()
            .env("VAULT_ENV_DAEMON", daemon)
            .env("GREETING", latin1)
            .env("APP_MODE", "prod")
            .arg("env")
            .output()
            .unwrap();

        assert_success(&output);
        assert!(has_line(&output.stdout, b"GREETING=caf\xe9"), "daemon={daemon}");
        assert!(has_line(&output.stdout, b"APP_MODE=prod"), "daemon={daemon}");
    }

    // Replace mode still classifies the name.
    let output = t
        .cmd()
        .env("VAULT_ROLE", latin1)
        .arg("env")
        .output()
        .unwrap();

    assert_success(&output);
    assert!(!output.stdout.windows(11).any(|w| w == b"VAULT_ROLE="));
}
