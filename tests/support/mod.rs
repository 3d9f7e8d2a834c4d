//! Test support utilities for vault-env integration tests.
//!
//! Provides an isolated secret store and a command builder with a scrubbed
//! environment.

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

/// Test environment with its own secret store file.
///
/// Every command starts from an empty environment, so tests can run in
/// parallel without seeing each other's variables.
pub struct Test {
    pub dir: TempDir,
    pub store: PathBuf,
}

impl Test {
    /// Create a test environment with an empty secret store.
    pub fn new() -> Self {
        Self::with_store(EMPTY_STORE)
    }

    /// Create a test environment with the given store document.
    pub fn with_store(json: &str) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = dir.path().join("store.json");
        std::fs::write(&store, json).expect("failed to write store");

        Self { dir, store }
    }

    /// A vault-env command with only `PATH`, the store location and a quiet
    /// log level set.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("vault-env").expect("failed to find vault-env binary");
        cmd.env_clear();
        cmd.env("PATH", std::env::var("PATH").unwrap_or_else(|_| "/usr/bin:/bin".into()));
        cmd.env("VAULT_ENV_SECRETS_FILE", &self.store);
        cmd.env("VAULT_LOG_LEVEL", "warn");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Run `sh -c script` under vault-env.
    pub fn sh(&self, script: &str) -> Command {
        let mut cmd = self.cmd();
        cmd.args(["sh", "-c", script]);
        cmd
    }

    /// Same as [`Test::sh`] in daemon mode.
    pub fn daemon_sh(&self, script: &str) -> Command {
        let mut cmd = self.sh(script);
        cmd.env("VAULT_ENV_DAEMON", "true");
        cmd
    }

    /// A path inside the test directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
