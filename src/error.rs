//! Error types.
//!
//! Every fatal failure funnels into [`Error`], which `main` turns into exit
//! status 1. Non-fatal failures (signal forwarding, token revocation, lease
//! watch setup) are logged where they happen and never reach this type.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Inject(#[from] InjectError),

    #[error(transparent)]
    Lease(#[from] LeaseError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Startup configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no command is given, vault-env can't determine the entrypoint (command), please specify it explicitly")]
    NoCommand,

    #[error("binary not found: {binary}")]
    BinaryNotFound {
        binary: String,
        #[source]
        source: which::Error,
    },

    #[error("could not read vault token file: {}", path.display())]
    TokenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Secret store and injection errors.
#[derive(Error, Debug)]
pub enum InjectError {
    #[error("failed to create vault client: {0}")]
    Client(String),

    #[error("failed to read secret store {}: {source}", path.display())]
    ReadStore {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse secret store: {0}")]
    ParseStore(#[from] serde_json::Error),

    #[error("invalid secret reference for {name}: {reference}")]
    InvalidReference { name: String, reference: String },

    #[error("secret not found: {path}")]
    SecretNotFound { path: String },

    #[error("key '{key}' not found under path: {path}")]
    KeyNotFound { path: String, key: String },

    #[error("failed to revoke token: {0}")]
    Revoke(String),
}

/// Lease watching errors.
#[derive(Error, Debug)]
pub enum LeaseError {
    #[error("failed to create secret watcher for {path}: {reason}")]
    WatcherSetup { path: String, reason: String },
}

/// Child process errors.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("failed to start process {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to exec process {binary}: {source}")]
    Exec {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start supervisor runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
