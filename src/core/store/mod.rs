//! Local secret store.
//!
//! A JSON document standing in for a remote secret service:
//!
//! ```json
//! {
//!   "token": "s.optional",
//!   "roles": ["optional"],
//!   "auth_path": "optional",
//!   "auth_method": "optional",
//!   "secrets": {
//!     "secret/data/db": {
//!       "data": { "password": "hunter2" },
//!       "lease_duration": 3600,
//!       "renewable": true,
//!       "max_ttl": 86400
//!     }
//!   }
//! }
//! ```
//!
//! Environment values of the form `vault:<path>#<key>` resolve against the
//! `secrets` map.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::core::config::Credentials;
use crate::core::constants;
use crate::core::inject::{InjectFn, InjectorConfig, SecretInjector, SecretRenewer};
use crate::core::secret::Secret;
use crate::error::{InjectError, Result};

#[derive(Deserialize)]
struct StoreFile {
    #[serde(default)]
    token: Option<Zeroizing<String>>,
    #[serde(default)]
    roles: Vec<String>,
    /// Login mount the store expects `VAULT_PATH` to name.
    #[serde(default)]
    auth_path: Option<String>,
    #[serde(default)]
    auth_method: Option<String>,
    #[serde(default)]
    secrets: BTreeMap<String, Secret>,
}

/// Secret store backed by a local JSON file.
pub struct LocalStore {
    secrets: BTreeMap<String, Secret>,
    config: InjectorConfig,
    renewer: Option<Box<dyn SecretRenewer>>,
}

impl LocalStore {
    /// Open the store at `path` and authenticate with `credentials`.
    ///
    /// # Errors
    ///
    /// Returns `InjectError::ReadStore` if the file cannot be read,
    /// `InjectError::ParseStore` if it is malformed, or
    /// `InjectError::Client` if the credentials are rejected.
    pub fn connect(path: &Path, credentials: &Credentials) -> Result<Self> {
        debug!(path = %path.display(), "opening secret store");

        let contents = std::fs::read_to_string(path).map_err(|source| InjectError::ReadStore {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&contents, credentials)
    }

    /// Build a store from a JSON document.
    pub fn from_json(json: &str, credentials: &Credentials) -> Result<Self> {
        let file: StoreFile = serde_json::from_str(json).map_err(InjectError::ParseStore)?;
        authenticate(&file, credentials)?;

        debug!(secrets = file.secrets.len(), "secret store loaded");

        Ok(Self {
            secrets: file.secrets,
            config: InjectorConfig::default(),
            renewer: None,
        })
    }

    pub fn with_config(mut self, config: InjectorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_renewer(mut self, renewer: Box<dyn SecretRenewer>) -> Self {
        self.renewer = Some(renewer);
        self
    }

    fn lookup(&self, path: &str) -> Result<Option<&Secret>> {
        match self.secrets.get(path) {
            Some(secret) => Ok(Some(secret)),
            None if self.config.ignore_missing_secrets => {
                warn!(path, "path not found in secret store");
                Ok(None)
            }
            None => Err(InjectError::SecretNotFound {
                path: path.to_string(),
            }
            .into()),
        }
    }

    fn watch_lease(&self, path: &str, secret: &Secret) {
        if !self.config.daemon_mode || !secret.is_leased() {
            return;
        }
        let Some(renewer) = &self.renewer else {
            return;
        };

        if let Err(e) = renewer.renew(path, secret) {
            warn!(path, error = %e, "secret lease will not be watched");
        }
    }
}

fn authenticate(file: &StoreFile, credentials: &Credentials) -> Result<()> {
    match credentials {
        Credentials::Token(token) => {
            if let Some(expected) = &file.token {
                if expected.as_str() != token.as_str() {
                    return Err(InjectError::Client("permission denied".to_string()).into());
                }
            }
        }
        Credentials::Login { role, path, method } => {
            check_login_field("path", file.auth_path.as_deref(), path.as_deref())?;
            check_login_field("method", file.auth_method.as_deref(), method.as_deref())?;

            if file.roles.is_empty() {
                return Ok(());
            }
            let allowed = role
                .as_deref()
                .is_some_and(|role| file.roles.iter().any(|r| r == role));
            if !allowed {
                return Err(InjectError::Client(format!(
                    "role {} is not allowed",
                    role.as_deref().unwrap_or("<unset>")
                ))
                .into());
            }
        }
    }
    Ok(())
}

/// A login setting must match the store's when the store declares one.
fn check_login_field(field: &str, expected: Option<&str>, given: Option<&str>) -> Result<()> {
    match expected {
        Some(expected) if given != Some(expected) => Err(InjectError::Client(format!(
            "auth {field} {} does not match the store",
            given.unwrap_or("<unset>")
        ))
        .into()),
        _ => Ok(()),
    }
}

/// An environment value, classified.
enum Reference<'a> {
    /// Not a reference; injected verbatim. Includes the login placeholder.
    Plain,
    Secret { path: &'a str, key: &'a str },
    Invalid,
}

impl<'a> Reference<'a> {
    fn parse(value: &'a str) -> Self {
        if value == constants::VAULT_LOGIN {
            return Self::Plain;
        }
        let Some(reference) = value.strip_prefix(constants::SECRET_PREFIX) else {
            return Self::Plain;
        };

        match reference.split_once('#') {
            Some((path, key)) if !path.is_empty() && !key.is_empty() => Self::Secret { path, key },
            _ => Self::Invalid,
        }
    }
}

impl SecretInjector for LocalStore {
    fn inject_secrets(
        &self,
        env: &BTreeMap<String, String>,
        inject: &mut InjectFn<'_>,
    ) -> Result<()> {
        let mut watched = HashSet::new();

        for (name, value) in env {
            let (path, key) = match Reference::parse(value) {
                Reference::Plain => {
                    inject(name.as_str(), value.as_str());
                    continue;
                }
                Reference::Secret { path, key } => (path, key),
                Reference::Invalid => {
                    return Err(InjectError::InvalidReference {
                        name: name.clone(),
                        reference: value.clone(),
                    }
                    .into())
                }
            };

            let Some(secret) = self.lookup(path)? else {
                continue;
            };

            match secret.get(key) {
                Some(resolved) => inject(name.as_str(), resolved),
                None if self.config.ignore_missing_secrets => {
                    warn!(path, key, "key not found under path");
                    continue;
                }
                None => {
                    return Err(InjectError::KeyNotFound {
                        path: path.to_string(),
                        key: key.to_string(),
                    }
                    .into())
                }
            }

            if watched.insert(path) {
                self.watch_lease(path, secret);
            }
        }

        Ok(())
    }

    fn inject_secrets_from_path(&self, paths: &str, inject: &mut InjectFn<'_>) -> Result<()> {
        for path in paths.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let Some(secret) = self.lookup(path)? else {
                continue;
            };
            for (key, value) in &secret.data {
                inject(key.as_str(), value.as_str());
            }
        }
        Ok(())
    }

    fn revoke_token(&self) -> Result<()> {
        debug!("local secret store holds no server-side token");
        Ok(())
    }
}
