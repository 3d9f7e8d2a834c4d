//! Secret injection seams.
//!
//! The supervisor never talks to a secret service directly. It hands the
//! environment snapshot to a [`SecretInjector`] and receives resolved
//! variables back through a callback. Leased secrets fetched in daemon mode
//! are passed to a [`SecretRenewer`] so their lifetime can be tied to the
//! child's.
//!
//! ## Adding a New Backend
//!
//! 1. Implement `SecretInjector` for the backend's client
//! 2. Call the configured renewer for every leased secret it fetches
//! 3. Provide a matching `LeaseWatcherFactory` in `core::lease`

use std::collections::BTreeMap;

use crate::core::secret::Secret;
use crate::error::Result;

/// Callback receiving one resolved `(name, value)` pair.
pub type InjectFn<'a> = dyn FnMut(&str, &str) + 'a;

/// Options shared by injector implementations.
#[derive(Debug, Clone, Copy, Default)]
pub struct InjectorConfig {
    /// Hand leased secrets to the renewer.
    pub daemon_mode: bool,
    /// Treat missing secrets as warnings instead of errors.
    pub ignore_missing_secrets: bool,
}

/// Resolves secret references into plain values.
pub trait SecretInjector {
    /// Inject every variable of `env`, resolving secret references.
    ///
    /// Values that are not references are injected unchanged.
    ///
    /// # Errors
    ///
    /// Returns `InjectError` when a reference cannot be resolved and missing
    /// secrets are not ignored.
    fn inject_secrets(&self, env: &BTreeMap<String, String>, inject: &mut InjectFn<'_>)
        -> Result<()>;

    /// Inject every key of the secrets stored under the comma-separated
    /// `paths`.
    ///
    /// # Errors
    ///
    /// Returns `InjectError` when a path is missing and missing secrets are
    /// not ignored.
    fn inject_secrets_from_path(&self, paths: &str, inject: &mut InjectFn<'_>) -> Result<()>;

    /// Revoke the token the injector authenticated with.
    fn revoke_token(&self) -> Result<()>;
}

/// Receives leased secrets as they are fetched.
pub trait SecretRenewer: Send + Sync {
    /// Start watching the lease of `secret`, fetched from `path`.
    fn renew(&self, path: &str, secret: &Secret) -> Result<()>;
}
