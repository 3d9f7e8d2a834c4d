//! Constants used throughout vault-env.
//!
//! Centralizes environment variable names and fixed timings.

use std::time::Duration;

/// Placeholder value of `VAULT_TOKEN` that selects login mode.
///
/// The child receives the placeholder verbatim so it knows a token exchange
/// already happened on its behalf.
pub const VAULT_LOGIN: &str = "vault:login";

/// Prefix of a secret reference value (`vault:<path>#<key>`).
pub const SECRET_PREFIX: &str = "vault:";

/// Time between the graceful and the forceful termination signal.
pub const KILL_TIMEOUT: Duration = Duration::from_secs(10);

pub const VAULT_TOKEN: &str = "VAULT_TOKEN";
pub const VAULT_TOKEN_FILE: &str = "VAULT_TOKEN_FILE";
pub const VAULT_ROLE: &str = "VAULT_ROLE";
pub const VAULT_PATH: &str = "VAULT_PATH";
pub const VAULT_AUTH_METHOD: &str = "VAULT_AUTH_METHOD";
pub const VAULT_ENV_DAEMON: &str = "VAULT_ENV_DAEMON";
pub const VAULT_ENV_DELAY: &str = "VAULT_ENV_DELAY";
pub const VAULT_ENV_PASSTHROUGH: &str = "VAULT_ENV_PASSTHROUGH";
pub const VAULT_REVOKE_TOKEN: &str = "VAULT_REVOKE_TOKEN";
pub const VAULT_ENV_FROM_PATH: &str = "VAULT_ENV_FROM_PATH";
pub const VAULT_IGNORE_MISSING_SECRETS: &str = "VAULT_IGNORE_MISSING_SECRETS";
pub const VAULT_ENV_SECRETS_FILE: &str = "VAULT_ENV_SECRETS_FILE";
pub const VAULT_LOG_LEVEL: &str = "VAULT_LOG_LEVEL";
pub const VAULT_JSON_LOG: &str = "VAULT_JSON_LOG";
pub const VAULT_ENV_LOG_SERVER: &str = "VAULT_ENV_LOG_SERVER";

/// Default location of the local secret store.
pub const DEFAULT_SECRETS_FILE: &str = "/vault/secrets/store.json";
