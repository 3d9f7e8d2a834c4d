//! Runtime configuration.
//!
//! Read once from an environment snapshot at startup. The process
//! environment is never modified afterwards; login-mode adjustments are
//! applied to the snapshot instead.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::core::constants;
use crate::error::{ConfigError, Result};

/// How the supervisor authenticates against the secret store.
pub enum Credentials {
    /// A token, either from `VAULT_TOKEN` or `VAULT_TOKEN_FILE`.
    Token(Zeroizing<String>),
    /// Role/path based login.
    Login {
        role: Option<String>,
        path: Option<String>,
        method: Option<String>,
    },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(<redacted>)"),
            Self::Login { role, path, method } => f
                .debug_struct("Login")
                .field("role", role)
                .field("path", path)
                .field("method", method)
                .finish(),
        }
    }
}

/// Supervisor configuration.
#[derive(Debug)]
pub struct Config {
    /// Environment snapshot, one value per name.
    pub environ: BTreeMap<String, String>,
    /// `VAULT_TOKEN` carried the login placeholder.
    pub login: bool,
    pub credentials: Credentials,
    pub daemon: bool,
    pub delay: Option<Duration>,
    /// Names exempted from the visibility policy.
    pub passthrough: Vec<String>,
    pub revoke_token: bool,
    pub from_path: Option<String>,
    pub ignore_missing_secrets: bool,
    pub secrets_file: PathBuf,
    /// Variables whose name or value is not valid UTF-8, in environment
    /// order. They are never resolved as secrets.
    pub raw: Vec<(OsString, OsString)>,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are set aside in
    /// [`Config::raw`].
    pub fn from_env() -> Result<Self> {
        let mut vars = Vec::new();
        let mut raw = Vec::new();
        for (name, value) in std::env::vars_os() {
            let utf8 = name
                .to_str()
                .zip(value.to_str())
                .map(|(k, v)| (k.to_string(), v.to_string()));
            match utf8 {
                Some(pair) => vars.push(pair),
                None => {
                    debug!(name = ?name, "variable is not UTF-8, passing bytes through");
                    raw.push((name, value));
                }
            }
        }

        let mut config = Self::from_vars(vars)?;
        config.raw = raw;
        Ok(config)
    }

    /// Load configuration from explicit variables.
    ///
    /// Later duplicates of a name replace earlier ones.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::TokenFile` if `VAULT_TOKEN_FILE` is set but
    /// unreadable.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut environ: BTreeMap<String, String> = vars.into_iter().collect();
        let get = |name: &str| environ.get(name).map(String::as_str).unwrap_or("");

        let login = get(constants::VAULT_TOKEN) == constants::VAULT_LOGIN;
        let daemon = parse_bool(get(constants::VAULT_ENV_DAEMON));
        let delay = parse_delay(get(constants::VAULT_ENV_DELAY));
        let revoke_token = parse_bool(get(constants::VAULT_REVOKE_TOKEN));
        let ignore_missing_secrets = parse_bool(get(constants::VAULT_IGNORE_MISSING_SECRETS));

        let from_path = Some(get(constants::VAULT_ENV_FROM_PATH))
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        let secrets_file = Some(get(constants::VAULT_ENV_SECRETS_FILE))
            .filter(|p| !p.is_empty())
            .unwrap_or(constants::DEFAULT_SECRETS_FILE)
            .into();

        let credentials = match get(constants::VAULT_TOKEN_FILE) {
            "" if !login && !get(constants::VAULT_TOKEN).is_empty() => {
                Credentials::Token(Zeroizing::new(get(constants::VAULT_TOKEN).to_string()))
            }
            "" => Credentials::Login {
                role: non_empty(get(constants::VAULT_ROLE)),
                path: non_empty(get(constants::VAULT_PATH)),
                method: non_empty(get(constants::VAULT_AUTH_METHOD)),
            },
            file => {
                let path = PathBuf::from(file);
                let token = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::TokenFile { path, source })?;
                Credentials::Token(Zeroizing::new(token.trim_end().to_string()))
            }
        };

        let mut passthrough: Vec<String> = get(constants::VAULT_ENV_PASSTHROUGH)
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        if login {
            environ.insert(
                constants::VAULT_TOKEN.to_string(),
                constants::VAULT_LOGIN.to_string(),
            );
            passthrough.push(constants::VAULT_TOKEN.to_string());
        }

        debug!(
            login,
            daemon,
            revoke_token,
            ignore_missing_secrets,
            passthrough = ?passthrough,
            "config loaded"
        );

        Ok(Self {
            environ,
            login,
            credentials,
            daemon,
            delay,
            passthrough,
            revoke_token,
            from_path,
            ignore_missing_secrets,
            secrets_file,
            raw: Vec::new(),
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Parse a boolean flag. Unrecognized values, including empty, are `false`.
pub fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "t" | "T" | "TRUE" | "true" | "True")
}

/// Parse `VAULT_ENV_DELAY`.
///
/// Accepts unit-suffixed durations (`500ms`, `5s`, `1m30s`). A bare number
/// counts nanoseconds, fractions truncated. Empty, zero or unparsable means
/// no delay; the last case is logged.
pub fn parse_delay(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let parsed = if value.chars().all(|c| c.is_ascii_digit() || c == '.') {
        value
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(|n| Duration::from_nanos(n as u64))
    } else {
        humantime::parse_duration(value).ok()
    };

    match parsed {
        Some(delay) => (!delay.is_zero()).then_some(delay),
        None => {
            warn!(
                var = constants::VAULT_ENV_DELAY,
                value, "invalid delay, starting without one"
            );
            None
        }
    }
}
