//! Environment visibility policy.
//!
//! Decides, per variable name, whether a variable may reach the child
//! process. Names absent from the table always pass. Listed names are either
//! login-only (forwarded when the child performs its own login) or
//! supervisor-internal (never forwarded).

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::constants;

/// Built-in rule table: `(name, login_only)`.
const DEFAULT_RULES: &[(&str, bool)] = &[
    ("VAULT_TOKEN", true),
    ("VAULT_ADDR", true),
    ("VAULT_AGENT_ADDR", true),
    ("VAULT_CACERT", true),
    ("VAULT_CAPATH", true),
    ("VAULT_CLIENT_CERT", true),
    ("VAULT_CLIENT_KEY", true),
    ("VAULT_CLIENT_TIMEOUT", true),
    ("VAULT_SRV_LOOKUP", true),
    ("VAULT_SKIP_VERIFY", true),
    ("VAULT_NAMESPACE", true),
    ("VAULT_TLS_SERVER_NAME", true),
    ("VAULT_WRAP_TTL", true),
    ("VAULT_MFA", true),
    ("VAULT_MAX_RETRIES", true),
    ("VAULT_CLUSTER_ADDR", false),
    ("VAULT_REDIRECT_ADDR", false),
    ("VAULT_CLI_NO_COLOR", false),
    ("VAULT_RATE_LIMIT", false),
    ("VAULT_ROLE", false),
    ("VAULT_PATH", false),
    ("VAULT_AUTH_METHOD", false),
    ("VAULT_TRANSIT_KEY_ID", false),
    ("VAULT_TRANSIT_PATH", false),
    ("VAULT_TRANSIT_BATCH_SIZE", false),
    ("VAULT_IGNORE_MISSING_SECRETS", false),
    ("VAULT_ENV_PASSTHROUGH", false),
    ("VAULT_JSON_LOG", false),
    ("VAULT_LOG_LEVEL", false),
    ("VAULT_REVOKE_TOKEN", false),
    ("VAULT_ENV_DAEMON", false),
    ("VAULT_ENV_FROM_PATH", false),
    ("VAULT_ENV_DELAY", false),
    (constants::VAULT_ENV_SECRETS_FILE, false),
    (constants::VAULT_ENV_LOG_SERVER, false),
];

/// Visibility rule for one managed variable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityRule {
    /// Forward only when the child performs its own login.
    pub login_only: bool,
}

/// Outcome of classifying one variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Include,
    Exclude,
}

/// Per-run visibility policy.
///
/// Built once at startup, then narrowed by the passthrough allow-list.
/// Nothing else mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizePolicy {
    rules: BTreeMap<String, VisibilityRule>,
}

impl Default for SanitizePolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl SanitizePolicy {
    /// Policy with the built-in rule table.
    pub fn new() -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .map(|(name, login_only)| {
                (
                    name.to_string(),
                    VisibilityRule {
                        login_only: *login_only,
                    },
                )
            })
            .collect();

        Self { rules }
    }

    /// Drop the rules for every allow-listed name.
    ///
    /// Entries are trimmed; empty entries are ignored. Removal is permanent
    /// for the lifetime of this policy.
    pub fn passthrough<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if self.rules.remove(name).is_some() {
                debug!(name, "passthrough removes visibility rule");
            }
        }
    }

    /// Rule governing `name`, if any.
    pub fn rule(&self, name: &str) -> Option<VisibilityRule> {
        self.rules.get(name).copied()
    }

    /// Classify a variable name.
    pub fn decide(&self, name: &str, login: bool) -> Decision {
        match self.rules.get(name) {
            None => Decision::Include,
            Some(rule) if rule.login_only && login => Decision::Include,
            Some(_) => Decision::Exclude,
        }
    }
}
