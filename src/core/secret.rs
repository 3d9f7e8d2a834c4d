//! Secret and lease domain types.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use zeroize::Zeroizing;

/// A secret fetched from the store.
#[derive(Clone, Deserialize)]
pub struct Secret {
    /// Key/value payload.
    #[serde(default)]
    pub data: BTreeMap<String, Zeroizing<String>>,
    /// Lease length granted at fetch time, in seconds. Zero means unleased.
    #[serde(default)]
    pub lease_duration: u64,
    #[serde(default)]
    pub renewable: bool,
    /// Upper bound on total lease lifetime, in seconds. Zero means unbounded.
    #[serde(default)]
    pub max_ttl: u64,
}

impl Secret {
    pub fn lease(&self) -> Duration {
        Duration::from_secs(self.lease_duration)
    }

    /// Whether the secret carries a lease worth watching.
    pub fn is_leased(&self) -> bool {
        self.lease_duration > 0
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(|v| v.as_str())
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .field("lease_duration", &self.lease_duration)
            .field("renewable", &self.renewable)
            .field("max_ttl", &self.max_ttl)
            .finish()
    }
}

/// Phase of a watched lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeasePhase {
    Watching,
    RenewalReceived,
    TerminationRequested,
    Escalated,
}

/// Watch state of one leased secret.
#[derive(Debug, Clone)]
pub struct LeaseState {
    pub path: String,
    pub renewable: bool,
    pub lease_duration: Duration,
    pub phase: LeasePhase,
}

impl LeaseState {
    pub fn new(path: &str, secret: &Secret) -> Self {
        Self {
            path: path.to_string(),
            renewable: secret.renewable,
            lease_duration: secret.lease(),
            phase: LeasePhase::Watching,
        }
    }
}
