//! Sanitized child environment.
//!
//! Accumulates the variables the child may see, in the order they were
//! offered. Values may hold resolved secrets and are wiped on drop.
//!
//! Variables that are not valid UTF-8 cannot be secret references, so they
//! are kept as raw bytes next to the resolved entries and only classified.

use std::ffi::{OsStr, OsString};

use tracing::trace;
use zeroize::Zeroizing;

use crate::core::policy::{Decision, SanitizePolicy};

/// The environment handed to the child process.
pub struct SanitizedEnviron<'a> {
    policy: &'a SanitizePolicy,
    login: bool,
    entries: Vec<(String, Zeroizing<String>)>,
    raw: Vec<(OsString, OsString)>,
}

impl<'a> SanitizedEnviron<'a> {
    pub fn new(policy: &'a SanitizePolicy, login: bool) -> Self {
        Self {
            policy,
            login,
            entries: Vec::new(),
            raw: Vec::new(),
        }
    }

    /// Offer one variable; it is kept only if the policy includes it.
    pub fn append(&mut self, name: &str, value: &str) {
        match self.policy.decide(name, self.login) {
            Decision::Include => {
                self.entries
                    .push((name.to_string(), Zeroizing::new(value.to_string())));
            }
            Decision::Exclude => trace!(name, "variable hidden from child"),
        }
    }

    /// Offer a variable that is not valid UTF-8.
    ///
    /// A name that is not UTF-8 can't appear in the rule table and is always
    /// kept.
    pub fn append_raw(&mut self, name: &OsStr, value: &OsStr) {
        if let Some(name) = name.to_str() {
            if self.policy.decide(name, self.login) == Decision::Exclude {
                trace!(name, "variable hidden from child");
                return;
            }
        }
        self.raw.push((name.to_os_string(), value.to_os_string()));
    }

    /// Value the child will see for `name`. The last entry wins.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// UTF-8 entries as `(name, value)` pairs, in append order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Every entry, raw ones last, ready for a process builder.
    pub fn vars_os(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.iter()
            .map(|(k, v)| (OsStr::new(k), OsStr::new(v)))
            .chain(self.raw.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str())))
    }
}
