//! Persisted session record
//!
//! The one piece of durable state in the system: the bearer token for the
//! current disposable account and how many conversions have been charged
//! against it. Serialized as `{"token": ..., "usage_count": ...}` — the exact
//! shape of the store file.

use serde::{Deserialize, Serialize};

/// The currently active disposable-account credential and its quota state.
///
/// `usage_count` is incremented exactly once per successful conversion and
/// reset to 0 precisely when a new token is installed. A session is never
/// deleted, only superseded wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer credential, absent until the first provisioning
    #[serde(default)]
    pub token: Option<String>,
    /// Conversions performed with the current token
    #[serde(default)]
    pub usage_count: u32,
}

impl Session {
    /// Create a fresh session for a newly provisioned token
    pub fn fresh(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            usage_count: 0,
        }
    }

    /// Whether the token can still be handed out under the given quota.
    ///
    /// An empty token string counts as absent; stores that predate the
    /// `Option` encoding may contain one.
    pub fn is_usable(&self, max_usage: u32) -> bool {
        match &self.token {
            Some(token) => !token.is_empty() && self.usage_count < max_usage,
            None => false,
        }
    }

    /// Charge one conversion against the current token
    pub fn charge(&mut self) {
        self.usage_count += 1;
    }

    /// Remaining conversions before the quota forces reprovisioning
    pub fn remaining(&self, max_usage: u32) -> u32 {
        max_usage.saturating_sub(self.usage_count)
    }
}
