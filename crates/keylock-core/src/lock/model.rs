//! Distributed lock data model

use std::str::FromStr;
use std::time::Instant;

use keylock_common::{DEFAULT_EXPIRE_SECONDS, KeylockError};
use serde::{Deserialize, Serialize};

/// Declarative lock marker for a protected operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockSpec {
    /// Lock name, namespaced by the manager's prefix before it reaches the store
    pub lock_key: String,
    /// Expiry in seconds
    #[serde(default = "default_expire")]
    pub expire: u64,
}

fn default_expire() -> u64 {
    DEFAULT_EXPIRE_SECONDS
}

impl LockSpec {
    pub fn new(lock_key: impl Into<String>) -> Self {
        Self {
            lock_key: lock_key.into(),
            expire: DEFAULT_EXPIRE_SECONDS,
        }
    }

    pub fn with_expire(mut self, expire: u64) -> Self {
        self.expire = expire;
        self
    }
}

/// Proof of ownership for one successful acquisition
///
/// The value is a fresh v4 UUID in simple (undashed) form. Two tokens are
/// equal when their values are equal; the acquisition instant only feeds
/// hold-time statistics.
#[derive(Debug, Clone)]
pub struct LockToken {
    value: String,
    acquired_at: Option<Instant>,
}

impl LockToken {
    pub(crate) fn generate() -> Self {
        Self {
            value: uuid::Uuid::new_v4().simple().to_string(),
            acquired_at: Some(Instant::now()),
        }
    }

    /// Rebuild a token from its stored value, e.g. one handed over out of band
    pub fn from_value(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            acquired_at: None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub(crate) fn acquired_at(&self) -> Option<Instant> {
        self.acquired_at
    }
}

impl PartialEq for LockToken {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for LockToken {}

impl std::fmt::Display for LockToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// How a holder removes its lock record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReleaseMode {
    /// One compare-and-delete executed by the store
    #[default]
    Atomic,
    /// `GET` then `DEL` as two separate store calls.
    /// The key can expire and be re-acquired between the two calls.
    CheckThenDelete,
}

impl ReleaseMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ReleaseMode::Atomic => "atomic",
            ReleaseMode::CheckThenDelete => "check-then-delete",
        }
    }
}

impl std::fmt::Display for ReleaseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReleaseMode {
    type Err = KeylockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "atomic" => Ok(ReleaseMode::Atomic),
            "check-then-delete" => Ok(ReleaseMode::CheckThenDelete),
            _ => Err(KeylockError::IllegalArgument(format!(
                "invalid release mode: {}",
                s
            ))),
        }
    }
}

/// Lock statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockStats {
    /// Successful acquisitions
    pub total_acquisitions: u64,
    /// Acquisitions rejected because the key was held
    pub failed_acquisitions: u64,
    /// Releases that removed the caller's record
    pub total_releases: u64,
    /// Releases that found the record expired or owned by someone else
    pub stale_releases: u64,
    /// Store failures during acquire or release
    pub store_errors: u64,
    /// Average time between acquisition and release in milliseconds
    pub avg_hold_time_ms: u64,
}
