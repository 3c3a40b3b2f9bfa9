//! keylock Common - Shared types and constants
//!
//! This crate provides the foundational types used across all keylock components:
//! - Error types and error codes
//! - Lock key namespace and default expiry constants

pub mod error;

// Re-exports for convenience
pub use error::{ErrorCode, KeylockError};

/// Namespace prefix prepended to every lock name before it reaches the store
pub const DISTRIBUTED_LOCK_PREFIX: &str = "DistributedLock:";

/// Lock expiry used when a lock spec does not set one, in seconds
pub const DEFAULT_EXPIRE_SECONDS: u64 = 30;

/// Build the namespaced store key for a lock name
pub fn lock_key(prefix: &str, name: &str) -> String {
    format!("{}{}", prefix, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_key_uses_prefix() {
        assert_eq!(
            lock_key(DISTRIBUTED_LOCK_PREFIX, "orderLock"),
            "DistributedLock:orderLock"
        );
        assert_eq!(lock_key("", "bare"), "bare");
    }

    #[test]
    fn test_default_expire() {
        assert_eq!(DEFAULT_EXPIRE_SECONDS, 30);
    }
}
