//! Error types and error codes for keylock
//!
//! This module defines:
//! - `KeylockError`: Application-level error enum
//! - `ErrorCode`: Structured error codes reported alongside failures

use serde::{Deserialize, Serialize};

/// Application-level error types
#[derive(thiserror::Error, Debug)]
pub enum KeylockError {
    #[error("caused: {0}")]
    IllegalArgument(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// Error code structure reported with lock failures
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

pub const SUCCESS: ErrorCode<'static> = ErrorCode {
    code: 0,
    message: "success",
};

// Business errors (lock contention is a business-level rejection)
pub const LOCK_CONTENTION: ErrorCode<'static> = ErrorCode {
    code: 10000,
    message: "distributed lock is held by another caller",
};

pub const PARAMETER_VALIDATE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 20002,
    message: "parameter validate error",
};

pub const STORE_UNAVAILABLE: ErrorCode<'static> = ErrorCode {
    code: 30000,
    message: "lock store unavailable",
};

pub const STORE_COMMAND_ERROR: ErrorCode<'static> = ErrorCode {
    code: 30001,
    message: "lock store command error",
};

pub const INTERNAL_SERVER_ERROR: ErrorCode<'static> = ErrorCode {
    code: 500,
    message: "Internal Server Error",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keylock_error_display() {
        let err = KeylockError::IllegalArgument("lock name is empty".to_string());
        assert_eq!(format!("{}", err), "caused: lock name is empty");

        let err = KeylockError::ConfigError("unknown store kind 'etcd'".to_string());
        assert_eq!(
            format!("{}", err),
            "configuration error: unknown store kind 'etcd'"
        );
    }

    #[test]
    fn test_error_code_constants() {
        assert_eq!(SUCCESS.code, 0);
        assert_eq!(SUCCESS.message, "success");
        assert_eq!(LOCK_CONTENTION.code, 10000);
        assert_eq!(PARAMETER_VALIDATE_ERROR.code, 20002);
        assert_eq!(STORE_UNAVAILABLE.code, 30000);
        assert_eq!(INTERNAL_SERVER_ERROR.code, 500);
    }
}
