//! Guarded execution
//!
//! Runs an operation inside a distributed lock: acquire, run, release.
//! Release happens on every exit path of the operation, including panics.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use keylock_common::error::{ErrorCode, INTERNAL_SERVER_ERROR};
use tracing::error;

use crate::lock::{DistributedLockManager, LockError, LockSpec};

/// Execute `operation` while holding the lock described by `spec`
///
/// The operation is never polled when acquisition fails. Once it has run,
/// the lock is released exactly once. An error from the operation is
/// returned unchanged inside [`GuardedError::Operation`]; a panic is
/// re-raised after release.
///
/// If the operation succeeded but release hit a store failure, the caller
/// gets [`GuardedError::Lock`]. If the operation failed, its error wins and
/// the release failure is only logged.
///
/// Dropping the returned future before it completes skips the release; the
/// record then expires after `spec.expire` seconds.
pub async fn with_lock<F, T, E>(
    manager: &DistributedLockManager,
    spec: &LockSpec,
    operation: F,
) -> Result<T, GuardedError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    let token = manager
        .acquire(&spec.lock_key, spec.expire)
        .await
        .map_err(GuardedError::Lock)?;

    let outcome = AssertUnwindSafe(operation).catch_unwind().await;
    let released = manager.release(&spec.lock_key, &token).await;

    match outcome {
        Ok(Ok(value)) => {
            released.map_err(GuardedError::Lock)?;
            Ok(value)
        }
        Ok(Err(e)) => {
            if let Err(release_err) = released {
                error!(
                    lock_key = %spec.lock_key,
                    error = %release_err,
                    "Release failed after operation error"
                );
            }
            Err(GuardedError::Operation(e))
        }
        Err(panic) => {
            if let Err(release_err) = released {
                error!(
                    lock_key = %spec.lock_key,
                    error = %release_err,
                    "Release failed after operation panic"
                );
            }
            std::panic::resume_unwind(panic)
        }
    }
}

/// Error type for guarded execution
#[derive(Debug)]
pub enum GuardedError<E> {
    /// The lock could not be acquired or released
    Lock(LockError),
    /// The protected operation failed
    Operation(E),
}

impl<E> GuardedError<E> {
    pub fn is_contention(&self) -> bool {
        matches!(self, GuardedError::Lock(e) if e.is_contention())
    }

    /// Lock failures keep their own code; a failed operation is reported as internal
    pub fn error_code(&self) -> ErrorCode<'static> {
        match self {
            GuardedError::Lock(e) => e.error_code(),
            GuardedError::Operation(_) => INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_operation_error(self) -> Option<E> {
        match self {
            GuardedError::Operation(e) => Some(e),
            GuardedError::Lock(_) => None,
        }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for GuardedError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuardedError::Lock(e) => write!(f, "{}", e),
            GuardedError::Operation(e) => write!(f, "Operation failed: {}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for GuardedError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GuardedError::Lock(e) => Some(e),
            GuardedError::Operation(e) => Some(e),
        }
    }
}
