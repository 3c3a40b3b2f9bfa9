//! Distributed lock manager
//!
//! Provides:
//! - Fail-fast acquisition through the store's atomic set-if-absent
//! - Token-checked release that never removes another holder's record
//! - Acquire/release statistics and metrics

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use keylock_common::error::{
    ErrorCode, LOCK_CONTENTION, PARAMETER_VALIDATE_ERROR, STORE_COMMAND_ERROR, STORE_UNAVAILABLE,
};
use keylock_common::{DISTRIBUTED_LOCK_PREFIX, lock_key};
use metrics::{counter, histogram};
use tracing::{error, info, warn};

use super::model::{LockStats, LockToken, ReleaseMode};
use crate::metrics::{LOCK_ACQUIRE_TOTAL, LOCK_HOLD_DURATION_SECONDS, LOCK_RELEASE_TOTAL};
use crate::store::{KvStore, StoreError};

/// Lock manager errors
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The key is already held by another caller
    #[error("Distributed Lock Error, LockKey is [{lock_key}]")]
    Contention { lock_key: String },

    #[error("invalid lock argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LockError {
    pub fn error_code(&self) -> ErrorCode<'static> {
        match self {
            LockError::Contention { .. } => LOCK_CONTENTION,
            LockError::InvalidArgument(_) => PARAMETER_VALIDATE_ERROR,
            LockError::Store(StoreError::Unavailable(_)) => STORE_UNAVAILABLE,
            LockError::Store(StoreError::Command(_)) => STORE_COMMAND_ERROR,
        }
    }

    pub fn is_contention(&self) -> bool {
        matches!(self, LockError::Contention { .. })
    }
}

#[derive(Default)]
struct LockStatsCollector {
    total_acquisitions: AtomicU64,
    failed_acquisitions: AtomicU64,
    total_releases: AtomicU64,
    stale_releases: AtomicU64,
    store_errors: AtomicU64,
    total_hold_time_ms: AtomicU64,
    completed_holds: AtomicU64,
}

/// Acquires and releases named locks against a shared store
///
/// Holds no per-lock state: the store is the only coordination point and
/// the token returned by [`acquire`](Self::acquire) is the only proof of
/// ownership.
pub struct DistributedLockManager {
    store: Arc<dyn KvStore>,
    prefix: String,
    release_mode: ReleaseMode,
    stats: LockStatsCollector,
}

impl DistributedLockManager {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            prefix: DISTRIBUTED_LOCK_PREFIX.to_string(),
            release_mode: ReleaseMode::default(),
            stats: LockStatsCollector::default(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_release_mode(mut self, release_mode: ReleaseMode) -> Self {
        self.release_mode = release_mode;
        self
    }

    pub fn release_mode(&self) -> ReleaseMode {
        self.release_mode
    }

    /// Namespaced store key for a lock name
    pub fn lock_key(&self, name: &str) -> String {
        lock_key(&self.prefix, name)
    }

    /// Try once to take the lock `name` for `ttl_secs` seconds.
    ///
    /// Never waits or retries: a held key yields [`LockError::Contention`].
    pub async fn acquire(&self, name: &str, ttl_secs: u64) -> Result<LockToken, LockError> {
        validate(name, ttl_secs)?;

        let key = self.lock_key(name);
        let token = LockToken::generate();

        match self
            .store
            .set_if_absent(&key, token.as_str(), Duration::from_secs(ttl_secs))
            .await
        {
            Ok(true) => {
                self.stats
                    .total_acquisitions
                    .fetch_add(1, Ordering::Relaxed);
                counter!(LOCK_ACQUIRE_TOTAL, "result" => "acquired").increment(1);
                info!(lock_key = %key, token = %token, ttl_secs, "Acquired distributed lock");
                Ok(token)
            }
            Ok(false) => {
                self.stats
                    .failed_acquisitions
                    .fetch_add(1, Ordering::Relaxed);
                counter!(LOCK_ACQUIRE_TOTAL, "result" => "contended").increment(1);
                info!(lock_key = %key, token = %token, "Failed to acquire distributed lock");
                Err(LockError::Contention {
                    lock_key: name.to_string(),
                })
            }
            Err(e) => {
                self.stats.store_errors.fetch_add(1, Ordering::Relaxed);
                counter!(LOCK_ACQUIRE_TOTAL, "result" => "error").increment(1);
                error!(lock_key = %key, error = %e, "Lock store failed during acquire");
                Err(e.into())
            }
        }
    }

    /// Release `name` if it is still held with `token`.
    ///
    /// Returns `true` when this call removed the record and `false` when the
    /// record had already expired or belongs to a later holder.
    pub async fn release(&self, name: &str, token: &LockToken) -> Result<bool, LockError> {
        let key = self.lock_key(name);

        let outcome = match self.release_mode {
            ReleaseMode::Atomic => self.store.delete_if_equals(&key, token.as_str()).await,
            ReleaseMode::CheckThenDelete => self.check_then_delete(&key, token).await,
        };

        match outcome {
            Ok(true) => {
                self.stats.total_releases.fetch_add(1, Ordering::Relaxed);
                counter!(LOCK_RELEASE_TOTAL, "result" => "released").increment(1);
                if let Some(acquired_at) = token.acquired_at() {
                    let held = acquired_at.elapsed();
                    self.stats
                        .total_hold_time_ms
                        .fetch_add(held.as_millis() as u64, Ordering::Relaxed);
                    self.stats.completed_holds.fetch_add(1, Ordering::Relaxed);
                    histogram!(LOCK_HOLD_DURATION_SECONDS).record(held.as_secs_f64());
                }
                info!(lock_key = %key, token = %token, "Released distributed lock");
                Ok(true)
            }
            Ok(false) => {
                self.stats.stale_releases.fetch_add(1, Ordering::Relaxed);
                counter!(LOCK_RELEASE_TOTAL, "result" => "stale").increment(1);
                warn!(
                    lock_key = %key,
                    token = %token,
                    "Lock no longer held by this token, skipping release"
                );
                Ok(false)
            }
            Err(e) => {
                self.stats.store_errors.fetch_add(1, Ordering::Relaxed);
                counter!(LOCK_RELEASE_TOTAL, "result" => "error").increment(1);
                error!(lock_key = %key, token = %token, error = %e, "Lock store failed during release");
                Err(e.into())
            }
        }
    }

    async fn check_then_delete(&self, key: &str, token: &LockToken) -> Result<bool, StoreError> {
        match self.store.get(key).await? {
            Some(current) if current == token.as_str() => self.store.delete(key).await,
            _ => Ok(false),
        }
    }

    /// Token currently stored for `name`, if any
    pub async fn holder(&self, name: &str) -> Result<Option<String>, LockError> {
        Ok(self.store.get(&self.lock_key(name)).await?)
    }

    /// Remaining lifetime of the record for `name`, if any
    pub async fn remaining_ttl(&self, name: &str) -> Result<Option<Duration>, LockError> {
        Ok(self.store.ttl(&self.lock_key(name)).await?)
    }

    /// Check that the store answers
    pub async fn ping(&self) -> Result<(), LockError> {
        Ok(self.store.ping().await?)
    }

    pub fn stats(&self) -> LockStats {
        let completed = self.stats.completed_holds.load(Ordering::Relaxed);
        let total_hold = self.stats.total_hold_time_ms.load(Ordering::Relaxed);
        let avg_hold = if completed > 0 {
            total_hold / completed
        } else {
            0
        };

        LockStats {
            total_acquisitions: self.stats.total_acquisitions.load(Ordering::Relaxed),
            failed_acquisitions: self.stats.failed_acquisitions.load(Ordering::Relaxed),
            total_releases: self.stats.total_releases.load(Ordering::Relaxed),
            stale_releases: self.stats.stale_releases.load(Ordering::Relaxed),
            store_errors: self.stats.store_errors.load(Ordering::Relaxed),
            avg_hold_time_ms: avg_hold,
        }
    }
}

fn validate(name: &str, ttl_secs: u64) -> Result<(), LockError> {
    if name.trim().is_empty() {
        return Err(LockError::InvalidArgument(
            "lock name must not be empty".to_string(),
        ));
    }
    if ttl_secs == 0 {
        return Err(LockError::InvalidArgument(
            "expire must be a positive number of seconds".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::store::MemoryStore;

    fn manager() -> DistributedLockManager {
        DistributedLockManager::new(Arc::new(MemoryStore::new()))
    }

    /// Store whose every call fails as if Redis were down
    struct DownStore;

    #[async_trait]
    impl KvStore for DownStore {
        async fn set_if_absent(&self, _: &str, _: &str, _: Duration) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn get(&self, _: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn delete(&self, _: &str) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn delete_if_equals(&self, _: &str, _: &str) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn ttl(&self, _: &str) -> Result<Option<Duration>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_acquire_writes_namespaced_key() {
        let store = Arc::new(MemoryStore::new());
        let manager = DistributedLockManager::new(store.clone());

        let token = manager.acquire("orderLock", 10).await.unwrap();
        assert_eq!(
            store.get("DistributedLock:orderLock").await.unwrap(),
            Some(token.as_str().to_string())
        );
    }

    #[tokio::test]
    async fn test_custom_prefix() {
        let store = Arc::new(MemoryStore::new());
        let manager = DistributedLockManager::new(store.clone()).with_prefix("app:lock:");

        manager.acquire("job", 10).await.unwrap();
        assert!(store.get("app:lock:job").await.unwrap().is_some());
        assert!(store.get("DistributedLock:job").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_contention_carries_lock_key() {
        let manager = manager();
        manager.acquire("orderLock", 10).await.unwrap();

        let err = manager.acquire("orderLock", 10).await.unwrap_err();
        assert_eq!(
            err,
            LockError::Contention {
                lock_key: "orderLock".to_string()
            }
        );
        assert_eq!(
            err.to_string(),
            "Distributed Lock Error, LockKey is [orderLock]"
        );
        assert_eq!(err.error_code(), LOCK_CONTENTION);
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let manager = manager();

        let err = manager.acquire("", 10).await.unwrap_err();
        assert!(matches!(err, LockError::InvalidArgument(_)));
        assert_eq!(err.error_code(), PARAMETER_VALIDATE_ERROR);

        let err = manager.acquire("k", 0).await.unwrap_err();
        assert!(matches!(err, LockError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_huge_expire_is_a_store_error() {
        let manager = manager();

        let err = manager.acquire("k", u64::MAX).await.unwrap_err();
        assert!(matches!(err, LockError::Store(StoreError::Command(_))));
        assert_eq!(err.error_code(), STORE_COMMAND_ERROR);
        assert_eq!(manager.holder("k").await.unwrap(), None);
        assert_eq!(manager.stats().store_errors, 1);

        assert!(manager.acquire("k", 10).await.is_ok());
    }

    #[tokio::test]
    async fn test_release_with_foreign_token_is_noop() {
        let manager = manager();
        let token = manager.acquire("k", 10).await.unwrap();

        let foreign = LockToken::from_value("not-the-holder");
        assert!(!manager.release("k", &foreign).await.unwrap());
        assert_eq!(
            manager.holder("k").await.unwrap(),
            Some(token.as_str().to_string())
        );

        assert!(manager.release("k", &token).await.unwrap());
        assert_eq!(manager.holder("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_check_then_delete_mode() {
        let manager = manager().with_release_mode(ReleaseMode::CheckThenDelete);
        assert_eq!(manager.release_mode(), ReleaseMode::CheckThenDelete);

        let token = manager.acquire("k", 10).await.unwrap();
        assert!(!manager.release("k", &LockToken::from_value("x")).await.unwrap());
        assert!(manager.release("k", &token).await.unwrap());
        assert!(manager.acquire("k", 10).await.is_ok());
    }

    #[tokio::test]
    async fn test_store_failures_surface() {
        let manager = DistributedLockManager::new(Arc::new(DownStore));

        let err = manager.acquire("k", 10).await.unwrap_err();
        assert!(matches!(err, LockError::Store(StoreError::Unavailable(_))));
        assert_eq!(err.error_code(), STORE_UNAVAILABLE);

        let err = manager
            .release("k", &LockToken::from_value("t"))
            .await
            .unwrap_err();
        assert!(matches!(err, LockError::Store(_)));
        assert!(manager.ping().await.is_err());

        assert_eq!(manager.stats().store_errors, 2);
    }

    #[tokio::test]
    async fn test_stats() {
        let manager = manager();

        for i in 0..3 {
            manager.acquire(&format!("lock-{}", i), 30).await.unwrap();
        }
        let token = manager.acquire("held", 30).await.unwrap();
        assert!(manager.acquire("held", 30).await.is_err());
        manager.release("held", &token).await.unwrap();
        manager.release("held", &token).await.unwrap();

        let stats = manager.stats();
        assert_eq!(stats.total_acquisitions, 4);
        assert_eq!(stats.failed_acquisitions, 1);
        assert_eq!(stats.total_releases, 1);
        assert_eq!(stats.stale_releases, 1);
        assert_eq!(stats.store_errors, 0);
    }

    #[tokio::test]
    async fn test_remaining_ttl() {
        let manager = manager();
        assert_eq!(manager.remaining_ttl("k").await.unwrap(), None);

        manager.acquire("k", 10).await.unwrap();
        let ttl = manager.remaining_ttl("k").await.unwrap().unwrap();
        assert!(ttl <= Duration::from_secs(10));
        assert!(ttl > Duration::from_secs(9));
    }
}
