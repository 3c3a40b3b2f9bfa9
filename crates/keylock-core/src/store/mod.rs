//! Shared key-value store seam
//!
//! The lock manager never talks to a concrete store. It is handed an
//! `Arc<dyn KvStore>` and relies on the store's atomic set-if-absent for
//! mutual exclusion across processes.

mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use std::time::Duration;

use async_trait::async_trait;

/// Errors raised while talking to the shared store
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached (connection refused, IO failure, timeout)
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store answered but rejected or failed the command
    #[error("store command failed: {0}")]
    Command(String),
}

/// Shared key-value store contract consumed by the lock manager
#[async_trait]
pub trait KvStore: Send + Sync {
    /// `SET key value PX ttl NX`; `true` when the key was created.
    ///
    /// `ttl` has millisecond resolution; a ttl below one millisecond or too
    /// large for the store is a [`StoreError::Command`].
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration)
    -> Result<bool, StoreError>;

    /// `GET key`
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// `DEL key`; `true` when a key was removed
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Delete `key` only if it currently holds `value`, as one atomic step
    async fn delete_if_equals(&self, key: &str, value: &str) -> Result<bool, StoreError>;

    /// Remaining lifetime of `key`, `None` when absent or without expiry
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError>;

    /// Connectivity probe
    async fn ping(&self) -> Result<(), StoreError>;
}
