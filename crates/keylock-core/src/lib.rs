//! keylock Core - Distributed lock manager
//!
//! This crate provides:
//! - The shared key-value store seam with Redis and in-memory implementations
//! - Lock acquire/release with token-checked safe release
//! - Guarded execution of an operation inside a lock
//! - Timed operation logging
//! - Lock metrics

pub mod guard;
pub mod interceptor;
pub mod lock;
pub mod metrics;
pub mod store;

pub use guard::{GuardedError, with_lock};
pub use interceptor::{LogSpec, timed};
pub use lock::{DistributedLockManager, LockError, LockSpec, LockStats, LockToken, ReleaseMode};
pub use store::{KvStore, MemoryStore, RedisStore, StoreError};
