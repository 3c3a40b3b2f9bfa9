// In-process key-value store with per-key expiry
// Stands in for a shared store in tests and single-process deployments

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use super::{KvStore, StoreError};

/// A stored value and the instant it stops being visible
#[derive(Debug, Clone)]
pub(crate) struct StoredValue {
    value: String,
    expires_at: Instant,
}

impl StoredValue {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory store using DashMap
///
/// Expired entries are invisible to every operation as soon as their
/// deadline passes. They are physically removed when overwritten, deleted,
/// or swept by the optional cleanup task.
pub struct MemoryStore {
    entries: Arc<DashMap<String, StoredValue>>,
    cleanup_handle: Option<JoinHandle<()>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            cleanup_handle: None,
        }
    }

    /// Start a background task that evicts expired entries every `interval`.
    ///
    /// Must be called from within a tokio runtime. The task stops when the
    /// store is dropped.
    pub fn with_cleanup(mut self, interval: Duration) -> Self {
        let entries = self.entries.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let swept = Self::sweep_expired(&entries);
                if swept > 0 {
                    debug!(count = swept, "Cleaned up expired store entries");
                }
            }
        });

        self.cleanup_handle = Some(handle);
        self
    }

    fn sweep_expired(entries: &DashMap<String, StoredValue>) -> usize {
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, stored| !stored.is_expired(now));
        before - entries.len()
    }

    /// Number of physically stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        if let Some(handle) = self.cleanup_handle.take() {
            handle.abort();
        }
    }
}

fn invalid_expire() -> StoreError {
    StoreError::Command("invalid expire time in 'set' command".to_string())
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        // Millisecond resolution, like PX
        if ttl.as_millis() == 0 {
            return Err(invalid_expire());
        }

        let now = Instant::now();
        let expires_at = now.checked_add(ttl).ok_or_else(invalid_expire)?;
        let stored = StoredValue {
            value: value.to_string(),
            expires_at,
        };

        // The entry guard holds the shard lock, so check-and-insert is atomic per key
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now) {
                    occupied.insert(stored);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(stored);
                Ok(true)
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        Ok(self
            .entries
            .get(key)
            .filter(|stored| !stored.is_expired(now))
            .map(|stored| stored.value.clone()))
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, stored)| !stored.is_expired(now)))
    }

    async fn delete_if_equals(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove_if(key, |_, stored| {
                !stored.is_expired(now) && stored.value == value
            })
            .is_some())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let now = Instant::now();
        Ok(self
            .entries
            .get(key)
            .filter(|stored| !stored.is_expired(now))
            .map(|stored| stored.expires_at - now))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
