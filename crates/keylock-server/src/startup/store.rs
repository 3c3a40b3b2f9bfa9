use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use keylock_core::{DistributedLockManager, KvStore, MemoryStore, RedisStore};
use tracing::info;

use crate::model::config::{Configuration, StoreKind};

/// Sweep interval for expired records in the in-memory store
const MEMORY_CLEANUP_INTERVAL: Duration = Duration::from_secs(5);

/// Connect the configured store and build the lock manager on top of it.
///
/// Fails fast when the store does not answer a ping.
pub async fn build_lock_manager(
    configuration: &Configuration,
) -> anyhow::Result<DistributedLockManager> {
    let store: Arc<dyn KvStore> = match configuration.store_kind()? {
        StoreKind::Redis => {
            let url = configuration.redis_url();
            info!(redis_url = %url, "Connecting to Redis lock store");
            Arc::new(
                RedisStore::connect(&url)
                    .await
                    .with_context(|| format!("failed to connect to Redis at {}", url))?,
            )
        }
        StoreKind::Memory => {
            info!("Using in-memory lock store");
            Arc::new(MemoryStore::new().with_cleanup(MEMORY_CLEANUP_INTERVAL))
        }
    };

    let manager = DistributedLockManager::new(store)
        .with_prefix(configuration.lock_prefix())
        .with_release_mode(configuration.release_mode()?);

    manager
        .ping()
        .await
        .context("lock store did not answer ping")?;

    info!(
        prefix = %configuration.lock_prefix(),
        release_mode = %manager.release_mode(),
        "Lock manager ready"
    );

    Ok(manager)
}
