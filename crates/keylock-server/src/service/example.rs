//! Lock-protected example business operation.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use keylock_core::{DistributedLockManager, GuardedError, LockSpec, LogSpec, timed, with_lock};
use tracing::info;

const TEST_LOCK_KEY: &str = "testKey";
const TEST_LOCK_EXPIRE_SECONDS: u64 = 10;
const DEFAULT_WORK: Duration = Duration::from_secs(1);

/// Business service whose `test_lock` runs at most once at a time across
/// every process sharing the lock store.
#[derive(Clone)]
pub struct ExampleService {
    manager: Arc<DistributedLockManager>,
    work: Duration,
    lock_spec: LockSpec,
    log_spec: LogSpec,
}

impl ExampleService {
    pub fn new(manager: Arc<DistributedLockManager>) -> Self {
        Self {
            manager,
            work: DEFAULT_WORK,
            lock_spec: LockSpec::new(TEST_LOCK_KEY).with_expire(TEST_LOCK_EXPIRE_SECONDS),
            log_spec: LogSpec::new("example").with_info("test lock"),
        }
    }

    /// Override the simulated work duration
    pub fn with_work(mut self, work: Duration) -> Self {
        self.work = work;
        self
    }

    pub fn lock_spec(&self) -> &LockSpec {
        &self.lock_spec
    }

    pub async fn test_lock(&self) -> Result<String, GuardedError<Infallible>> {
        timed(
            &self.log_spec,
            with_lock(&self.manager, &self.lock_spec, async {
                info!(lock_key = %self.lock_spec.lock_key, "Doing locked work");
                tokio::time::sleep(self.work).await;
                Ok("ok".to_string())
            }),
        )
        .await
    }
}
