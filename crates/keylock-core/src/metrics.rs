// Metrics for the lock manager
// Counters and histograms published through the `metrics` facade

use metrics::{describe_counter, describe_histogram};

pub const LOCK_ACQUIRE_TOTAL: &str = "keylock_acquire_total";
pub const LOCK_RELEASE_TOTAL: &str = "keylock_release_total";
pub const LOCK_HOLD_DURATION_SECONDS: &str = "keylock_hold_duration_seconds";
pub const OPERATION_DURATION_SECONDS: &str = "keylock_operation_duration_seconds";

/// Initialize all metric descriptions
/// Should be called once at application startup
pub fn init_metrics() {
    describe_counter!(
        LOCK_ACQUIRE_TOTAL,
        "Lock acquisition attempts by result (acquired, contended, error)"
    );
    describe_counter!(
        LOCK_RELEASE_TOTAL,
        "Lock release attempts by result (released, stale, error)"
    );
    describe_histogram!(
        LOCK_HOLD_DURATION_SECONDS,
        "Time between lock acquisition and release in seconds"
    );
    describe_histogram!(
        OPERATION_DURATION_SECONDS,
        "Duration of timed operations in seconds"
    );
}
