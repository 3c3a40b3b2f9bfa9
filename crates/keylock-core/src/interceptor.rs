// Timed operation logging
// Records how long a named operation took, however it finished

use std::future::Future;
use std::time::Instant;

use metrics::histogram;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::metrics::OPERATION_DURATION_SECONDS;

/// Names the operation being timed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSpec {
    /// Module the operation belongs to
    pub module: String,
    /// Short description of the operation
    #[serde(default)]
    pub info: String,
}

impl LogSpec {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            info: String::new(),
        }
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = info.into();
        self
    }
}

/// Logs on drop, so a panic or a cancelled future is still recorded
struct OperationTimer<'a> {
    spec: &'a LogSpec,
    started: Instant,
}

impl Drop for OperationTimer<'_> {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed();
        histogram!(OPERATION_DURATION_SECONDS, "module" => self.spec.module.clone())
            .record(elapsed.as_secs_f64());
        info!(
            module = %self.spec.module,
            info = %self.spec.info,
            elapsed_ms = elapsed.as_millis() as u64,
            "Operation finished"
        );
    }
}

/// Run `operation` and log its duration under `spec`
pub async fn timed<F: Future>(spec: &LogSpec, operation: F) -> F::Output {
    let _timer = OperationTimer {
        spec,
        started: Instant::now(),
    };
    operation.await
}
