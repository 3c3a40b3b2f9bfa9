//! Application startup: logging and lock manager wiring.

mod logging;
mod store;

pub use logging::{LogRotation, LoggingConfig, LoggingGuard, init_logging};
pub use store::build_lock_manager;
