//! keylock server library
//!
//! Startup plumbing (configuration, logging, store wiring) and the
//! lock-protected example service driven by the `keylock` binary.

pub mod model;
pub mod service;
pub mod startup;
