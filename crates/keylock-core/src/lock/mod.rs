//! Distributed lock implementation
//!
//! This module provides:
//! - Lock data model (spec, token, release mode, stats)
//! - Lock acquire/release against a shared key-value store

mod manager;
mod model;

pub use manager::*;
pub use model::*;
