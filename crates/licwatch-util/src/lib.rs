//! Shared utilities for licwatch
//!
//! This crate provides:
//! - ID types (VariantId, PluginId, ProductCode)
//! - Time utilities (monotonic time, duration helpers)
//! - Default paths for the config file

mod ids;
mod paths;
mod time;

pub use ids::*;
pub use paths::*;
pub use time::*;
