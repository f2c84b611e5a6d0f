//! Configuration types for hookscope.
//!
//! This crate provides the `config.json` schema, its loader, environment
//! overrides, and the layout of the telemetry directory.

pub mod env;
pub mod loader;
pub mod paths;
pub mod types;

pub use env::*;
pub use loader::*;
pub use paths::*;
pub use types::*;
