//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (`<config dir>/trailer-forge/config.toml`)
//! 3. Project config (`.trailer-forge/config.toml`)
//! 4. Environment variables (`TRAILER_*`)
//! 5. CLI arguments (highest priority)

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
