//! Engine configuration loaded from `mason.toml`.
//!
//! Covers the store location, the tool version used for whole-store
//! compatibility checks, and the command-spill settings. Every section is
//! optional; a missing file yields the defaults.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, load_config_or_default};
pub use types::{EngineConfig, EngineSection};
