//! Configuration types deserialized from `mason.toml`.

use std::path::PathBuf;

use mason_exec::SpillConfig;
use serde::Deserialize;

/// The top-level engine configuration parsed from `mason.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct EngineConfig {
    /// Core engine settings (store location, tool version).
    #[serde(default)]
    pub engine: EngineSection,

    /// Command-spill settings, passed through to `mason_exec`.
    #[serde(default)]
    pub spill: SpillConfig,
}

/// The `[engine]` section of `mason.toml`.
#[derive(Debug, Deserialize)]
pub struct EngineSection {
    /// Directory holding the build-info store, relative to the project root.
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,

    /// Overrides the tool version used for store compatibility checks.
    /// Defaults to the running tool's own version when absent.
    #[serde(default)]
    pub tool_version: Option<String>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            tool_version: None,
        }
    }
}

fn default_store_dir() -> PathBuf {
    PathBuf::from(".mason")
}
