//! Configuration file loading and validation.

use std::path::Path;

use crate::error::ConfigError;
use crate::types::EngineConfig;

/// Loads and validates a `mason.toml` configuration from a project directory.
pub fn load_config(project_dir: &Path) -> Result<EngineConfig, ConfigError> {
    let config_path = project_dir.join("mason.toml");
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Loads the configuration, falling back to defaults if `mason.toml` is absent.
///
/// Any other problem (unreadable file, invalid TOML, failed validation) is
/// still an error.
pub fn load_config_or_default(project_dir: &Path) -> Result<EngineConfig, ConfigError> {
    let config_path = project_dir.join("mason.toml");
    if !config_path.exists() {
        return Ok(EngineConfig::default());
    }
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that configured values are usable.
fn validate_config(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.engine.store_dir.as_os_str().is_empty() {
        return Err(ConfigError::MissingField("engine.store_dir".to_string()));
    }
    if matches!(&config.engine.tool_version, Some(v) if v.is_empty()) {
        return Err(ConfigError::MissingField("engine.tool_version".to_string()));
    }
    Ok(())
}
