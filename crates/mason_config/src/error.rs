//! Error types for configuration loading.

/// Errors that can occur while loading or validating `mason.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML.
    #[error("failed to parse mason.toml: {0}")]
    Parse(String),

    /// A required field is missing or empty.
    #[error("missing or empty configuration field: {0}")]
    MissingField(String),
}
