//! Error types for command spilling.

/// Errors that can occur while spilling a command line to a file.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The argument file could not be created or written.
    #[error("failed to write argument file for `{target}`: {source}")]
    ArgFile {
        /// Identity of the target node the command builds.
        target: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
