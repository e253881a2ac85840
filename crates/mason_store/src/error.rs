//! Error types for store operations.

use std::path::PathBuf;

use mason_graph::GraphError;

/// Errors that can occur while writing the build-info store.
///
/// Loading is fail-safe and never returns these; they surface only from
/// operations that must not fail silently, such as saving and recording.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O error occurred while writing store files.
    #[error("store I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A serialization error occurred.
    #[error("store serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// Recording a node failed because its signature could not be computed.
    #[error(transparent)]
    Graph(#[from] GraphError),
}
