//! Error types for graph evaluation and build-info decoding.

/// Errors that can occur while evaluating nodes or computing signatures.
///
/// Failures propagate unmodified up the dependency chain: if a source cannot
/// produce its contents or its build action fails, every dependent node's
/// own computation fails with the same error rather than substituting a
/// placeholder.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GraphError {
    /// A node's build action returned an error.
    #[error("build action for `{node}` failed: {reason}")]
    Action {
        /// Display name of the node whose action failed.
        node: String,
        /// Description of the failure.
        reason: String,
    },

    /// A node could not produce its signature-form contents.
    #[error("contents of `{node}` are unavailable: {reason}")]
    Contents {
        /// Display name of the node.
        node: String,
        /// Description of the failure.
        reason: String,
    },
}

/// Errors raised while decoding a persisted build-info record.
///
/// The embedded version id is always checked before any field is trusted.
/// Callers treat any of these errors as "never built" rather than
/// interpreting mismatched fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InfoError {
    /// The record was written by a schema this build does not understand.
    #[error("build info version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The schema version this build reads and writes.
        expected: u32,
        /// The version id found in the record.
        actual: u32,
    },

    /// A record of a known version is missing a declared field.
    #[error("build info record v{version} is missing field `{field}`")]
    MissingField {
        /// The version id found in the record.
        version: u32,
        /// Name of the missing field.
        field: &'static str,
    },
}
