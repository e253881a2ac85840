//! Persistence of build-info records between runs.
//!
//! Records are stored in a single file keyed by node identity, with a
//! binary header carrying magic bytes, a format version, the tool version,
//! and a payload checksum. All reads are fail-safe: corruption or
//! incompatibility yields an empty store and therefore a full rebuild,
//! never a hard failure.

#![warn(missing_docs)]

pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::BuildInfoStore;
