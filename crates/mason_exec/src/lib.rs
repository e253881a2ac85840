//! Command-line overflow handling.
//!
//! Some platforms limit the length of a command line. When an expanded
//! command exceeds the configured maximum, its arguments are written to a
//! temporary file and the invocation is rewritten to pass that file instead.
//! This sits in front of process execution and shares the per-node caching
//! discipline of the engine core: the same overflowed command is
//! materialized once per target and reused afterwards.

#![warn(missing_docs)]

pub mod error;
pub mod escape;
pub mod spill;

pub use error::ExecError;
pub use escape::{posix_escape, ArgEscape};
pub use spill::{CommandSpiller, SpillConfig};
