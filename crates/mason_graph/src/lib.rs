//! Dependency-graph core for the Mason build engine.
//!
//! This crate decides, for every buildable entity, whether it is already up
//! to date or must be rebuilt. Nodes combine their own content with the
//! signatures of their ordered dependencies into a content signature, which
//! is compared against the record persisted by a prior run. The crate also
//! provides the computed-value node variant and the memoizing registry that
//! guarantees one shared node instance per distinct (value, name) pair.

#![warn(missing_docs)]

pub mod build_info;
pub mod error;
pub mod node;
pub mod registry;
pub mod value;

pub use build_info::{BuildInfo, BuildInfoWire, CURRENT_VERSION};
pub use error::{GraphError, InfoError};
pub use node::{Node, NodeCore, NodeRef, NodeState};
pub use registry::ValueRegistry;
pub use value::{BuildAction, NodeValue, ValueNode};
