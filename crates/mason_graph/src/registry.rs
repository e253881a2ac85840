//! Memoizing registry for value nodes.
//!
//! Structurally identical values must resolve to one shared node instance so
//! that signature computation and result sharing agree across the build.
//! The registry is an explicit, injectable object owned by the build-run
//! context rather than a process-wide global, so tests can construct
//! independent registries and long-lived host processes can reset between
//! runs.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::value::{NodeValue, ValueNode};

/// Memoization key: the value together with its optional explicit name.
#[derive(PartialEq, Eq, Hash)]
struct MemoKey {
    value: NodeValue,
    name: Option<String>,
}

/// Memoizing factory for [`ValueNode`]s.
///
/// Populated lazily; entries live for the lifetime of the registry and are
/// never pruned mid-run. Memory is traded for correctness of sharing.
#[derive(Default)]
pub struct ValueRegistry {
    nodes: Mutex<HashMap<MemoKey, Arc<ValueNode>>>,
}

impl ValueRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared node for `(value, name)`, constructing it on
    /// first request.
    ///
    /// Memoization is bypassed in two cases, both yielding a fresh node:
    ///
    /// - `built_value` is supplied. A node carrying a precomputed result is
    ///   tied to that result and is not safely sharable.
    /// - the value is not memoizable (composite values). See
    ///   [`NodeValue::is_memoizable`].
    ///
    /// The lookup is serialized internally, so concurrent calls for the
    /// same key observe exactly one instance.
    pub fn get_or_create(
        &self,
        value: impl Into<NodeValue>,
        built_value: Option<NodeValue>,
        name: Option<&str>,
    ) -> Arc<ValueNode> {
        let value = value.into();

        if let Some(built) = built_value {
            return Arc::new(Self::make_node(value, name).with_built_value(built));
        }

        if !value.is_memoizable() {
            return Arc::new(Self::make_node(value, name));
        }

        let key = MemoKey {
            value: value.clone(),
            name: name.map(str::to_string),
        };
        let mut nodes = self.nodes.lock();
        Arc::clone(
            nodes
                .entry(key)
                .or_insert_with(|| Arc::new(Self::make_node(value, name))),
        )
    }

    /// Returns the number of memoized nodes.
    pub fn len(&self) -> usize {
        self.nodes.lock().len()
    }

    /// Returns `true` if no nodes have been memoized.
    pub fn is_empty(&self) -> bool {
        self.nodes.lock().is_empty()
    }

    /// Drops every memoized node handle.
    ///
    /// Intended for long-lived host processes between runs; a registry is
    /// never reset mid-run.
    pub fn reset(&self) {
        self.nodes.lock().clear();
    }

    fn make_node(value: NodeValue, name: Option<&str>) -> ValueNode {
        match name {
            Some(name) => ValueNode::named(value, name),
            None => ValueNode::new(value),
        }
    }
}
