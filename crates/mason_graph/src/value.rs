//! Computed-value nodes.
//!
//! A value node represents an in-memory value rather than a filesystem
//! artifact: values passed on the command line, generated by a script, or
//! computed by a build action. Value nodes live outside the filesystem and
//! are exempt from working-directory locality rules.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::GraphError;
use crate::node::{Node, NodeCore, NodeState};

/// An in-memory value carried by a [`ValueNode`].
///
/// Scalar values can serve as memoization keys; composite values cannot
/// (see [`NodeValue::is_memoizable`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeValue {
    /// A text value.
    Str(String),
    /// An integer value.
    Int(i64),
    /// A boolean value.
    Bool(bool),
    /// A composite value.
    List(Vec<NodeValue>),
}

impl NodeValue {
    /// Returns `true` if the value can serve as a memoization key.
    ///
    /// Composite values are excluded: sharing one node across callers that
    /// may hold or mutate distinct structures is unsafe, so the registry
    /// constructs a fresh node for them instead. This is a deliberate
    /// fallback, not an error.
    pub fn is_memoizable(&self) -> bool {
        !matches!(self, NodeValue::List(_))
    }

    /// Returns the plain, unquoted text form used in signature computation.
    ///
    /// This form must be exact and stable; it is never used for display.
    pub fn signature_text(&self) -> String {
        match self {
            NodeValue::Str(s) => s.clone(),
            NodeValue::Int(i) => i.to_string(),
            NodeValue::Bool(b) => b.to_string(),
            NodeValue::List(items) => {
                let parts: Vec<String> = items.iter().map(NodeValue::signature_text).collect();
                format!("[{}]", parts.join(", "))
            }
        }
    }

    /// Returns the quoted, repr-like text form used for diagnostics.
    ///
    /// This form may be lossy and must never feed signature computation.
    pub fn display_text(&self) -> String {
        match self {
            NodeValue::Str(s) => format!("{s:?}"),
            NodeValue::Int(i) => i.to_string(),
            NodeValue::Bool(b) => b.to_string(),
            NodeValue::List(items) => {
                let parts: Vec<String> = items.iter().map(NodeValue::display_text).collect();
                format!("[{}]", parts.join(", "))
            }
        }
    }
}

impl From<&str> for NodeValue {
    fn from(s: &str) -> Self {
        NodeValue::Str(s.to_string())
    }
}

impl From<String> for NodeValue {
    fn from(s: String) -> Self {
        NodeValue::Str(s)
    }
}

impl From<i64> for NodeValue {
    fn from(i: i64) -> Self {
        NodeValue::Int(i)
    }
}

impl From<bool> for NodeValue {
    fn from(b: bool) -> Self {
        NodeValue::Bool(b)
    }
}

impl From<Vec<NodeValue>> for NodeValue {
    fn from(items: Vec<NodeValue>) -> Self {
        NodeValue::List(items)
    }
}

/// A build action invoked when an unbuilt value node is evaluated.
///
/// Receives the node's input value and produces the derived value.
pub type BuildAction = Box<dyn Fn(&NodeValue) -> Result<NodeValue, GraphError> + Send + Sync>;

/// A node whose content is an in-memory value.
///
/// Owns the original input value, an optional derived value (present up
/// front only when supplied directly), and an optional build action. The
/// display name defaults to the value's signature-form text so the node can
/// stand in as a dependency of other nodes.
pub struct ValueNode {
    core: NodeCore,
    value: NodeValue,
    built: Mutex<Option<NodeValue>>,
    action: Option<BuildAction>,
}

impl ValueNode {
    /// Creates a node for the given value, named after its text form.
    pub fn new(value: impl Into<NodeValue>) -> Self {
        let value = value.into();
        let name = value.signature_text();
        Self {
            core: NodeCore::new(name),
            value,
            built: Mutex::new(None),
            action: None,
        }
    }

    /// Creates a node for the given value with an explicit display name.
    pub fn named(value: impl Into<NodeValue>, name: impl Into<String>) -> Self {
        Self {
            core: NodeCore::new(name),
            value: value.into(),
            built: Mutex::new(None),
            action: None,
        }
    }

    /// Supplies the derived value up front, skipping any build action.
    pub fn with_built_value(mut self, built: impl Into<NodeValue>) -> Self {
        *self.built.get_mut() = Some(built.into());
        self
    }

    /// Attaches a build action that produces the derived value.
    pub fn with_action(mut self, action: BuildAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Wraps the node in a shared handle.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Returns the original input value.
    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    /// Returns `true` if a derived value is present.
    pub fn has_built_value(&self) -> bool {
        self.built.lock().is_some()
    }

    /// Sets the derived value directly.
    pub fn write(&self, built: impl Into<NodeValue>) {
        *self.built.lock() = Some(built.into());
    }

    /// Returns the derived value, evaluating the node if necessary.
    ///
    /// If a completed evaluation produced no derived value, the node
    /// resolves to its own input value: a value with no build action builds
    /// to itself. This default is specific to value nodes and applies only
    /// once evaluation has finished; a node stuck mid-evaluation (a failed
    /// action, or re-entry before the action completed) has no result yet
    /// and reading it is an error, never a silent fallback to the input.
    pub fn read(&self) -> Result<NodeValue, GraphError> {
        self.build()?;
        let mut built = self.built.lock();
        if let Some(value) = &*built {
            return Ok(value.clone());
        }
        if self.core.state() != NodeState::Evaluated {
            return Err(GraphError::Contents {
                node: self.core.name().to_string(),
                reason: "evaluation did not complete".to_string(),
            });
        }
        Ok(built.insert(self.value.clone()).clone())
    }
}

impl Node for ValueNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    /// Signature-form contents are derived from the input value, not the
    /// derived value: the derived value is assumed to be a deterministic
    /// product of the inputs and need not exist yet when a dependent asks
    /// for contents.
    fn raw_contents(&self) -> Result<String, GraphError> {
        Ok(self.value.signature_text())
    }

    fn display_contents(&self) -> String {
        self.value.display_text()
    }

    fn build(&self) -> Result<(), GraphError> {
        match self.core.begin_evaluation() {
            NodeState::Evaluated => return Ok(()),
            // Re-entry is a no-op here; the graph walker distinguishes
            // legitimate re-entry from a cycle by reading the state.
            NodeState::Evaluating => return Ok(()),
            NodeState::Unevaluated => {}
        }
        if !self.has_built_value() {
            if let Some(action) = &self.action {
                tracing::trace!(node = %self.core.name(), "running build action");
                let produced = action(&self.value)?;
                *self.built.lock() = Some(produced);
            }
        }
        self.core.finish_evaluation();
        Ok(())
    }

    fn is_under(&self, _dir: &Path) -> bool {
        // Value nodes are outside the filesystem and get built regardless
        // of the directory the build was started from.
        true
    }
}
