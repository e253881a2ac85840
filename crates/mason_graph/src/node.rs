//! The abstract node model, signature computation, and up-to-date decision.
//!
//! A node is one buildable or referenceable entity in the dependency graph.
//! This module defines the shared bookkeeping every variant carries
//! ([`NodeCore`]) and the [`Node`] trait whose provided methods implement the
//! signature and staleness algorithms. Variants supply only their own raw
//! content, display form, and build behavior.

use std::path::Path;
use std::sync::Arc;

use mason_common::Signature;
use parking_lot::Mutex;

use crate::build_info::BuildInfo;
use crate::error::GraphError;

/// A shared handle to a node in the dependency graph.
///
/// Nodes are jointly owned by the registry and every caller that received
/// them; no caller may assume exclusive ownership.
pub type NodeRef = Arc<dyn Node>;

/// Evaluation status of a node within one build run.
///
/// Transitions are forward-only: `Unevaluated` to `Evaluating` to
/// `Evaluated`, with no reverse transitions within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// No evaluation has been requested yet.
    Unevaluated,

    /// Evaluation has started and not yet finished. Observing this state
    /// from outside an evaluation call indicates a dependency cycle; cycle
    /// reporting belongs to the surrounding graph walker, which reads this
    /// state through [`Node::state`].
    Evaluating,

    /// Evaluation finished. The derived value is cached for the rest of
    /// the run and further requests are idempotent.
    Evaluated,
}

/// Ordered dependency lists for one node.
#[derive(Default)]
struct NodeDeps {
    /// Declared sources, in declaration order.
    sources: Vec<NodeRef>,

    /// Dependencies discovered by the scanner, appended after the sources.
    implicit: Vec<NodeRef>,
}

/// Per-run signature cache and prior-run record for one node.
#[derive(Default)]
struct InfoSlot {
    /// Signature computed during this run, if any. A recomputation replaces
    /// the cached value wholesale; it is never mutated in place.
    csig: Option<Signature>,

    /// Record persisted by a prior run, installed by the store.
    prev: Option<BuildInfo>,
}

/// Mutable bookkeeping shared by every node variant.
///
/// Holds the display name, the ordered dependency lists, the evaluation
/// state, and the info slot. Each field sits behind its own lock so that
/// distinct nodes can be evaluated from worker threads; evaluation of a
/// single node still requires external mutual exclusion.
pub struct NodeCore {
    name: String,
    deps: Mutex<NodeDeps>,
    state: Mutex<NodeState>,
    info: Mutex<InfoSlot>,
}

impl NodeCore {
    /// Creates the bookkeeping for a node with the given display name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            deps: Mutex::new(NodeDeps::default()),
            state: Mutex::new(NodeState::Unevaluated),
            info: Mutex::new(InfoSlot::default()),
        }
    }

    /// Returns the node's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current evaluation state.
    pub fn state(&self) -> NodeState {
        *self.state.lock()
    }

    /// Marks the node as evaluating and returns the state it was in before.
    ///
    /// Only an `Unevaluated` node actually transitions; callers use the
    /// returned prior state to short-circuit re-entry and idempotent calls.
    pub fn begin_evaluation(&self) -> NodeState {
        let mut state = self.state.lock();
        let prior = *state;
        if prior == NodeState::Unevaluated {
            tracing::trace!(node = %self.name, "evaluation started");
            *state = NodeState::Evaluating;
        }
        prior
    }

    /// Marks the node as evaluated.
    pub fn finish_evaluation(&self) {
        tracing::trace!(node = %self.name, "evaluation finished");
        *self.state.lock() = NodeState::Evaluated;
    }

    /// Appends a declared source dependency.
    pub fn add_source(&self, node: NodeRef) {
        self.deps.lock().sources.push(node);
    }

    /// Appends a scanner-discovered implicit dependency.
    pub fn add_implicit(&self, node: NodeRef) {
        self.deps.lock().implicit.push(node);
    }

    /// Returns the declared sources, in declaration order.
    pub fn sources(&self) -> Vec<NodeRef> {
        self.deps.lock().sources.clone()
    }

    /// Returns all dependencies: declared sources first, then implicit
    /// dependencies, each in declaration order.
    pub fn children(&self) -> Vec<NodeRef> {
        let deps = self.deps.lock();
        deps.sources
            .iter()
            .chain(deps.implicit.iter())
            .cloned()
            .collect()
    }

    /// Returns this run's cached signature, if one has been computed.
    pub fn cached_signature(&self) -> Option<Signature> {
        self.info.lock().csig.clone()
    }

    /// Caches a freshly computed signature, replacing any previous value.
    pub fn store_signature(&self, csig: Signature) {
        self.info.lock().csig = Some(csig);
    }

    /// Returns the record persisted by a prior run, if one was installed.
    pub fn previous_info(&self) -> Option<BuildInfo> {
        self.info.lock().prev.clone()
    }

    /// Installs the record persisted by a prior run.
    pub fn set_previous_info(&self, info: BuildInfo) {
        self.info.lock().prev = Some(info);
    }
}

/// One buildable or referenceable entity in the dependency graph.
///
/// Variants implement the required methods; the provided methods carry the
/// signature and up-to-date algorithms shared by all variants.
pub trait Node: Send + Sync {
    /// Returns the shared bookkeeping for this node.
    fn core(&self) -> &NodeCore;

    /// Returns the node's own content in signature form, excluding
    /// dependencies. The signature form must be exact and stable.
    fn raw_contents(&self) -> Result<String, GraphError>;

    /// Returns a repr-like text form for diagnostics.
    ///
    /// The display form may be ambiguous or lossy and must never be used in
    /// signature computation.
    fn display_contents(&self) -> String;

    /// Runs the node's build action, driving the evaluation state machine.
    fn build(&self) -> Result<(), GraphError>;

    /// Returns `true` if the node lives under the given directory.
    ///
    /// Nodes outside the filesystem are exempt from working-directory
    /// locality and always answer `true`.
    fn is_under(&self, dir: &Path) -> bool;

    /// Returns the node's display name.
    fn name(&self) -> &str {
        self.core().name()
    }

    /// Returns the current evaluation state.
    fn state(&self) -> NodeState {
        self.core().state()
    }

    /// Returns the node's full signature-form text: its own raw contents
    /// followed by each dependency's signature, in declared order.
    ///
    /// A failing dependency fails this computation; no placeholder is
    /// substituted.
    fn text_contents(&self) -> Result<String, GraphError> {
        let mut text = self.raw_contents()?;
        for child in self.core().children() {
            text.push_str(child.signature()?.as_str());
        }
        Ok(text)
    }

    /// Returns the node's content signature, computing and caching it on
    /// first request within a run.
    fn signature(&self) -> Result<Signature, GraphError> {
        if let Some(csig) = self.core().cached_signature() {
            return Ok(csig);
        }
        let csig = Signature::from_text(self.text_contents()?);
        self.core().store_signature(csig.clone());
        Ok(csig)
    }

    /// Precomputes the signature so later requests hit the cache.
    fn make_ready(&self) -> Result<(), GraphError> {
        self.signature().map(|_| ())
    }

    /// Decides whether this node needs rebuilding.
    ///
    /// A node is up to date only if every dependency is itself up to date
    /// and the freshly computed signature matches the record persisted by a
    /// prior run. With no prior record the node is never up to date, so a
    /// first build always executes.
    fn is_up_to_date(&self) -> Result<bool, GraphError> {
        for child in self.core().children() {
            if !child.is_up_to_date()? {
                return Ok(false);
            }
        }
        match self.core().previous_info() {
            Some(prev) => Ok(*prev.csig() == self.signature()?),
            None => Ok(false),
        }
    }
}
