//! The engine session: one tape plus one parameter store.
//!
//! All graph construction, differentiation and parameter updates go through an
//! [`Engine`] value owned by the caller. Engines share no state, so independent
//! sessions can run side by side (including on different threads).

use log::debug;

use crate::error::Result;
use crate::node::{Link, Node, NodeRef};
use crate::params::ParameterStore;
use crate::tape::Tape;

/// Tape capacity used by [`Engine::new`].
pub const DEFAULT_TAPE_CAPACITY: usize = 1_000_000;

/// Construction-time settings for an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of transient nodes alive between two resets.
    pub tape_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            tape_capacity: DEFAULT_TAPE_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn with_tape_capacity(mut self, tape_capacity: usize) -> Self {
        self.tape_capacity = tape_capacity;
        self
    }
}

/// A caller-owned autodiff session.
#[derive(Debug, Clone)]
pub struct Engine {
    pub(crate) tape: Tape,
    pub(crate) params: ParameterStore,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an engine with [`DEFAULT_TAPE_CAPACITY`].
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine whose tape holds at most `tape_capacity` nodes.
    pub fn with_capacity(tape_capacity: usize) -> Self {
        Self::with_config(EngineConfig::default().with_tape_capacity(tape_capacity))
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Engine {
            tape: Tape::with_capacity(config.tape_capacity),
            params: ParameterStore::new(),
        }
    }

    // === Accessors ===

    /// The arena tape.
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// The parameter store.
    pub fn parameter_store(&self) -> &ParameterStore {
        &self.params
    }

    /// Number of live tape nodes.
    pub fn tape_len(&self) -> usize {
        self.tape.len()
    }

    pub fn tape_capacity(&self) -> usize {
        self.tape.capacity()
    }

    /// Handles to every parameter, in creation order.
    pub fn parameters(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.params.handles()
    }

    /// Read-only view of a live node.
    pub fn node(&self, node: NodeRef) -> Result<&Node> {
        match node.link {
            Link::Tape(_) => self.tape.resolve(node).map(|i| self.tape.node(i)),
            Link::Param(_) => self.params.resolve(node).map(|s| self.params.node(s)),
        }
    }

    /// Forward value of a live node.
    pub fn data(&self, node: NodeRef) -> Result<f64> {
        self.node(node).map(Node::data)
    }

    /// Accumulated gradient of a live node.
    pub fn grad(&self, node: NodeRef) -> Result<f64> {
        self.node(node).map(Node::grad)
    }

    /// Check that a handle is still live.
    pub(crate) fn check(&self, node: NodeRef) -> Result<()> {
        self.node(node).map(|_| ())
    }

    /// Lookup without generation checks, for links stored inside live nodes.
    pub(crate) fn slot(&self, node: NodeRef) -> &Node {
        match node.link {
            Link::Tape(index) => self.tape.node(index),
            Link::Param(slot) => self.params.node(slot),
        }
    }

    pub(crate) fn slot_mut(&mut self, node: NodeRef) -> &mut Node {
        match node.link {
            Link::Tape(index) => self.tape.node_mut(index),
            Link::Param(slot) => self.params.node_mut(slot),
        }
    }

    // === Parameters ===

    /// Create a trainable parameter. Parameters do not count against the tape capacity.
    pub fn parameter(&mut self, initial: f64) -> NodeRef {
        self.params.create_parameter(initial)
    }

    /// Overwrite a parameter's value.
    pub fn set_parameter(&mut self, node: NodeRef, data: f64) -> Result<()> {
        self.params.set_data(node, data)
    }

    /// Plain gradient descent over every parameter.
    pub fn apply_gradient_step(&mut self, learning_rate: f64) {
        self.params.apply_gradient_step(learning_rate);
    }

    // === Zeroing ===

    /// Zero parameter gradients only.
    pub fn zero_parameter_gradients(&mut self) {
        self.params.zero_gradients();
    }

    /// Zero parameter gradients and the gradient of every live tape node.
    ///
    /// Needed before re-running backward on a graph kept with `retain_graph`.
    pub fn zero_all_gradients(&mut self) {
        self.params.zero_gradients();
        self.tape.zero_gradients();
    }

    // === Lifecycle ===

    /// Drop every transient node in O(1). Parameters are untouched.
    pub fn reset(&mut self) {
        self.tape.reset();
    }

    /// Drop every parameter.
    ///
    /// Tape nodes may link to the released parameters, so the tape is reset too.
    pub fn release_parameters(&mut self) {
        debug!("releasing parameters and tape");
        self.tape.reset();
        self.params.release_all();
    }
}
