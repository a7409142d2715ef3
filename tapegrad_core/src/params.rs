//! Persistent trainable nodes.
//!
//! Parameters live outside the tape, so they survive any number of tape resets.
//! They are only ever leaves: operators read them, gradients flow into them,
//! and [`ParameterStore::apply_gradient_step`] updates them in place.

use log::debug;

use crate::error::{Error, Result};
use crate::node::{Link, Node, NodeRef, Op};

/// Owned, ordered collection of trainable parameters.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    nodes: Vec<Node>,
    /// Bumped by `release_all`; handles from older generations are rejected.
    generation: u64,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live parameters.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Add a parameter with zero gradient.
    pub fn create_parameter(&mut self, initial: f64) -> NodeRef {
        let slot = self.nodes.len();
        self.nodes.push(Node::new(initial, Op::Leaf, None));
        NodeRef::param(slot, self.generation)
    }

    /// Map a handle to a live slot.
    pub(crate) fn resolve(&self, node: NodeRef) -> Result<usize> {
        match node.link {
            Link::Param(slot) if node.generation == self.generation && slot < self.nodes.len() => {
                Ok(slot)
            }
            Link::Param(slot) => Err(Error::StaleParameterReference {
                slot,
                generation: node.generation,
                current: self.generation,
            }),
            Link::Tape(_) => unreachable!("tape handle passed to the parameter store"),
        }
    }

    pub(crate) fn node(&self, slot: usize) -> &Node {
        &self.nodes[slot]
    }

    pub(crate) fn node_mut(&mut self, slot: usize) -> &mut Node {
        &mut self.nodes[slot]
    }

    /// Handles to every live parameter, in creation order.
    pub fn handles(&self) -> impl Iterator<Item = NodeRef> + '_ {
        (0..self.nodes.len()).map(move |slot| NodeRef::param(slot, self.generation))
    }

    /// Overwrite a parameter's value, e.g. when loading weights.
    pub fn set_data(&mut self, node: NodeRef, data: f64) -> Result<()> {
        let slot = self.resolve(node)?;
        self.nodes[slot].data = data;
        Ok(())
    }

    pub fn zero_gradients(&mut self) {
        for node in &mut self.nodes {
            node.grad = 0.0;
        }
    }

    /// Plain gradient descent: `data -= learning_rate * grad` for every parameter.
    pub fn apply_gradient_step(&mut self, learning_rate: f64) {
        for node in &mut self.nodes {
            node.data -= learning_rate * node.grad;
        }
    }

    /// Drop every parameter. Outstanding handles become stale.
    pub fn release_all(&mut self) {
        debug!(
            "released {} parameters, generation {} -> {}",
            self.nodes.len(),
            self.generation,
            self.generation + 1
        );
        self.nodes.clear();
        self.generation += 1;
    }
}
