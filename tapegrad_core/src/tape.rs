//! Fixed-capacity arena holding transient nodes in creation order.
//!
//! Nodes are appended at the high-water mark and never removed individually.
//! [`Tape::reset`] drops the mark back to zero in O(1) and bumps the
//! generation; storage is kept and overwritten by later allocations.

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::node::{Link, Node, NodeRef, Op};

/// Append-only arena of transient nodes.
#[derive(Debug, Clone)]
pub struct Tape {
    /// Backing storage. Slots at or past `len` hold garbage from earlier generations.
    nodes: Vec<Node>,
    /// High-water mark: number of live nodes.
    len: usize,
    /// Maximum number of live nodes.
    capacity: usize,
    /// Bumped on every reset; handles from older generations are rejected.
    generation: u64,
}

impl Tape {
    /// Create an empty tape that holds at most `capacity` nodes.
    ///
    /// Storage grows on demand up to `capacity` and is then reused across resets.
    pub fn with_capacity(capacity: usize) -> Self {
        Tape {
            nodes: Vec::new(),
            len: 0,
            capacity,
            generation: 0,
        }
    }

    /// Number of live nodes (the high-water mark).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no nodes have been recorded since the last reset.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of live nodes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Record a node at the high-water mark.
    ///
    /// Every operand in `op` must already be live, so the new node's creation
    /// index is larger than that of any tape-resident predecessor.
    pub(crate) fn allocate(&mut self, data: f64, op: Op) -> Result<NodeRef> {
        if self.len == self.capacity {
            warn!("tape full at {} nodes", self.capacity);
            return Err(Error::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        let index = self.len;
        let node = Node::new(data, op, Some(index));
        if index < self.nodes.len() {
            self.nodes[index] = node;
        } else {
            self.nodes.push(node);
        }
        self.len += 1;

        Ok(NodeRef::tape(index, self.generation))
    }

    /// Invalidate every node in O(1).
    pub fn reset(&mut self) {
        debug!(
            "tape reset: {} nodes dropped, generation {} -> {}",
            self.len,
            self.generation,
            self.generation + 1
        );
        self.len = 0;
        self.generation += 1;
    }

    /// Map a handle to a live tape index.
    pub(crate) fn resolve(&self, node: NodeRef) -> Result<usize> {
        match node.link {
            Link::Tape(index) if node.generation == self.generation && index < self.len => {
                Ok(index)
            }
            Link::Tape(index) => Err(Error::StaleTapeReference {
                index,
                generation: node.generation,
                current: self.generation,
            }),
            Link::Param(_) => unreachable!("parameter handle passed to the tape"),
        }
    }

    /// Live node at `index`. Panics past the high-water mark.
    pub(crate) fn node(&self, index: usize) -> &Node {
        &self.live()[index]
    }

    pub(crate) fn node_mut(&mut self, index: usize) -> &mut Node {
        &mut self.live_mut()[index]
    }

    /// All live nodes, in creation order.
    pub fn live(&self) -> &[Node] {
        &self.nodes[..self.len]
    }

    pub(crate) fn live_mut(&mut self) -> &mut [Node] {
        &mut self.nodes[..self.len]
    }

    /// Zero the gradient of every live node, indices `[0, len)`.
    pub fn zero_gradients(&mut self) {
        for node in self.live_mut() {
            node.grad = 0.0;
        }
    }
}
