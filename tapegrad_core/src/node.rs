//! Core data structures for the computation graph.
//!
//! A graph is a set of plain-data [`Node`]s living either on the arena tape
//! (transient) or in the parameter store (persistent). Nodes point at their
//! operands through [`NodeRef`] handles, which are small `Copy` values carrying
//! the generation of the arena that issued them.

/// Where a node lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Link {
    /// Position on the tape (the node's creation index).
    Tape(usize),
    /// Slot in the parameter store.
    Param(usize),
}

/// Handle to a node on the tape or in the parameter store.
///
/// Handles are only valid for the generation that issued them: a tape handle
/// dies on [`Engine::reset`](crate::Engine::reset), a parameter handle on
/// [`Engine::release_parameters`](crate::Engine::release_parameters). Using a
/// dead handle yields [`Error::StaleTapeReference`](crate::Error::StaleTapeReference)
/// or [`Error::StaleParameterReference`](crate::Error::StaleParameterReference).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub(crate) link: Link,
    pub(crate) generation: u64,
}

impl NodeRef {
    pub(crate) fn tape(index: usize, generation: u64) -> Self {
        NodeRef {
            link: Link::Tape(index),
            generation,
        }
    }

    pub(crate) fn param(slot: usize, generation: u64) -> Self {
        NodeRef {
            link: Link::Param(slot),
            generation,
        }
    }

    /// Position on the tape, or `None` for parameters.
    pub fn creation_index(&self) -> Option<usize> {
        match self.link {
            Link::Tape(index) => Some(index),
            Link::Param(_) => None,
        }
    }

    /// Check if this handle refers to a trainable parameter.
    pub fn is_parameter(&self) -> bool {
        matches!(self.link, Link::Param(_))
    }
}

/// The operation that produced a node, together with its operands.
///
/// Operands live inside the variant, so a gradient rule can never run with a
/// missing predecessor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Op {
    /// Constant, input or parameter. Propagates nothing.
    Leaf,
    Add(NodeRef, NodeRef),
    Sub(NodeRef, NodeRef),
    Mul(NodeRef, NodeRef),
    Div(NodeRef, NodeRef),
    /// `base ^ exponent`; the exponent node is a constant leaf and is not differentiated.
    Pow { base: NodeRef, exponent: NodeRef },
    Exp(NodeRef),
    Tanh(NodeRef),
    Relu(NodeRef),
}

impl Op {
    pub(crate) fn kind(&self) -> OpKind {
        match self {
            Op::Leaf => OpKind::Leaf,
            Op::Add(..) => OpKind::Add,
            Op::Sub(..) => OpKind::Sub,
            Op::Mul(..) => OpKind::Mul,
            Op::Div(..) => OpKind::Div,
            Op::Pow { .. } => OpKind::Pow,
            Op::Exp(_) => OpKind::Exp,
            Op::Tanh(_) => OpKind::Tanh,
            Op::Relu(_) => OpKind::Relu,
        }
    }

    /// Operands in order: `[left, right]` for binary ops, `[input, None]` for unary.
    pub(crate) fn predecessors(&self) -> [Option<NodeRef>; 2] {
        match *self {
            Op::Leaf => [None, None],
            Op::Add(l, r) | Op::Sub(l, r) | Op::Mul(l, r) | Op::Div(l, r) => [Some(l), Some(r)],
            Op::Pow { base, exponent } => [Some(base), Some(exponent)],
            Op::Exp(x) | Op::Tanh(x) | Op::Relu(x) => [Some(x), None],
        }
    }
}

/// Operator kind of a node, without its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Leaf,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Exp,
    Tanh,
    Relu,
}

impl OpKind {
    /// Number of predecessors a node of this kind links to.
    pub fn arity(&self) -> usize {
        match self {
            OpKind::Leaf => 0,
            OpKind::Exp | OpKind::Tanh | OpKind::Relu => 1,
            OpKind::Add | OpKind::Sub | OpKind::Mul | OpKind::Div | OpKind::Pow => 2,
        }
    }
}

/// One scalar in the graph: its value, accumulated gradient and producing op.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub(crate) data: f64,
    pub(crate) grad: f64,
    pub(crate) op: Op,
    pub(crate) creation_index: Option<usize>,
}

impl Node {
    pub(crate) fn new(data: f64, op: Op, creation_index: Option<usize>) -> Self {
        Node {
            data,
            grad: 0.0,
            op,
            creation_index,
        }
    }

    /// Forward value.
    pub fn data(&self) -> f64 {
        self.data
    }

    /// Accumulated gradient of the last backward root with respect to this node.
    pub fn grad(&self) -> f64 {
        self.grad
    }

    /// Which local-gradient rule applies.
    pub fn kind(&self) -> OpKind {
        self.op.kind()
    }

    /// Position on the tape, or `None` for parameters.
    pub fn creation_index(&self) -> Option<usize> {
        self.creation_index
    }

    /// Check if this node has no predecessors.
    pub fn is_leaf(&self) -> bool {
        matches!(self.op, Op::Leaf)
    }

    /// Handles of the operands this node was computed from.
    pub fn predecessors(&self) -> impl Iterator<Item = NodeRef> {
        self.op.predecessors().into_iter().flatten()
    }
}
