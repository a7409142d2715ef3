//! Graph builder: operator constructors.
//!
//! Each constructor validates its operands, computes the forward value and
//! records the output node on the tape. Because operands must already be live,
//! every new node lands after all of its tape-resident predecessors.

use crate::engine::Engine;
use crate::error::Result;
use crate::node::{NodeRef, Op};
use crate::ops;

impl Engine {
    /// Record a constant or input value on the tape.
    pub fn leaf(&mut self, data: f64) -> Result<NodeRef> {
        self.tape.allocate(data, Op::Leaf)
    }

    /// Validate operands, compute the forward value and record the node.
    fn record(&mut self, op: Op) -> Result<NodeRef> {
        for operand in op.predecessors().into_iter().flatten() {
            self.check(operand)?;
        }
        let data = ops::forward(&op, |r| self.slot(r).data);
        self.tape.allocate(data, op)
    }

    /// `a + b`
    pub fn add(&mut self, a: NodeRef, b: NodeRef) -> Result<NodeRef> {
        self.record(Op::Add(a, b))
    }

    /// `a - b`
    pub fn sub(&mut self, a: NodeRef, b: NodeRef) -> Result<NodeRef> {
        self.record(Op::Sub(a, b))
    }

    /// `a * b`
    pub fn mul(&mut self, a: NodeRef, b: NodeRef) -> Result<NodeRef> {
        self.record(Op::Mul(a, b))
    }

    /// `a ^ n` for a constant exponent.
    ///
    /// The exponent is recorded as a leaf first, so this allocates two nodes.
    pub fn pow(&mut self, a: NodeRef, n: f64) -> Result<NodeRef> {
        self.check(a)?;
        let exponent = self.leaf(n)?;
        self.record(Op::Pow { base: a, exponent })
    }

    /// `a / b`, recorded as `a * b^-1`.
    ///
    /// Allocates three nodes: the exponent leaf, the reciprocal and the product.
    pub fn div(&mut self, a: NodeRef, b: NodeRef) -> Result<NodeRef> {
        self.check(a)?;
        let reciprocal = self.pow(b, -1.0)?;
        self.mul(a, reciprocal)
    }

    /// `a / b` as a single division node.
    pub fn true_div(&mut self, a: NodeRef, b: NodeRef) -> Result<NodeRef> {
        self.record(Op::Div(a, b))
    }

    /// `e^a`
    pub fn exp(&mut self, a: NodeRef) -> Result<NodeRef> {
        self.record(Op::Exp(a))
    }

    /// Hyperbolic tangent.
    pub fn tanh(&mut self, a: NodeRef) -> Result<NodeRef> {
        self.record(Op::Tanh(a))
    }

    /// `max(a, 0)`
    pub fn relu(&mut self, a: NodeRef) -> Result<NodeRef> {
        self.record(Op::Relu(a))
    }
}
