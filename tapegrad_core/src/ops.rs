//! Forward values and local gradients for each operation.
//!
//! Both functions take a `value_of` lookup so they work the same whether an
//! operand lives on the tape or in the parameter store.

use crate::node::{NodeRef, Op};

/// Contributions of one node to its predecessors: `(predecessor, d(out)/d(pred))`.
pub(crate) type LocalGradients = [Option<(NodeRef, f64)>; 2];

/// Compute the forward value of `op`.
pub(crate) fn forward(op: &Op, value_of: impl Fn(NodeRef) -> f64) -> f64 {
    match *op {
        Op::Leaf => unreachable!("leaves carry their own value"),
        Op::Add(a, b) => value_of(a) + value_of(b),
        Op::Sub(a, b) => value_of(a) - value_of(b),
        Op::Mul(a, b) => value_of(a) * value_of(b),
        Op::Div(a, b) => value_of(a) / value_of(b),
        Op::Pow { base, exponent } => value_of(base).powf(value_of(exponent)),
        Op::Exp(x) => value_of(x).exp(),
        Op::Tanh(x) => value_of(x).tanh(),
        Op::Relu(x) => {
            let x = value_of(x);
            if x > 0.0 {
                x
            } else {
                0.0
            }
        }
    }
}

/// Compute local gradients for a node with forward value `out`.
///
/// The caller multiplies each local gradient by the node's own `grad` and
/// accumulates the product into the predecessor.
pub(crate) fn local_gradients(op: &Op, out: f64, value_of: impl Fn(NodeRef) -> f64) -> LocalGradients {
    match *op {
        Op::Leaf => [None, None],

        Op::Add(a, b) => {
            // z = a + b
            // dz/da = 1, dz/db = 1
            [Some((a, 1.0)), Some((b, 1.0))]
        }

        Op::Sub(a, b) => {
            // z = a - b
            // dz/da = 1, dz/db = -1
            [Some((a, 1.0)), Some((b, -1.0))]
        }

        Op::Mul(a, b) => {
            // z = a * b
            // dz/da = b, dz/db = a
            [Some((a, value_of(b))), Some((b, value_of(a)))]
        }

        Op::Div(a, b) => {
            // z = a / b
            // dz/da = 1/b, dz/db = -a/b^2
            let a_val = value_of(a);
            let b_val = value_of(b);
            [Some((a, 1.0 / b_val)), Some((b, -a_val / (b_val * b_val)))]
        }

        Op::Pow { base, exponent } => {
            // z = a^n (n is a constant leaf)
            // dz/da = n * a^(n-1)
            let n = value_of(exponent);
            [Some((base, n * value_of(base).powf(n - 1.0))), None]
        }

        Op::Exp(x) => {
            // z = exp(a)
            // dz/da = exp(a) = z
            [Some((x, out)), None]
        }

        Op::Tanh(x) => {
            // z = tanh(a)
            // dz/da = 1 - z^2
            [Some((x, 1.0 - out * out)), None]
        }

        Op::Relu(x) => {
            // z = max(a, 0)
            // dz/da = 1 if a > 0 else 0
            let local = if value_of(x) > 0.0 { 1.0 } else { 0.0 };
            [Some((x, local)), None]
        }
    }
}
