//! Activation functions.

use tapegrad_core::{Engine, NodeRef, Result};

/// Nonlinearity applied to a neuron's pre-activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    /// No activation; used on output layers.
    #[default]
    Identity,
    Tanh,
    Relu,
}

impl Activation {
    /// Apply the activation, recording at most one node.
    pub fn apply(&self, engine: &mut Engine, x: NodeRef) -> Result<NodeRef> {
        match self {
            Activation::Identity => Ok(x),
            Activation::Tanh => engine.tanh(x),
            Activation::Relu => engine.relu(x),
        }
    }
}

/// ReLU activation: max(0, x)
pub fn relu(engine: &mut Engine, x: NodeRef) -> Result<NodeRef> {
    engine.relu(x)
}

/// Tanh activation: tanh(x)
pub fn tanh(engine: &mut Engine, x: NodeRef) -> Result<NodeRef> {
    engine.tanh(x)
}
