//! A layer of independent neurons sharing one input vector.

use rand::Rng;
use tapegrad_core::{Engine, NodeRef, Result};

use super::Neuron;
use crate::activations::Activation;

/// `nout` neurons, each reading all `nin` inputs.
#[derive(Debug, Clone)]
pub struct Layer {
    pub neurons: Vec<Neuron>,
}

impl Layer {
    pub fn new<R: Rng + ?Sized>(
        engine: &mut Engine,
        nin: usize,
        nout: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        let neurons = (0..nout)
            .map(|_| Neuron::new(engine, nin, activation, rng))
            .collect();
        Layer { neurons }
    }

    pub fn nin(&self) -> usize {
        self.neurons.first().map_or(0, Neuron::nin)
    }

    pub fn nout(&self) -> usize {
        self.neurons.len()
    }

    /// Forward pass: one output per neuron, in neuron order.
    pub fn forward(&self, engine: &mut Engine, x: &[NodeRef]) -> Result<Vec<NodeRef>> {
        self.neurons.iter().map(|n| n.forward(engine, x)).collect()
    }

    pub fn parameters(&self) -> Vec<NodeRef> {
        self.neurons.iter().flat_map(Neuron::parameters).collect()
    }
}
