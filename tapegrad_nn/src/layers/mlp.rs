//! Multi-layer perceptron.

use rand::Rng;
use tapegrad_core::{Engine, NodeRef, Result};

use super::Layer;
use crate::activations::Activation;

/// Stack of fully connected layers.
///
/// Hidden layers use tanh; the final layer is linear.
#[derive(Debug, Clone)]
pub struct Mlp {
    pub layers: Vec<Layer>,
}

impl Mlp {
    /// Build an MLP taking `input_dim` inputs with one layer per entry of
    /// `layer_dims`.
    ///
    /// # Example
    /// ```
    /// use rand::SeedableRng;
    /// use tapegrad_core::Engine;
    /// use tapegrad_nn::Mlp;
    ///
    /// let mut engine = Engine::with_capacity(256);
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    /// let mlp = Mlp::new(&mut engine, 2, &[4, 1], &mut rng);
    ///
    /// // (2 + 1) * 4 + (4 + 1) * 1
    /// assert_eq!(mlp.parameters().len(), 17);
    /// ```
    pub fn new<R: Rng + ?Sized>(
        engine: &mut Engine,
        input_dim: usize,
        layer_dims: &[usize],
        rng: &mut R,
    ) -> Self {
        let mut layers = Vec::with_capacity(layer_dims.len());
        let mut nin = input_dim;
        for (i, &nout) in layer_dims.iter().enumerate() {
            let activation = if i + 1 == layer_dims.len() {
                Activation::Identity
            } else {
                Activation::Tanh
            };
            layers.push(Layer::new(engine, nin, nout, activation, rng));
            nin = nout;
        }
        log::debug!(
            "built mlp {} -> {:?} with {} parameters",
            input_dim,
            layer_dims,
            engine.parameter_store().len()
        );
        Mlp { layers }
    }

    /// Forward pass through every layer.
    pub fn forward(&self, engine: &mut Engine, x: &[NodeRef]) -> Result<Vec<NodeRef>> {
        let mut activations = x.to_vec();
        for layer in &self.layers {
            activations = layer.forward(engine, &activations)?;
        }
        Ok(activations)
    }

    pub fn parameters(&self) -> Vec<NodeRef> {
        self.layers.iter().flat_map(Layer::parameters).collect()
    }
}
