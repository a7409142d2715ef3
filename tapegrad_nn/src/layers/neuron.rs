//! A single neuron: activation(w . x + b).

use rand::Rng;
use tapegrad_core::{Engine, NodeRef, Result};

use crate::activations::Activation;

/// One neuron with `nin` weights and a bias, all engine parameters.
#[derive(Debug, Clone)]
pub struct Neuron {
    pub weights: Vec<NodeRef>,
    pub bias: NodeRef,
    pub activation: Activation,
}

impl Neuron {
    /// Create a neuron with weights uniform in [-0.5, 0.5) and a zero bias.
    pub fn new<R: Rng + ?Sized>(
        engine: &mut Engine,
        nin: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        let weights = (0..nin)
            .map(|_| engine.parameter(rng.gen_range(-0.5..0.5)))
            .collect();
        let bias = engine.parameter(0.0);

        Neuron {
            weights,
            bias,
            activation,
        }
    }

    /// Number of inputs.
    pub fn nin(&self) -> usize {
        self.weights.len()
    }

    /// Forward pass.
    ///
    /// The sum starts from a zero leaf and accumulates `w_i * x_i` in input
    /// order before the bias and activation are applied.
    ///
    /// # Panics
    ///
    /// Panics if `x.len()` differs from [`Neuron::nin`].
    pub fn forward(&self, engine: &mut Engine, x: &[NodeRef]) -> Result<NodeRef> {
        assert_eq!(x.len(), self.nin(), "neuron expects {} inputs", self.nin());

        let mut sum = engine.leaf(0.0)?;
        for (&w, &xi) in self.weights.iter().zip(x) {
            let wx = engine.mul(w, xi)?;
            sum = engine.add(sum, wx)?;
        }
        let out = engine.add(sum, self.bias)?;
        self.activation.apply(engine, out)
    }

    /// Get all trainable parameters: weights, then bias.
    pub fn parameters(&self) -> Vec<NodeRef> {
        let mut params = self.weights.clone();
        params.push(self.bias);
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_neuron_forward() {
        let mut engine = Engine::with_capacity(64);
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        let neuron = Neuron::new(&mut engine, 2, Activation::Tanh, &mut rng);
        engine.set_parameter(neuron.weights[0], 0.5).unwrap();
        engine.set_parameter(neuron.weights[1], -1.0).unwrap();
        engine.set_parameter(neuron.bias, 0.2).unwrap();

        let x = [engine.leaf(1.0).unwrap(), engine.leaf(0.3).unwrap()];
        let y = neuron.forward(&mut engine, &x).unwrap();

        let expected = (0.5 - 0.3 + 0.2_f64).tanh();
        assert!((engine.data(y).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_neuron_backward() {
        let mut engine = Engine::with_capacity(64);
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let neuron = Neuron::new(&mut engine, 3, Activation::Identity, &mut rng);

        let inputs = [2.0, -1.0, 0.5];
        let x: Vec<NodeRef> = inputs.iter().map(|&v| engine.leaf(v).unwrap()).collect();
        let y = neuron.forward(&mut engine, &x).unwrap();
        engine.backward(y, false).unwrap();

        // Linear output: d(out)/d(w_i) = x_i, d(out)/d(b) = 1
        for (&w, &xi) in neuron.weights.iter().zip(&inputs) {
            assert_eq!(engine.grad(w), Ok(xi));
        }
        assert_eq!(engine.grad(neuron.bias), Ok(1.0));
    }

    #[test]
    #[should_panic(expected = "neuron expects 3 inputs")]
    fn test_neuron_rejects_wrong_input_count() {
        let mut engine = Engine::with_capacity(16);
        let mut rng = rand::rngs::StdRng::seed_from_u64(4);
        let neuron = Neuron::new(&mut engine, 3, Activation::Tanh, &mut rng);
        let x = [engine.leaf(1.0).unwrap()];
        let _ = neuron.forward(&mut engine, &x);
    }

    #[test]
    fn test_initial_weights_in_range() {
        let mut engine = Engine::with_capacity(1);
        let mut rng = rand::rngs::StdRng::seed_from_u64(2);
        let neuron = Neuron::new(&mut engine, 50, Activation::Relu, &mut rng);

        assert_eq!(neuron.parameters().len(), 51);
        for w in &neuron.weights {
            let v = engine.data(*w).unwrap();
            assert!((-0.5..0.5).contains(&v));
        }
        assert_eq!(engine.data(neuron.bias), Ok(0.0));
    }
}
