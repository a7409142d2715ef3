//! Stochastic gradient descent.

use tapegrad_core::Engine;

/// Plain SGD over every live parameter of an engine.
///
/// Update rule: `data -= lr * grad`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sgd {
    pub lr: f64,
}

impl Sgd {
    pub fn new(lr: f64) -> Self {
        Sgd { lr }
    }

    /// Apply one update step to every parameter.
    pub fn step(&self, engine: &mut Engine) {
        engine.apply_gradient_step(self.lr);
    }

    /// Zero parameter gradients. Tape gradients are untouched.
    pub fn zero_grad(&self, engine: &mut Engine) {
        engine.zero_parameter_gradients();
    }
}
