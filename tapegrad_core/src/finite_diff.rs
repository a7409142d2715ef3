//! Finite difference utilities for gradient verification.
//!
//! [`gradient_check`] rebuilds a graph on a scratch engine at perturbed points
//! and compares the central difference against the analytic gradient.

use crate::backward::Strategy;
use crate::engine::Engine;
use crate::error::Result;
use crate::node::NodeRef;

/// Compute gradients using central finite differences.
///
/// # Example
/// ```
/// use tapegrad_core::finite_diff_grad;
///
/// // f(x, y) = x^2 + y^2
/// let f = |v: &[f64]| v[0] * v[0] + v[1] * v[1];
/// let grads = finite_diff_grad(f, &[3.0, 4.0], 1e-6);
///
/// assert!((grads[0] - 6.0).abs() < 1e-5);
/// assert!((grads[1] - 8.0).abs() < 1e-5);
/// ```
pub fn finite_diff_grad<F>(f: F, point: &[f64], eps: f64) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut perturbed = point.to_vec();

    (0..point.len())
        .map(|i| {
            // (f(x + eps) - f(x - eps)) / (2 * eps)
            perturbed[i] = point[i] + eps;
            let f_plus = f(&perturbed);
            perturbed[i] = point[i] - eps;
            let f_minus = f(&perturbed);
            perturbed[i] = point[i];

            (f_plus - f_minus) / (2.0 * eps)
        })
        .collect()
}

/// Maximum absolute difference between two gradient vectors.
pub fn max_grad_error(grad1: &[f64], grad2: &[f64]) -> f64 {
    assert_eq!(grad1.len(), grad2.len());
    grad1
        .iter()
        .zip(grad2)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}

/// Analytic and numeric gradients of one expression at one point.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientCheck {
    pub value: f64,
    pub analytic: Vec<f64>,
    pub numeric: Vec<f64>,
}

impl GradientCheck {
    pub fn max_error(&self) -> f64 {
        max_grad_error(&self.analytic, &self.numeric)
    }
}

/// Compare the analytic gradient of `build` against central differences.
///
/// `build` receives a scratch engine and one tape leaf per coordinate of
/// `point`, and returns the output node. The graph is rebuilt from scratch for
/// every evaluation.
///
/// # Example
/// ```
/// use tapegrad_core::{gradient_check, Strategy};
///
/// // f(x, y) = tanh(x * y)
/// let check = gradient_check(
///     |e, x| {
///         let xy = e.mul(x[0], x[1])?;
///         e.tanh(xy)
///     },
///     &[0.3, -0.7],
///     1e-3,
///     Strategy::Linear,
/// )
/// .unwrap();
/// assert!(check.max_error() < 1e-4);
/// ```
pub fn gradient_check<F>(build: F, point: &[f64], eps: f64, strategy: Strategy) -> Result<GradientCheck>
where
    F: Fn(&mut Engine, &[NodeRef]) -> Result<NodeRef>,
{
    let mut engine = Engine::new();

    let inputs = point
        .iter()
        .map(|&v| engine.leaf(v))
        .collect::<Result<Vec<_>>>()?;
    let output = build(&mut engine, &inputs)?;
    let value = engine.data(output)?;
    engine.backward_with(strategy, output, true)?;
    let analytic = inputs
        .iter()
        .map(|&x| engine.grad(x))
        .collect::<Result<Vec<_>>>()?;

    let mut evaluate = |at: &[f64]| -> Result<f64> {
        engine.reset();
        let inputs = at.iter().map(|&v| engine.leaf(v)).collect::<Result<Vec<_>>>()?;
        let output = build(&mut engine, &inputs)?;
        engine.data(output)
    };

    let mut numeric = Vec::with_capacity(point.len());
    let mut perturbed = point.to_vec();
    for i in 0..point.len() {
        perturbed[i] = point[i] + eps;
        let f_plus = evaluate(&perturbed)?;
        perturbed[i] = point[i] - eps;
        let f_minus = evaluate(&perturbed)?;
        perturbed[i] = point[i];
        numeric.push((f_plus - f_minus) / (2.0 * eps));
    }

    Ok(GradientCheck {
        value,
        analytic,
        numeric,
    })
}
