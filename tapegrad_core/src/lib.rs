//! # tapegrad_core - Scalar Reverse-mode Autodiff on an Arena Tape
//!
//! This crate records scalar computations on a fixed-capacity, append-only tape
//! as they execute, then computes gradients of a chosen output with respect to
//! every node that contributed to it by walking the tape backward.
//!
//! ## Quick Start
//!
//! ```
//! use tapegrad_core::Engine;
//!
//! let mut engine = Engine::new();
//!
//! let a = engine.leaf(2.0)?;
//! let b = engine.leaf(3.0)?;
//! let c = engine.leaf(1.0)?;
//!
//! // z = a * b + c
//! let ab = engine.mul(a, b)?;
//! let z = engine.add(ab, c)?;
//! assert_eq!(engine.data(z)?, 7.0);
//!
//! // Keep the graph so the leaf gradients stay readable.
//! engine.backward(z, true)?;
//! assert_eq!(engine.grad(a)?, 3.0);
//! assert_eq!(engine.grad(b)?, 2.0);
//! assert_eq!(engine.grad(c)?, 1.0);
//! # Ok::<(), tapegrad_core::Error>(())
//! ```
//!
//! ## Supported Operations
//!
//! | Category | Operations |
//! |----------|------------|
//! | Arithmetic | [`Engine::add`], [`Engine::sub`], [`Engine::mul`], [`Engine::div`], [`Engine::true_div`] |
//! | Power | [`Engine::pow`] (x^n for constant n) |
//! | Activation | [`Engine::exp`], [`Engine::tanh`], [`Engine::relu`] |
//!
//! ## Architecture
//!
//! - **[`Engine`]**: caller-owned session bundling one [`Tape`] and one [`ParameterStore`].
//! - **[`Tape`]**: transient nodes in creation order, O(1) [`reset`](Engine::reset).
//! - **[`ParameterStore`]**: trainable nodes that survive tape resets.
//! - **[`NodeRef`]**: generation-checked handle; stale handles yield an [`Error`].
//! - **Backward**: [`Engine::backward`] (linear sweep) and
//!   [`Engine::backward_dfs`] (depth-first sort of the reachable subgraph).
//!
//! ## Example: Training Loop
//!
//! ```
//! use tapegrad_core::Engine;
//!
//! // Fit w so that w * 3 = 6.
//! let mut engine = Engine::with_capacity(64);
//! let w = engine.parameter(0.0);
//!
//! for _ in 0..50 {
//!     let x = engine.leaf(3.0)?;
//!     let target = engine.leaf(6.0)?;
//!     let pred = engine.mul(w, x)?;
//!     let diff = engine.sub(pred, target)?;
//!     let loss = engine.pow(diff, 2.0)?;
//!
//!     engine.zero_parameter_gradients();
//!     engine.backward(loss, false)?; // resets the tape
//!     engine.apply_gradient_step(0.02);
//! }
//! assert!((engine.data(w)? - 2.0).abs() < 1e-6);
//! # Ok::<(), tapegrad_core::Error>(())
//! ```

mod backward;
mod engine;
mod error;
mod finite_diff;
mod graph;
mod node;
mod ops;
mod params;
mod tape;

pub use backward::{BackwardReport, Strategy};
pub use engine::{Engine, EngineConfig, DEFAULT_TAPE_CAPACITY};
pub use error::{Error, Result};
pub use finite_diff::{finite_diff_grad, gradient_check, max_grad_error, GradientCheck};
pub use node::{Node, NodeRef, OpKind};
pub use params::ParameterStore;
pub use tape::Tape;

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        Engine::with_capacity(256)
    }

    #[test]
    fn test_basic_arithmetic() {
        let mut e = engine();
        let x = e.leaf(2.0).unwrap();
        let y = e.leaf(4.0).unwrap();

        let sum = e.add(x, y).unwrap();
        let diff = e.sub(x, y).unwrap();
        let prod = e.mul(x, y).unwrap();
        let quot = e.div(x, y).unwrap();
        let true_quot = e.true_div(x, y).unwrap();

        assert_eq!(e.data(sum), Ok(6.0));
        assert_eq!(e.data(diff), Ok(-2.0));
        assert_eq!(e.data(prod), Ok(8.0));
        assert_eq!(e.data(quot), Ok(0.5));
        assert_eq!(e.data(true_quot), Ok(0.5));
    }

    #[test]
    fn test_activations() {
        let mut e = engine();
        let x = e.leaf(1.0).unwrap();

        let ex = e.exp(x).unwrap();
        let th = e.tanh(x).unwrap();
        let sq = e.pow(x, 2.0).unwrap();
        assert!((e.data(ex).unwrap() - 1.0_f64.exp()).abs() < 1e-10);
        assert!((e.data(th).unwrap() - 1.0_f64.tanh()).abs() < 1e-10);
        assert_eq!(e.data(sq), Ok(1.0));

        let zero = e.leaf(0.0).unwrap();
        let t0 = e.tanh(zero).unwrap();
        assert!(e.data(t0).unwrap().abs() < 1e-4);
    }

    #[test]
    fn test_scenario_mul_add() {
        // z = a*b + c at a=2, b=3, c=1
        for strategy in [Strategy::Linear, Strategy::DepthFirst] {
            let mut e = engine();
            let a = e.leaf(2.0).unwrap();
            let b = e.leaf(3.0).unwrap();
            let c = e.leaf(1.0).unwrap();
            let ab = e.mul(a, b).unwrap();
            let z = e.add(ab, c).unwrap();
            assert_eq!(e.data(z), Ok(7.0));

            e.zero_all_gradients();
            e.backward_with(strategy, z, true).unwrap();

            assert_eq!(e.grad(a), Ok(3.0));
            assert_eq!(e.grad(b), Ok(2.0));
            assert_eq!(e.grad(c), Ok(1.0));
        }
    }

    #[test]
    fn test_relu_scenarios() {
        let mut e = engine();
        let x1 = e.leaf(-2.0).unwrap();
        let r1 = e.relu(x1).unwrap();
        assert_eq!(e.data(r1), Ok(0.0));
        e.backward(r1, true).unwrap();
        assert_eq!(e.grad(x1), Ok(0.0));

        // Start a fresh graph.
        e.reset();
        let x2 = e.leaf(5.0).unwrap();
        let r2 = e.relu(x2).unwrap();
        assert_eq!(e.data(r2), Ok(5.0));
        e.backward(r2, true).unwrap();
        assert_eq!(e.grad(x2), Ok(1.0));
    }

    #[test]
    fn test_gradient_sub() {
        let mut e = engine();
        let x = e.leaf(2.0).unwrap();
        let y = e.leaf(3.0).unwrap();
        let z = e.sub(x, y).unwrap();

        e.backward(z, true).unwrap();
        assert_eq!(e.grad(x), Ok(1.0));
        assert_eq!(e.grad(y), Ok(-1.0));
    }

    #[test]
    fn test_gradient_div_both_forms() {
        // z = x / y
        // dz/dx = 1/y, dz/dy = -x/y^2
        let mut e = engine();
        let x = e.leaf(2.0).unwrap();
        let y = e.leaf(4.0).unwrap();
        let z1 = e.div(x, y).unwrap();
        e.backward(z1, true).unwrap();
        assert!((e.grad(x).unwrap() - 0.25).abs() < 1e-10);
        assert!((e.grad(y).unwrap() - (-2.0 / 16.0)).abs() < 1e-10);

        e.zero_all_gradients();
        let z2 = e.true_div(x, y).unwrap();
        e.backward_dfs(z2, true).unwrap();
        assert!((e.grad(x).unwrap() - 0.25).abs() < 1e-10);
        assert!((e.grad(y).unwrap() - (-2.0 / 16.0)).abs() < 1e-10);
    }

    #[test]
    fn test_gradient_pow() {
        // z = x^3
        // dz/dx = 3*x^2
        let mut e = engine();
        let x = e.leaf(2.0).unwrap();
        let z = e.pow(x, 3.0).unwrap();

        e.backward(z, true).unwrap();
        assert!((e.grad(x).unwrap() - 12.0).abs() < 1e-10);
    }

    #[test]
    fn test_gradient_exp_tanh() {
        let mut e = engine();
        let x = e.leaf(0.5).unwrap();
        let ex = e.exp(x).unwrap();
        e.backward(ex, true).unwrap();
        assert!((e.grad(x).unwrap() - 0.5_f64.exp()).abs() < 1e-10);

        e.zero_all_gradients();
        let th = e.tanh(x).unwrap();
        e.backward(th, true).unwrap();
        let t = 0.5_f64.tanh();
        assert!((e.grad(x).unwrap() - (1.0 - t * t)).abs() < 1e-10);
    }

    #[test]
    fn test_reused_variable() {
        // z = x * x
        // dz/dx = 2x
        let mut e = engine();
        let x = e.leaf(3.0).unwrap();
        let z = e.mul(x, x).unwrap();

        e.backward(z, true).unwrap();
        assert_eq!(e.grad(x), Ok(6.0));
    }

    #[test]
    fn test_diamond_graph() {
        // z = (x + y) * (x - y) = x^2 - y^2
        for strategy in [Strategy::Linear, Strategy::DepthFirst] {
            let mut e = engine();
            let x = e.leaf(3.0).unwrap();
            let y = e.leaf(2.0).unwrap();
            let a = e.add(x, y).unwrap();
            let b = e.sub(x, y).unwrap();
            let z = e.mul(a, b).unwrap();

            e.backward_with(strategy, z, true).unwrap();
            assert_eq!(e.grad(x), Ok(6.0));
            assert_eq!(e.grad(y), Ok(-4.0));
        }
    }

    #[test]
    fn test_repeated_backward_after_zeroing() {
        let mut e = engine();
        let w = e.parameter(0.3);
        let x = e.leaf(-1.2).unwrap();
        let wx = e.mul(w, x).unwrap();
        let h = e.tanh(wx).unwrap();
        let z = e.mul(h, h).unwrap();

        e.backward(z, true).unwrap();
        let first: Vec<f64> = e.tape().live().iter().map(|n| n.grad()).collect();
        let first_w = e.grad(w).unwrap();

        e.zero_all_gradients();
        e.backward(z, true).unwrap();
        let second: Vec<f64> = e.tape().live().iter().map(|n| n.grad()).collect();

        assert_eq!(first, second);
        assert_eq!(e.grad(w), Ok(first_w));
    }

    #[test]
    fn test_without_zeroing_gradients_accumulate() {
        let mut e = engine();
        let x = e.leaf(3.0).unwrap();
        let y = e.leaf(4.0).unwrap();
        let z = e.mul(x, y).unwrap();

        e.backward(z, true).unwrap();
        e.backward(z, true).unwrap();
        // The root is re-seeded to 1 but the leaves keep accumulating.
        assert_eq!(e.grad(z), Ok(1.0));
        assert_eq!(e.grad(x), Ok(8.0));
    }

    #[test]
    fn test_numeric_degeneracy_propagates() {
        let mut e = engine();
        let x = e.leaf(1.0).unwrap();
        let zero = e.leaf(0.0).unwrap();
        let z = e.true_div(x, zero).unwrap();
        assert!(e.data(z).unwrap().is_infinite());

        e.backward(z, true).unwrap();
        assert!(e.grad(x).unwrap().is_infinite());
        assert!(!e.grad(zero).unwrap().is_finite());
    }

    #[test]
    fn test_finite_diff_random_graph() {
        use rand::Rng;
        let mut rng = rand::thread_rng();

        let x_val: f64 = rng.gen_range(-1.5..1.5);
        let y_val: f64 = rng.gen_range(0.5..2.0);

        // exp(x) / y + tanh(x * y) - relu(y)^2
        let build = |e: &mut Engine, v: &[NodeRef]| {
            let ex = e.exp(v[0])?;
            let q = e.div(ex, v[1])?;
            let xy = e.mul(v[0], v[1])?;
            let t = e.tanh(xy)?;
            let r = e.relu(v[1])?;
            let r2 = e.pow(r, 2.0)?;
            let s = e.add(q, t)?;
            e.sub(s, r2)
        };

        for strategy in [Strategy::Linear, Strategy::DepthFirst] {
            let check = gradient_check(build, &[x_val, y_val], 1e-3, strategy).unwrap();
            assert!(
                check.max_error() < 1e-4,
                "{} at ({}, {}): autodiff={:?}, fd={:?}",
                strategy,
                x_val,
                y_val,
                check.analytic,
                check.numeric
            );
        }
    }
}
