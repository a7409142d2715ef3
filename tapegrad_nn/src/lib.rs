//! # tapegrad_nn - Neural Network Layers for tapegrad
//!
//! Scalar neural network building blocks on top of the `tapegrad_core` engine:
//!
//! - **Layers**: [`Neuron`], [`Layer`], [`Mlp`]
//! - **Activations**: identity, tanh, ReLU
//! - **Losses**: squared error, summed over a batch
//! - **Optimizers**: plain SGD
//!
//! Weights and biases are engine parameters, so they survive the tape reset
//! that follows every `backward(.., false)`.
//!
//! ## Example: Training a Small MLP
//!
//! ```
//! use rand::SeedableRng;
//! use tapegrad_core::Engine;
//! use tapegrad_nn::{squared_error, Mlp, Sgd};
//!
//! let mut engine = Engine::with_capacity(1_000);
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let mlp = Mlp::new(&mut engine, 2, &[4, 1], &mut rng);
//! let opt = Sgd::new(0.05);
//!
//! let mut losses = Vec::new();
//! for _ in 0..20 {
//!     let x = [engine.leaf(0.5)?, engine.leaf(-1.0)?];
//!     let target = engine.leaf(0.25)?;
//!     let out = mlp.forward(&mut engine, &x)?;
//!     let loss = squared_error(&mut engine, out[0], target)?;
//!     losses.push(engine.data(loss)?);
//!
//!     opt.zero_grad(&mut engine);
//!     engine.backward(loss, false)?;
//!     opt.step(&mut engine);
//! }
//! assert!(losses[19] < losses[0]);
//! # Ok::<(), tapegrad_core::Error>(())
//! ```

pub mod activations;
pub mod layers;
pub mod loss;
pub mod optim;

// Re-exports for convenience
pub use activations::{relu, tanh, Activation};
pub use layers::{Layer, Mlp, Neuron};
pub use loss::{squared_error, sum, sum_squared_error};
pub use optim::Sgd;
