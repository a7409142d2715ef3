//! XOR problem training example.
//!
//! Trains a 2 -> 4 -> 1 MLP on the four XOR points with plain SGD, rebuilding
//! the graph on the tape every step.
//!
//! Run with `RUST_LOG=debug` to see tape resets.

use rand::SeedableRng;
use tapegrad_core::{Engine, NodeRef, Result};
use tapegrad_nn::{squared_error, sum, Mlp, Sgd};

fn predict(engine: &mut Engine, mlp: &Mlp, input: &[f64; 2]) -> Result<NodeRef> {
    let x = [engine.leaf(input[0])?, engine.leaf(input[1])?];
    Ok(mlp.forward(engine, &x)?[0])
}

fn main() -> Result<()> {
    env_logger::init();

    // XOR dataset
    let inputs = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
    let targets = [0.0, 1.0, 1.0, 0.0];

    let mut engine = Engine::with_capacity(1_000);
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let mlp = Mlp::new(&mut engine, 2, &[4, 1], &mut rng);
    let opt = Sgd::new(0.005);

    println!("Training XOR network...\n");

    for step in 0..10_000 {
        let mut terms = Vec::with_capacity(inputs.len());
        for (input, &target) in inputs.iter().zip(targets.iter()) {
            let pred = predict(&mut engine, &mlp, input)?;
            let y = engine.leaf(target)?;
            terms.push(squared_error(&mut engine, pred, y)?);
        }
        let loss = sum(&mut engine, &terms)?;
        let value = engine.data(loss)?;

        opt.zero_grad(&mut engine);
        engine.backward(loss, false)?;
        opt.step(&mut engine);

        if step % 1000 == 0 || step == 9_999 {
            println!("Step {:5}: loss = {:.6}", step, value);
        }
    }

    // Test the trained network
    println!("\nTesting trained network:");
    println!("========================");

    for (input, &target) in inputs.iter().zip(targets.iter()) {
        let pred = predict(&mut engine, &mlp, input)?;
        let output = engine.data(pred)?;
        engine.reset();

        println!(
            "Input: [{:.0}, {:.0}] -> Output: {:.4} (target: {:.0})",
            input[0], input[1], output, target
        );
    }

    engine.release_parameters();
    Ok(())
}
