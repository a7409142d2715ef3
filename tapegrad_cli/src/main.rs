//! tapegrad CLI: demos and benchmarks for the tape-based autodiff engine.
//!
//! ```text
//! tapegrad demo
//! tapegrad bench --input-dim 64 --hidden-dim 128 --runs 20
//! tapegrad compare --noise 10000 --chain 500 --iters 1000
//! ```
//!
//! Set `RUST_LOG=debug` to trace tape resets and backward passes.

use std::time::{Duration, Instant};

use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tapegrad_core::{
    gradient_check, Engine, EngineConfig, NodeRef, Strategy, DEFAULT_TAPE_CAPACITY,
};
use tapegrad_nn::{squared_error, sum, Mlp, Sgd};

#[derive(Parser)]
#[command(name = "tapegrad")]
#[command(about = "Scalar reverse-mode autodiff on an arena tape")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Maximum number of nodes the tape may hold
    #[arg(long, global = true, default_value_t = DEFAULT_TAPE_CAPACITY)]
    tape_capacity: usize,

    /// Seed for weight initialisation and random inputs
    #[arg(long, global = true, default_value = "42")]
    seed: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk through gradients of small expressions, a neuron and XOR training
    Demo {
        /// SGD steps for the XOR network
        #[arg(long, default_value = "10000")]
        xor_steps: usize,

        /// SGD learning rate for the XOR network
        #[arg(long, default_value = "0.005")]
        lr: f64,
    },

    /// Time forward and backward passes of an MLP (hidden, hidden, 10)
    Bench {
        /// Input features
        #[arg(long, default_value = "64")]
        input_dim: usize,

        /// Width of both hidden layers
        #[arg(long, default_value = "128")]
        hidden_dim: usize,

        /// Timed iterations
        #[arg(long, default_value = "20")]
        runs: usize,
    },

    /// Compare the linear sweep against the depth-first sort
    Compare {
        /// Disconnected nodes recorded before the chain
        #[arg(long, default_value = "10000")]
        noise: usize,

        /// Additions in the chain reaching the root
        #[arg(long, default_value = "500")]
        chain: usize,

        /// Additions in the dense chain with no noise
        #[arg(long, default_value = "5000")]
        dense: usize,

        /// Backward passes per strategy
        #[arg(long, default_value = "1000")]
        iters: usize,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = EngineConfig::default().with_tape_capacity(cli.tape_capacity);
    let mut rng = StdRng::seed_from_u64(cli.seed);
    log::debug!("tape capacity {}, seed {}", cli.tape_capacity, cli.seed);

    match cli.command {
        Commands::Demo { xor_steps, lr } => demo_command(config, &mut rng, xor_steps, lr),
        Commands::Bench {
            input_dim,
            hidden_dim,
            runs,
        } => bench_command(config, &mut rng, input_dim, hidden_dim, runs),
        Commands::Compare {
            noise,
            chain,
            dense,
            iters,
        } => compare_command(config, noise, chain, dense, iters),
    }
}

// ============================================================================
// demo
// ============================================================================

fn demo_command(config: EngineConfig, rng: &mut StdRng, xor_steps: usize, lr: f64) -> Result<()> {
    println!("=== Reverse-Mode Autodiff Demo ===\n");
    let mut engine = Engine::with_config(config);

    // 1. f = a^2 + 3b - 5
    println!("1. Calculus: f = a^2 + 3b - 5");
    let a = engine.leaf(3.0)?;
    let b = engine.leaf(2.0)?;
    let three = engine.leaf(3.0)?;
    let five = engine.leaf(5.0)?;
    let a2 = engine.pow(a, 2.0)?;
    let b3 = engine.mul(three, b)?;
    let s = engine.add(a2, b3)?;
    let f = engine.sub(s, five)?;
    engine.backward(f, true)?;
    println!("   At a = 3, b = 2:");
    println!("   f = {:.6} (expected: 10)", engine.data(f)?);
    println!("   df/da = {:.6} (expected: 2a = 6)", engine.grad(a)?);
    println!("   df/db = {:.6} (expected: 3)\n", engine.grad(b)?);
    engine.reset();

    // 2. o = tanh(w*x + b)
    println!("2. Neuron: o = tanh(w*x + b)");
    let x = engine.leaf(1.0)?;
    let w = engine.parameter(0.5);
    let bias = engine.parameter(0.2);
    let wx = engine.mul(w, x)?;
    let n = engine.add(wx, bias)?;
    let o = engine.tanh(n)?;
    let value = engine.data(o)?;
    let report = engine.backward_dfs(o, false)?;
    let t = 0.7_f64.tanh();
    println!("   At x = 1.0, w = 0.5, b = 0.2:");
    println!("   o = {:.10}", value);
    println!("   do/dw = {:.10} (expected: {:.10})", engine.grad(w)?, (1.0 - t * t));
    println!("   do/db = {:.10} (expected: {:.10})", engine.grad(bias)?, (1.0 - t * t));
    println!("   {} pass visited {} nodes\n", report.strategy, report.nodes_visited);
    engine.release_parameters();

    // 3. Finite-difference check of a mixed expression
    println!("3. Gradient check: z = exp(x) / (y^2 + 1) + relu(x * y)");
    let check = gradient_check(
        |e, v| {
            let ex = e.exp(v[0])?;
            let y2 = e.pow(v[1], 2.0)?;
            let one = e.leaf(1.0)?;
            let den = e.add(y2, one)?;
            let q = e.true_div(ex, den)?;
            let xy = e.mul(v[0], v[1])?;
            let r = e.relu(xy)?;
            e.add(q, r)
        },
        &[0.5, 2.0],
        1e-3,
        Strategy::Linear,
    )?;
    println!("   z = {:.10}", check.value);
    println!("   autodiff: {:?}", check.analytic);
    println!("   fd:       {:?}", check.numeric);
    println!("   max error: {:.2e}\n", check.max_error());
    ensure!(check.max_error() < 1e-4, "gradient check failed: {:.2e}", check.max_error());

    // 4. XOR
    println!("4. XOR: 2 -> 4 -> 1, {} steps, lr {}", xor_steps, lr);
    let inputs = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
    let targets = [0.0, 1.0, 1.0, 0.0];
    let mlp = Mlp::new(&mut engine, 2, &[4, 1], rng);
    let opt = Sgd::new(lr);

    for step in 0..xor_steps {
        let mut terms = Vec::with_capacity(inputs.len());
        for (input, &target) in inputs.iter().zip(targets.iter()) {
            let x = [engine.leaf(input[0])?, engine.leaf(input[1])?];
            let pred = mlp.forward(&mut engine, &x)?[0];
            let y = engine.leaf(target)?;
            terms.push(squared_error(&mut engine, pred, y)?);
        }
        let loss = sum(&mut engine, &terms)?;
        let value = engine.data(loss)?;

        opt.zero_grad(&mut engine);
        engine.backward(loss, false)?;
        opt.step(&mut engine);

        if step % 1000 == 0 || step + 1 == xor_steps {
            println!("   Step {:5}: loss = {:.6}", step, value);
        }
    }

    for (input, &target) in inputs.iter().zip(targets.iter()) {
        let x = [engine.leaf(input[0])?, engine.leaf(input[1])?];
        let pred = mlp.forward(&mut engine, &x)?[0];
        println!(
            "   [{:.0}, {:.0}] -> {:.4} (target: {:.0})",
            input[0],
            input[1],
            engine.data(pred)?,
            target
        );
        engine.reset();
    }

    engine.release_parameters();
    Ok(())
}

// ============================================================================
// bench
// ============================================================================

fn bench_command(
    config: EngineConfig,
    rng: &mut StdRng,
    input_dim: usize,
    hidden_dim: usize,
    runs: usize,
) -> Result<()> {
    ensure!(runs > 0, "--runs must be positive");

    let mut engine = Engine::with_config(config);
    let mlp = Mlp::new(&mut engine, input_dim, &[hidden_dim, hidden_dim, 10], rng);
    let opt = Sgd::new(1e-3);

    println!("=== MLP Benchmark ===");
    println!(
        "Architecture: {} -> {} -> {} -> 10 ({} parameters)",
        input_dim,
        hidden_dim,
        hidden_dim,
        engine.parameter_store().len()
    );

    let mut forward = Duration::ZERO;
    let mut backward = Duration::ZERO;
    let mut tape_len = 0;

    for run in 0..runs {
        let start = Instant::now();
        let x = (0..input_dim)
            .map(|_| engine.leaf(rng.gen_range(-1.0..1.0)))
            .collect::<tapegrad_core::Result<Vec<NodeRef>>>()?;
        let out = mlp
            .forward(&mut engine, &x)
            .with_context(|| format!("forward pass of run {} did not fit on the tape", run))?;
        let loss = sum(&mut engine, &out)?;
        forward += start.elapsed();
        tape_len = engine.tape_len();

        let start = Instant::now();
        opt.zero_grad(&mut engine);
        engine.backward(loss, false)?;
        opt.step(&mut engine);
        backward += start.elapsed();
    }

    println!("Tape nodes per pass: {}", tape_len);
    println!("Forward:  {:>10.3} ms/run", forward.as_secs_f64() * 1e3 / runs as f64);
    println!("Backward: {:>10.3} ms/run", backward.as_secs_f64() * 1e3 / runs as f64);

    engine.release_parameters();
    Ok(())
}

// ============================================================================
// compare
// ============================================================================

/// Records `noise` disconnected products, then an addition chain of `chain`
/// links ending at the returned root.
fn build_noisy_chain(engine: &mut Engine, noise: usize, chain: usize) -> tapegrad_core::Result<NodeRef> {
    for i in 0..noise {
        let a = engine.leaf(i as f64)?;
        let b = engine.leaf(i as f64)?;
        engine.mul(a, b)?;
    }
    let mut head = engine.leaf(1.0)?;
    for _ in 0..chain {
        let step = engine.leaf(0.5)?;
        head = engine.add(head, step)?;
    }
    Ok(head)
}

fn time_strategies(engine: &mut Engine, root: NodeRef, iters: usize) -> Result<()> {
    for strategy in [Strategy::Linear, Strategy::DepthFirst] {
        let mut visited = 0;
        let start = Instant::now();
        for _ in 0..iters {
            engine.zero_all_gradients();
            visited = engine.backward_with(strategy, root, true)?.nodes_visited;
        }
        let elapsed = start.elapsed();
        println!(
            "  {:<7} {:>8} nodes visited, {:>10.3} us/pass",
            strategy,
            visited,
            elapsed.as_secs_f64() * 1e6 / iters as f64
        );
    }
    Ok(())
}

fn compare_command(config: EngineConfig, noise: usize, chain: usize, dense: usize, iters: usize) -> Result<()> {
    ensure!(iters > 0, "--iters must be positive");
    let mut engine = Engine::with_config(config);

    println!("=== Backward Strategy Comparison ===\n");

    let root = build_noisy_chain(&mut engine, noise, chain).context("building sparse tape")?;
    println!(
        "Sparse: {} noise products + {}-link chain ({} tape nodes)",
        noise,
        chain,
        engine.tape_len()
    );
    time_strategies(&mut engine, root, iters)?;
    engine.reset();

    let root = build_noisy_chain(&mut engine, 0, dense).context("building dense chain")?;
    println!("\nDense: {}-link chain ({} tape nodes)", dense, engine.tape_len());
    time_strategies(&mut engine, root, iters)?;
    engine.reset();

    Ok(())
}
