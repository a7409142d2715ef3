//! Reverse-mode automatic differentiation.
//!
//! Two interchangeable strategies push gradients from a root back to its
//! ancestors:
//!
//! - [`Engine::backward`] sweeps the tape by index from the root down to 0.
//!   Every predecessor of the node at index `i` sits at an index below `i`,
//!   so a strictly decreasing sweep is already a reverse topological order.
//!   It touches `root index + 1` nodes whether or not they feed the root, but
//!   reads memory sequentially.
//! - [`Engine::backward_dfs`] finds the nodes reachable from the root with an
//!   explicit work stack, then dispatches them by descending index. It only
//!   touches the reachable subgraph, at the cost of pointer chasing and a sort.
//!
//! Both dispatch the reachable nodes in the same relative order, so every
//! gradient sum is accumulated in the same sequence and the results agree bit
//! for bit. Which is faster depends on how much of the tape is disconnected
//! from the root.

use std::fmt;

use log::debug;

use crate::engine::Engine;
use crate::error::Result;
use crate::node::{Link, NodeRef};
use crate::ops::local_gradients;

/// Backward traversal strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Index-ordered sweep over the tape.
    Linear,
    /// Explicit depth-first topological sort of the reachable subgraph.
    DepthFirst,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Linear => "linear",
            Strategy::DepthFirst => "dfs",
        };
        f.pad(name)
    }
}

/// Summary of one backward pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackwardReport {
    pub strategy: Strategy,
    /// Number of tape nodes whose gradient rule was dispatched.
    pub nodes_visited: usize,
}

/// Work-stack entry for the iterative post-order traversal.
enum Visit {
    Enter(usize),
    Exit(usize),
}

impl Engine {
    /// Backpropagate from `root` with the index-ordered sweep.
    ///
    /// Sets `root.grad = 1`, then dispatches the rule of every tape node from
    /// the root's index down to 0. Unless `retain_graph` is set, the tape is
    /// reset afterwards and all transient handles become stale.
    pub fn backward(&mut self, root: NodeRef, retain_graph: bool) -> Result<BackwardReport> {
        self.check(root)?;
        self.slot_mut(root).grad = 1.0;

        let mut nodes_visited = 0;
        if let Link::Tape(start) = root.link {
            for index in (0..=start).rev() {
                self.propagate(index);
            }
            nodes_visited = start + 1;
        }

        Ok(self.finish(Strategy::Linear, nodes_visited, retain_graph))
    }

    /// Backpropagate from `root` over the reachable subgraph only.
    ///
    /// Leaves (tape constants and parameters) are never pushed on the work
    /// stack since they have nothing to propagate.
    pub fn backward_dfs(&mut self, root: NodeRef, retain_graph: bool) -> Result<BackwardReport> {
        self.check(root)?;

        let mut order = match root.link {
            Link::Tape(index) => self.topological_order(index),
            Link::Param(_) => Vec::new(),
        };
        // Descending creation index: every predecessor accumulates its
        // contributions in the same order as under the linear sweep.
        order.sort_unstable_by(|a, b| b.cmp(a));

        self.slot_mut(root).grad = 1.0;
        for &index in &order {
            self.propagate(index);
        }

        Ok(self.finish(Strategy::DepthFirst, order.len(), retain_graph))
    }

    /// Backpropagate with the given strategy.
    pub fn backward_with(
        &mut self,
        strategy: Strategy,
        root: NodeRef,
        retain_graph: bool,
    ) -> Result<BackwardReport> {
        match strategy {
            Strategy::Linear => self.backward(root, retain_graph),
            Strategy::DepthFirst => self.backward_dfs(root, retain_graph),
        }
    }

    /// Dispatch the gradient rule of the tape node at `index`.
    fn propagate(&mut self, index: usize) {
        let node = *self.tape.node(index);
        let contributions = local_gradients(&node.op, node.data, |r| self.slot(r).data);
        for (pred, local) in contributions.into_iter().flatten() {
            self.slot_mut(pred).grad += local * node.grad;
        }
    }

    /// Post-order of the non-leaf tape nodes reachable from `root`.
    ///
    /// The root is always included and comes last.
    fn topological_order(&self, root: usize) -> Vec<usize> {
        // Predecessors sit below the root, so `root + 1` marks cover everything reachable.
        let mut visited = vec![false; root + 1];
        let mut order = Vec::new();
        let mut stack = vec![Visit::Enter(root)];

        while let Some(visit) = stack.pop() {
            let index = match visit {
                Visit::Exit(index) => {
                    order.push(index);
                    continue;
                }
                Visit::Enter(index) => index,
            };
            if visited[index] {
                continue;
            }
            visited[index] = true;
            stack.push(Visit::Exit(index));

            // Reversed so the left operand is explored first.
            let preds = self.tape.node(index).op.predecessors();
            for pred in preds.into_iter().rev().flatten() {
                if let Link::Tape(p) = pred.link {
                    if !visited[p] && !self.tape.node(p).is_leaf() {
                        stack.push(Visit::Enter(p));
                    }
                }
            }
        }

        order
    }

    fn finish(&mut self, strategy: Strategy, nodes_visited: usize, retain_graph: bool) -> BackwardReport {
        debug!(
            "backward ({}) visited {} of {} tape nodes, retain_graph={}",
            strategy,
            nodes_visited,
            self.tape.len(),
            retain_graph
        );
        if !retain_graph {
            self.tape.reset();
        }
        BackwardReport {
            strategy,
            nodes_visited,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRATEGIES: [Strategy; 2] = [Strategy::Linear, Strategy::DepthFirst];

    #[test]
    fn test_topological_order_simple() {
        let mut engine = Engine::with_capacity(16);
        let x = engine.leaf(1.0).unwrap();
        let y = engine.leaf(2.0).unwrap();
        let s = engine.add(x, y).unwrap();
        let z = engine.mul(s, s).unwrap();

        let order = engine.topological_order(z.creation_index().unwrap());

        // Leaves are skipped, the shared sum appears once, root comes last.
        assert_eq!(order, vec![2, 3]);
    }

    #[test]
    fn test_topological_order_respects_dependencies() {
        let mut engine = Engine::with_capacity(32);
        let x = engine.leaf(0.5).unwrap();
        let a = engine.exp(x).unwrap();
        let b = engine.tanh(x).unwrap();
        let c = engine.mul(a, b).unwrap();
        let d = engine.add(c, a).unwrap();

        let order = engine.topological_order(d.creation_index().unwrap());
        let pos = |n: NodeRef| {
            order
                .iter()
                .position(|&i| Some(i) == n.creation_index())
                .unwrap()
        };

        assert_eq!(order.len(), 4);
        assert!(pos(a) < pos(c));
        assert!(pos(b) < pos(c));
        assert!(pos(c) < pos(d));
    }

    #[test]
    fn test_dfs_matches_linear_bitwise_on_fan_out() {
        // s feeds four consumers; its gradient sums four products
        let build = |engine: &mut Engine| {
            let x = engine.leaf(0.1).unwrap();
            let y = engine.leaf(0.7).unwrap();
            let s = engine.mul(x, y).unwrap();
            let a = engine.mul(s, y).unwrap();
            let b = engine.add(s, x).unwrap();
            let c = engine.mul(a, s).unwrap();
            let d = engine.add(b, s).unwrap();
            let e = engine.mul(c, d).unwrap();
            engine.add(e, a).unwrap()
        };

        let mut linear = Engine::with_capacity(16);
        let root = build(&mut linear);
        linear.backward(root, true).unwrap();

        let mut dfs = Engine::with_capacity(16);
        let root = build(&mut dfs);
        let report = dfs.backward_dfs(root, true).unwrap();
        assert_eq!(report.nodes_visited, 7);

        let bits = |e: &Engine| -> Vec<u64> { e.tape().live().iter().map(|n| n.grad().to_bits()).collect() };
        assert_eq!(bits(&linear), bits(&dfs));
    }

    #[test]
    fn test_backward_simple_add() {
        for strategy in STRATEGIES {
            let mut engine = Engine::with_capacity(16);
            let x = engine.leaf(2.0).unwrap();
            let y = engine.leaf(3.0).unwrap();
            let z = engine.add(x, y).unwrap();

            engine.backward_with(strategy, z, true).unwrap();

            assert_eq!(engine.grad(x), Ok(1.0), "{}", strategy);
            assert_eq!(engine.grad(y), Ok(1.0), "{}", strategy);
            assert_eq!(engine.grad(z), Ok(1.0), "{}", strategy);
        }
    }

    #[test]
    fn test_backward_chain() {
        // z = (x + 1)^2
        // dz/dx = 2(x + 1)
        for strategy in STRATEGIES {
            let mut engine = Engine::with_capacity(16);
            let x = engine.parameter(2.0);
            let one = engine.leaf(1.0).unwrap();
            let y = engine.add(x, one).unwrap();
            let z = engine.pow(y, 2.0).unwrap();

            engine.backward_with(strategy, z, false).unwrap();

            assert!((engine.grad(x).unwrap() - 6.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_retain_graph_false_resets_tape() {
        let mut engine = Engine::with_capacity(16);
        let x = engine.leaf(2.0).unwrap();
        let z = engine.exp(x).unwrap();

        engine.backward_dfs(z, false).unwrap();

        assert_eq!(engine.tape_len(), 0);
        assert!(engine.grad(x).unwrap_err().is_stale_reference());
        assert!(engine.backward(z, false).unwrap_err().is_stale_reference());
    }

    #[test]
    fn test_parameter_root() {
        for strategy in STRATEGIES {
            let mut engine = Engine::with_capacity(4);
            let w = engine.parameter(5.0);
            engine.leaf(1.0).unwrap();

            let report = engine.backward_with(strategy, w, true).unwrap();

            assert_eq!(report.nodes_visited, 0);
            assert_eq!(engine.grad(w), Ok(1.0));
        }
    }

    #[test]
    fn test_leaf_root() {
        let mut engine = Engine::with_capacity(4);
        engine.leaf(1.0).unwrap();
        let x = engine.leaf(2.0).unwrap();

        let report = engine.backward_dfs(x, true).unwrap();
        assert_eq!(report.nodes_visited, 1);
        assert_eq!(engine.grad(x), Ok(1.0));

        let report = engine.backward(x, true).unwrap();
        assert_eq!(report.nodes_visited, 2);
    }

    #[test]
    fn test_nodes_visited_counts_differ_on_sparse_tape() {
        let mut engine = Engine::with_capacity(64);
        for i in 0..10 {
            let a = engine.leaf(i as f64).unwrap();
            engine.mul(a, a).unwrap();
        }
        let x = engine.leaf(1.0).unwrap();
        let y = engine.leaf(2.0).unwrap();
        let z = engine.mul(x, y).unwrap();

        let linear = engine.backward(z, true).unwrap();
        engine.zero_all_gradients();
        let dfs = engine.backward_dfs(z, true).unwrap();

        assert_eq!(linear.strategy, Strategy::Linear);
        assert_eq!(linear.nodes_visited, 23);
        assert_eq!(dfs.strategy, Strategy::DepthFirst);
        assert_eq!(dfs.nodes_visited, 1);
        assert_eq!(engine.grad(x), Ok(2.0));
    }
}
