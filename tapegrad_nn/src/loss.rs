//! Loss functions.

use tapegrad_core::{Engine, NodeRef, Result};

/// Squared error: (pred - target)^2
pub fn squared_error(engine: &mut Engine, pred: NodeRef, target: NodeRef) -> Result<NodeRef> {
    let diff = engine.sub(pred, target)?;
    engine.pow(diff, 2.0)
}

/// Sum of nodes, folded left from a zero leaf.
pub fn sum(engine: &mut Engine, terms: &[NodeRef]) -> Result<NodeRef> {
    let mut total = engine.leaf(0.0)?;
    for &t in terms {
        total = engine.add(total, t)?;
    }
    Ok(total)
}

/// Summed squared error over paired predictions and targets.
///
/// # Panics
///
/// Panics if `pred` and `target` have different lengths.
///
/// # Example
/// ```
/// use tapegrad_core::Engine;
/// use tapegrad_nn::sum_squared_error;
///
/// let mut engine = Engine::with_capacity(64);
/// let pred = [engine.leaf(1.0)?, engine.leaf(2.0)?];
/// let target = [engine.leaf(0.0)?, engine.leaf(4.0)?];
/// let loss = sum_squared_error(&mut engine, &pred, &target)?;
///
/// assert_eq!(engine.data(loss)?, 5.0);
/// # Ok::<(), tapegrad_core::Error>(())
/// ```
pub fn sum_squared_error(engine: &mut Engine, pred: &[NodeRef], target: &[NodeRef]) -> Result<NodeRef> {
    assert_eq!(pred.len(), target.len(), "prediction/target length mismatch");

    let terms = pred
        .iter()
        .zip(target)
        .map(|(&p, &t)| squared_error(engine, p, t))
        .collect::<Result<Vec<_>>>()?;
    sum(engine, &terms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squared_error_gradient() {
        let mut engine = Engine::with_capacity(16);
        let pred = engine.parameter(3.0);
        let target = engine.leaf(1.0).unwrap();
        let loss = squared_error(&mut engine, pred, target).unwrap();

        assert_eq!(engine.data(loss), Ok(4.0));

        engine.backward(loss, false).unwrap();
        // d/dpred = 2 * (pred - target)
        assert!((engine.grad(pred).unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "prediction/target length mismatch")]
    fn test_sum_squared_error_length_mismatch() {
        let mut engine = Engine::with_capacity(8);
        let pred = [engine.leaf(1.0).unwrap(), engine.leaf(2.0).unwrap()];
        let target = [engine.leaf(0.0).unwrap()];
        let _ = sum_squared_error(&mut engine, &pred, &target);
    }

    #[test]
    fn test_sum_of_nothing_is_zero() {
        let mut engine = Engine::with_capacity(4);
        let total = sum(&mut engine, &[]).unwrap();
        assert_eq!(engine.data(total), Ok(0.0));
    }
}
