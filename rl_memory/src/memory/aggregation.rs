//! Running-maximum aggregation along the time axis.
//!
//! The plain maximum routes gradient only to the operand that won. The
//! pass-through variant keeps the same forward value but routes the full
//! upstream gradient to both operands (a straight-through estimator):
//!
//! ```text
//! forward:  max(a, b)
//! backward: d/da = 1, d/db = 1
//! ```

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// Element-wise combinator used by the running maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Aggregation {
    /// Standard maximum; gradient flows to the larger operand.
    #[default]
    Max,
    /// Maximum with pass-through gradient to both operands.
    PassthroughMax,
}

impl Aggregation {
    pub fn combine<B: Backend, const D: usize>(
        &self,
        a: Tensor<B, D>,
        b: Tensor<B, D>,
    ) -> Tensor<B, D> {
        match self {
            Aggregation::Max => a.max_pair(b),
            Aggregation::PassthroughMax => passthrough_max(a, b),
        }
    }
}

/// `max(a, b)` whose gradient is passed unchanged to both `a` and `b`.
pub fn passthrough_max<B: Backend, const D: usize>(
    a: Tensor<B, D>,
    b: Tensor<B, D>,
) -> Tensor<B, D> {
    // x - detach(x) is exactly zero for finite x but carries d/dx = 1.
    // Each operand gets its own zero so large inputs cannot overflow.
    let zero_a = a.clone() - a.clone().detach();
    let zero_b = b.clone() - b.clone().detach();
    let max = a.max_pair(b).detach();
    zero_a + zero_b + max
}

/// Cumulative maximum along the time axis of a [batch, time, channels]
/// sequence: step `t` holds the element-wise maximum of steps `0..=t`.
pub fn running_max<B: Backend>(sequence: Tensor<B, 3>, aggregation: Aggregation) -> Tensor<B, 3> {
    let [batch, time, channels] = sequence.dims();
    if time <= 1 {
        return sequence;
    }

    let step = |t: usize| {
        sequence
            .clone()
            .slice([0..batch, t..t + 1, 0..channels])
    };

    let mut current = step(0);
    let mut outputs = Vec::with_capacity(time);
    outputs.push(current.clone());

    for t in 1..time {
        current = aggregation.combine(current, step(t));
        outputs.push(current.clone());
    }

    Tensor::cat(outputs, 1)
}
