use factorad::Field;

use crate::error::Result;
use crate::parameter::Parameter;

/// A differentiable cost over a fixed list of [`Parameter`]s.
///
/// This is the whole contract the optimizer needs from a differentiation
/// engine. Methods take `&mut self` to allow cached buffers and eval counting.
pub trait Objective<F: Field> {
    /// Number of parameters the cost was declared over.
    fn num_parameters(&self) -> usize;

    /// Evaluate the cost at the current parameter values.
    fn forward(&mut self, params: &[Parameter<F>]) -> Result<F>;

    /// Accumulate `∂cost/∂parameter` into every parameter's gradient buffer,
    /// at the point of the most recent [`forward`](Self::forward).
    ///
    /// Gradients are added, not assigned: callers zero the accumulators first.
    fn backward(&mut self, params: &mut [Parameter<F>]) -> Result<()>;
}
