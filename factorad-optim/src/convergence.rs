use factorad::Field;
use num_traits::{Float, Zero};

use crate::parameter::Parameter;

/// Parameters controlling when projected descent stops.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvergenceParams<R> {
    /// Iteration budget (default: 262144).
    pub max_iter: usize,
    /// Stop once `|cost| < epsilon` (default: 1e-6 for `f64`, 1e-4 for `f32`).
    pub epsilon: R,
}

impl Default for ConvergenceParams<f64> {
    fn default() -> Self {
        ConvergenceParams {
            max_iter: 262_144,
            epsilon: 1e-6,
        }
    }
}

impl Default for ConvergenceParams<f32> {
    fn default() -> Self {
        ConvergenceParams {
            max_iter: 262_144,
            epsilon: 1e-4,
        }
    }
}

/// `√(Σ_params Σ_cells |g|²)` over every cell, free or not.
pub fn global_norm<F: Field>(params: &[Parameter<F>]) -> F::Real {
    params
        .iter()
        .fold(F::Real::zero(), |acc, p| acc + p.grad_norm_sqr())
        .sqrt()
}

/// Gradient clipping factor: `1` if `norm ≤ 1`, else `1 / norm`.
pub fn clip_scale<R: Float>(norm: R) -> R {
    if norm <= R::one() {
        R::one()
    } else {
        norm.recip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_is_identity_below_one() {
        assert_eq!(clip_scale(0.0_f64), 1.0);
        assert_eq!(clip_scale(1.0_f64), 1.0);
        assert_eq!(clip_scale(4.0_f64), 0.25);
    }
}
