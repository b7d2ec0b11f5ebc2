use factorad::{Complex, Field};
use num_traits::Float;

use crate::convergence::{clip_scale, global_norm, ConvergenceParams};
use crate::error::{FactorError, Result};
use crate::objective::Objective;
use crate::parameter::Parameter;
use crate::result::{
    ConvergenceState, FactorResult, SolverState, TerminationReason, TrajectoryPoint,
};
use crate::schedule::DiagonalUnlock;

/// Configuration for projected gradient descent.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "F: serde::Serialize, F::Real: serde::Serialize",
        deserialize = "F: serde::Deserialize<'de>, F::Real: serde::Deserialize<'de>"
    ))
)]
pub struct ProjectedDescentConfig<F: Field> {
    /// Step `η`. May be complex for complex-valued parameters.
    pub learning_rate: F,
    /// Convergence parameters.
    pub convergence: ConvergenceParams<F::Real>,
    /// Optional diagonal-unlock schedule for one parameter.
    pub unlock: Option<DiagonalUnlock>,
}

impl<F: Field> ProjectedDescentConfig<F> {
    pub fn new(learning_rate: F, convergence: ConvergenceParams<F::Real>) -> Self {
        ProjectedDescentConfig {
            learning_rate,
            convergence,
            unlock: None,
        }
    }

    pub fn with_unlock(mut self, unlock: DiagonalUnlock) -> Self {
        self.unlock = Some(unlock);
        self
    }
}

impl ProjectedDescentConfig<Complex<f64>> {
    /// Complex LU-style tasks: `η = 0.1 + 0.1i`, `ε = 1`, budget 262144.
    pub fn lu_complex() -> Self {
        ProjectedDescentConfig::new(
            Complex::new(0.1, 0.1),
            ConvergenceParams {
                max_iter: 262_144,
                epsilon: 1.0,
            },
        )
    }
}

impl ProjectedDescentConfig<f64> {
    /// Real eigen-style tasks over `[V, Λ]`: `η = 1`, `ε = 5e-12`, and the
    /// diagonal of `Λ` unlocked one entry every 1000 iterations.
    pub fn eigen() -> Self {
        ProjectedDescentConfig::new(
            1.0,
            ConvergenceParams {
                max_iter: 262_144,
                epsilon: 5e-12,
            },
        )
        .with_unlock(DiagonalUnlock::new(1, 1000))
    }
}

/// Gradient-clipped projected gradient descent.
///
/// Each iteration zeroes every gradient accumulator, evaluates the cost and
/// its gradient, scales the step by the global gradient norm clip and
/// updates the free cells of every parameter in place. Fixed and zero-locked
/// cells are never written. The run stops when the cost magnitude seen by an
/// iteration falls below `epsilon`, or when the budget is spent.
///
/// Exhausting the budget is a normal outcome; errors are reserved for
/// evaluation failures of `obj` and an out-of-range unlock schedule.
pub fn projected_descent<F: Field, O: Objective<F>>(
    obj: &mut O,
    params: &mut [Parameter<F>],
    config: &ProjectedDescentConfig<F>,
) -> Result<FactorResult<F>> {
    if let Some(unlock) = config.unlock {
        if unlock.parameter >= params.len() {
            return Err(FactorError::dimension(format!(
                "unlock schedule targets parameter {} of {}",
                unlock.parameter,
                params.len()
            )));
        }
    }

    let conv = &config.convergence;
    let free: usize = params.iter().map(|p| p.mask().free_count()).sum();
    log::debug!(
        "projected descent: {} parameters, {free} free cells, eta {}, epsilon {}, budget {}",
        params.len(),
        config.learning_rate,
        conv.epsilon,
        conv.max_iter
    );

    let mut trajectory = Vec::with_capacity(conv.max_iter.min(1 << 16));
    let mut state = ConvergenceState::new();
    let mut func_evals = 0usize;

    if conv.max_iter == 0 {
        let value = obj.forward(params)?;
        return Ok(FactorResult {
            value,
            iterations: 0,
            func_evals: 1,
            termination: TerminationReason::MaxIterations,
            trajectory,
        });
    }

    loop {
        let iter = state.iteration;

        for p in params.iter_mut() {
            p.zero_grad();
        }
        let value = obj.forward(params)?;
        obj.backward(params)?;
        func_evals += 1;

        let norm = global_norm(params);
        let step = config.learning_rate * F::from_real(clip_scale(norm));
        for (idx, p) in params.iter_mut().enumerate() {
            let gate = config.unlock.filter(|u| u.parameter == idx);
            apply_step(p, step, gate, iter);
        }

        let cost = value.modulus();
        trajectory.push(TrajectoryPoint {
            iteration: iter,
            log10_cost: cost.log10(),
        });
        log::trace!("iter {iter}: |cost| = {cost}, |g| = {norm}");

        match state.observe(cost, conv.epsilon, conv.max_iter) {
            SolverState::Running => {}
            terminal => {
                let termination = if terminal == SolverState::Converged {
                    TerminationReason::Converged
                } else {
                    TerminationReason::MaxIterations
                };
                log::debug!(
                    "projected descent stopped after {} iterations: {termination} (|cost| = {cost})",
                    state.iteration
                );
                return Ok(FactorResult {
                    value,
                    iterations: state.iteration,
                    func_evals,
                    termination,
                    trajectory,
                });
            }
        }
    }
}

/// `value ← value − step · g` on the free cells of `p`, honouring `gate`.
fn apply_step<F: Field>(
    p: &mut Parameter<F>,
    step: F,
    gate: Option<DiagonalUnlock>,
    iter: usize,
) {
    let n = p.n();
    let unlocked = gate.map(|g| g.unlocked_count(iter, n));
    let (mask, values, grad) = p.split_mut();
    for (k, ((v, &g), cell)) in values.iter_mut().zip(grad).zip(mask.cells()).enumerate() {
        if !cell.is_free() {
            continue;
        }
        let (row, col) = (k / n, k % n);
        if let Some(count) = unlocked {
            if row == col && row >= count {
                continue;
            }
        }
        *v = *v - step * g;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::StructuralMask;

    /// `Σ (x − 3)²` over a single parameter, with a hand-written gradient.
    struct Quadratic {
        evals: usize,
    }

    impl Objective<f64> for Quadratic {
        fn num_parameters(&self) -> usize {
            1
        }

        fn forward(&mut self, params: &[Parameter<f64>]) -> Result<f64> {
            self.evals += 1;
            Ok(params[0].values().iter().map(|x| (x - 3.0) * (x - 3.0)).sum())
        }

        fn backward(&mut self, params: &mut [Parameter<f64>]) -> Result<()> {
            let p = &mut params[0];
            let grads: Vec<f64> = p.values().iter().map(|x| 2.0 * (x - 3.0)).collect();
            for (g, d) in p.grad_mut().iter_mut().zip(grads) {
                *g += d;
            }
            Ok(())
        }
    }

    #[test]
    fn locked_cells_never_move() {
        let mut params =
            vec![Parameter::with_values("l", StructuralMask::lower_unit(3), vec![0.0; 9]).unwrap()];
        let config = ProjectedDescentConfig::new(
            0.1,
            ConvergenceParams {
                max_iter: 50,
                epsilon: 1e-30,
            },
        );
        let res = projected_descent(&mut Quadratic { evals: 0 }, &mut params, &config).unwrap();
        assert_eq!(res.termination, TerminationReason::MaxIterations);
        assert_eq!(res.iterations, 50);
        assert_eq!(res.trajectory.len(), 50);
        let p = &params[0];
        for i in 0..3 {
            assert_eq!(p.value(i, i), 1.0);
            for j in (i + 1)..3 {
                assert_eq!(p.value(i, j), 0.0);
            }
        }
        assert!(p.value(2, 0) > 0.0);
    }

    #[test]
    fn gated_diagonal_waits_for_unlock() {
        let mut params =
            vec![Parameter::with_values("d", StructuralMask::diagonal(2), vec![0.0; 4]).unwrap()];
        let config = ProjectedDescentConfig::new(
            0.1,
            ConvergenceParams {
                max_iter: 5,
                epsilon: 1e-30,
            },
        )
        .with_unlock(DiagonalUnlock::new(0, 3));
        projected_descent(&mut Quadratic { evals: 0 }, &mut params, &config).unwrap();
        // iterations 3 and 4 unlock entry 0 only
        assert!(params[0].value(0, 0) > 0.0);
        assert_eq!(params[0].value(1, 1), 0.0);
    }

    #[test]
    fn unlock_out_of_range_is_rejected() {
        let mut params =
            vec![Parameter::with_values("d", StructuralMask::diagonal(2), vec![0.0; 4]).unwrap()];
        let config = ProjectedDescentConfig::eigen();
        let err = projected_descent(&mut Quadratic { evals: 0 }, &mut params, &config);
        assert!(matches!(err, Err(FactorError::InvalidDimension(_))));
    }

    #[test]
    fn zero_budget_evaluates_once() {
        let mut params =
            vec![Parameter::with_values("x", StructuralMask::free(1), vec![1.0]).unwrap()];
        let config = ProjectedDescentConfig::new(
            0.1,
            ConvergenceParams {
                max_iter: 0,
                epsilon: 1e-6,
            },
        );
        let mut obj = Quadratic { evals: 0 };
        let res = projected_descent(&mut obj, &mut params, &config).unwrap();
        assert_eq!(res.iterations, 0);
        assert_eq!(res.value, 4.0);
        assert_eq!(obj.evals, 1);
        assert_eq!(params[0].values(), &[1.0]);
    }
}
