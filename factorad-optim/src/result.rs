use std::fmt;

use factorad::Field;
use num_traits::Float;

/// One point of the cost trajectory: `(iteration, log10 |cost|)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrajectoryPoint<R> {
    pub iteration: usize,
    pub log10_cost: R,
}

/// Lifecycle of a descent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    Running,
    Converged,
    BudgetExhausted,
}

/// The stop-condition tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceState<R> {
    /// Iterations completed.
    pub iteration: usize,
    /// `|cost|` seen by the most recent iteration.
    pub last_cost: R,
    pub state: SolverState,
}

impl<R: Float> ConvergenceState<R> {
    pub fn new() -> Self {
        ConvergenceState {
            iteration: 0,
            last_cost: R::infinity(),
            state: SolverState::Running,
        }
    }

    /// Record a finished iteration with cost magnitude `cost` and decide
    /// whether to continue. Terminal states are sticky.
    pub fn observe(&mut self, cost: R, epsilon: R, max_iter: usize) -> SolverState {
        if self.state != SolverState::Running {
            return self.state;
        }
        self.iteration += 1;
        self.last_cost = cost;
        self.state = if cost < epsilon {
            SolverState::Converged
        } else if self.iteration >= max_iter {
            SolverState::BudgetExhausted
        } else {
            SolverState::Running
        };
        self.state
    }
}

impl<R: Float> Default for ConvergenceState<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a projected descent run.
#[derive(Debug, Clone)]
pub struct FactorResult<F: Field> {
    /// Cost at the start of the final iteration.
    pub value: F,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Total number of cost evaluations.
    pub func_evals: usize,
    /// Reason for termination.
    pub termination: TerminationReason,
    /// `(iteration, log10 |cost|)` for every iteration, in order.
    pub trajectory: Vec<TrajectoryPoint<F::Real>>,
}

impl<F: Field> FactorResult<F> {
    pub fn converged(&self) -> bool {
        self.termination == TerminationReason::Converged
    }
}

/// Why the optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TerminationReason {
    /// `|cost|` fell below epsilon.
    Converged,
    /// Reached the iteration budget.
    MaxIterations,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::Converged => write!(f, "cost below tolerance"),
            TerminationReason::MaxIterations => write!(f, "maximum iterations reached"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converged_takes_priority_over_budget() {
        let mut s = ConvergenceState::<f64>::new();
        assert_eq!(s.observe(0.5, 1.0, 1), SolverState::Converged);
        assert_eq!(s.iteration, 1);
    }

    #[test]
    fn budget_is_terminal() {
        let mut s = ConvergenceState::<f64>::new();
        assert_eq!(s.observe(5.0, 1.0, 2), SolverState::Running);
        assert_eq!(s.observe(5.0, 1.0, 2), SolverState::BudgetExhausted);
        assert_eq!(s.observe(0.0, 1.0, 2), SolverState::BudgetExhausted);
        assert_eq!(s.iteration, 2);
    }
}
