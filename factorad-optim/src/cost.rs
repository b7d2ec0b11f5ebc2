//! Declaring factorization residuals as recorded cost graphs.

use factorad::{record, BReverse, BtapeThreadLocal, BytecodeTape, Field, Matrix, Scalar};

use crate::error::{FactorError, Result};
use crate::objective::Objective;
use crate::parameter::Parameter;

/// The algebraic identity a factorization should satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Identity {
    /// `A − L·Uᵗ` over `[L, U]`.
    SkewLu,
    /// `A − L·U` over `[L, U]`.
    Lu,
    /// `A·V − Vᵗ·Λ` over `[V, Λ]`.
    Eigen,
}

impl Identity {
    /// Number of parameters the identity is declared over.
    pub fn arity(self) -> usize {
        2
    }

    /// The residual matrix for `target` and `params`.
    pub fn residual<T: Scalar>(self, target: &Matrix<T>, params: &[Matrix<T>]) -> Matrix<T> {
        let (p, q) = (&params[0], &params[1]);
        match self {
            Identity::SkewLu => target.sub(&p.matmul(&q.transpose())),
            Identity::Lu => target.sub(&p.matmul(q)),
            Identity::Eigen => target.matmul(p).sub(&p.transpose().matmul(q)),
        }
    }
}

/// How the squared residual is reduced to a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Reduction {
    #[default]
    Mean,
    Sum,
}

impl Reduction {
    pub fn apply<T: Scalar>(self, m: &Matrix<T>) -> T {
        match self {
            Reduction::Mean => m.mean(),
            Reduction::Sum => m.sum(),
        }
    }
}

/// A factorization cost: identity, reduction and optional structural penalty.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FactorizationCost<F> {
    pub identity: Identity,
    pub reduction: Reduction,
    /// Weight of `Σ (x ∘ zero_locked)²` added to the residual, if any.
    pub penalty: Option<F>,
}

impl<F: Field> FactorizationCost<F> {
    /// Mean-squared residual of `identity`, no penalty.
    pub fn new(identity: Identity) -> Self {
        FactorizationCost {
            identity,
            reduction: Reduction::Mean,
            penalty: None,
        }
    }

    pub fn with_reduction(mut self, reduction: Reduction) -> Self {
        self.reduction = reduction;
        self
    }

    pub fn with_penalty(mut self, weight: F) -> Self {
        self.penalty = Some(weight);
        self
    }

    /// Evaluate the cost on any scalar type.
    ///
    /// `indicators` holds, per parameter, the 0/1 matrix of its zero-locked
    /// cells; it is only read when a penalty is configured.
    pub fn evaluate<T: Scalar<Field = F>>(
        &self,
        target: &Matrix<T>,
        params: &[Matrix<T>],
        indicators: &[Matrix<F>],
    ) -> T {
        let residual = self.identity.residual(target, params);
        let mut cost = self.reduction.apply(&residual.squared());
        if let Some(weight) = self.penalty {
            let mut penalty = T::zero();
            for (p, ind) in params.iter().zip(indicators) {
                penalty = penalty + p.hadamard(&Matrix::lift(ind)).squared().sum();
            }
            cost = cost + penalty * T::from_f(weight);
        }
        cost
    }
}

/// A cost expression recorded once onto a [`BytecodeTape`] and replayed on
/// every evaluation.
pub struct CostGraph<F: Field> {
    tape: BytecodeTape<F>,
    sizes: Vec<usize>,
    inputs: Vec<F>,
    adjoints: Vec<F>,
    evals: usize,
}

impl<F: Field + BtapeThreadLocal> CostGraph<F> {
    /// Record a factorization cost against `target`.
    ///
    /// `params` must match the identity's arity and every parameter must
    /// share the target's (square) shape.
    pub fn declare(
        cost: &FactorizationCost<F>,
        target: &Matrix<F>,
        params: &[Parameter<F>],
    ) -> Result<Self> {
        if !target.is_square() || target.rows() == 0 {
            return Err(FactorError::dimension(format!(
                "target must be square and non-empty, got {}x{}",
                target.rows(),
                target.cols()
            )));
        }
        if params.len() != cost.identity.arity() {
            return Err(FactorError::dimension(format!(
                "{:?} takes {} parameters, got {}",
                cost.identity,
                cost.identity.arity(),
                params.len()
            )));
        }
        if let Some(p) = params.iter().find(|p| p.n() != target.rows()) {
            return Err(FactorError::dimension(format!(
                "parameter `{}` is {n}x{n}, target is {m}x{m}",
                p.name(),
                n = p.n(),
                m = target.rows()
            )));
        }

        let indicators: Vec<Matrix<F>> = params
            .iter()
            .map(|p| Matrix::new(p.n(), p.n(), p.mask().zero_locked_indicator()))
            .collect();
        let cost = *cost;
        let target = target.clone();
        Self::record_with(params, move |mats| {
            cost.evaluate(&Matrix::lift(&target), mats, &indicators)
        })
    }

    /// Record an arbitrary scalar cost over `params`.
    ///
    /// The closure receives one `n × n` matrix of tape variables per
    /// parameter, in order, and runs exactly once.
    pub fn record_with(
        params: &[Parameter<F>],
        f: impl FnOnce(&[Matrix<BReverse<F>>]) -> BReverse<F>,
    ) -> Result<Self> {
        if params.is_empty() {
            return Err(FactorError::dimension("a cost needs at least one parameter"));
        }
        let sizes: Vec<usize> = params.iter().map(|p| p.n()).collect();
        let inputs: Vec<F> = params.iter().flat_map(|p| p.values().iter().copied()).collect();

        let (tape, value) = record(
            |x| {
                let mut mats = Vec::with_capacity(sizes.len());
                let mut offset = 0;
                for &n in &sizes {
                    mats.push(Matrix::new(n, n, x[offset..offset + n * n].to_vec()));
                    offset += n * n;
                }
                f(&mats)
            },
            &inputs,
        );
        log::debug!(
            "recorded cost graph: {} inputs, {} tape entries, initial cost {}",
            tape.num_inputs(),
            tape.num_ops(),
            value
        );

        Ok(CostGraph {
            tape,
            sizes,
            inputs,
            adjoints: Vec::new(),
            evals: 0,
        })
    }

    /// Number of forward evaluations performed so far.
    pub fn evals(&self) -> usize {
        self.evals
    }

    /// Borrow the underlying tape.
    pub fn tape(&self) -> &BytecodeTape<F> {
        &self.tape
    }

    fn check_layout(&self, params: &[Parameter<F>]) -> Result<()> {
        let matches = params.len() == self.sizes.len()
            && params.iter().zip(&self.sizes).all(|(p, &n)| p.n() == n);
        if matches {
            Ok(())
        } else {
            Err(FactorError::EngineEvaluation(format!(
                "parameter layout {:?} does not match recorded layout {:?}",
                params.iter().map(|p| p.n()).collect::<Vec<_>>(),
                self.sizes
            )))
        }
    }
}

impl<F: Field + BtapeThreadLocal> Objective<F> for CostGraph<F> {
    fn num_parameters(&self) -> usize {
        self.sizes.len()
    }

    fn forward(&mut self, params: &[Parameter<F>]) -> Result<F> {
        self.check_layout(params)?;
        self.inputs.clear();
        for p in params {
            self.inputs.extend_from_slice(p.values());
        }
        self.tape.forward(&self.inputs);
        self.evals += 1;

        let value = self.tape.output_value();
        if !value.is_finite() {
            return Err(FactorError::EngineEvaluation(format!(
                "cost evaluated to {value} after {} evaluations",
                self.evals
            )));
        }
        Ok(value)
    }

    fn backward(&mut self, params: &mut [Parameter<F>]) -> Result<()> {
        self.check_layout(params)?;
        self.tape.reverse_into(&mut self.adjoints);
        let mut offset = 0;
        for p in params.iter_mut() {
            let len = p.grad().len();
            for (g, &a) in p.grad_mut().iter_mut().zip(&self.adjoints[offset..offset + len]) {
                *g = *g + a;
            }
            offset += len;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::StructuralMask;
    use approx::assert_relative_eq;

    fn lu_params(l: Vec<f64>, u: Vec<f64>) -> Vec<Parameter<f64>> {
        vec![
            Parameter::with_values("l", StructuralMask::lower_unit(2), l).unwrap(),
            Parameter::with_values("u", StructuralMask::upper(2), u).unwrap(),
        ]
    }

    #[test]
    fn exact_factors_have_zero_cost() {
        let a = Matrix::from_rows(&[[4.0, 3.0], [6.0, 3.0]]);
        let params = lu_params(vec![1.0, 0.0, 1.5, 1.0], vec![4.0, 3.0, 0.0, -1.5]);
        let mut graph = CostGraph::declare(&FactorizationCost::new(Identity::Lu), &a, &params)
            .unwrap();
        assert_eq!(graph.forward(&params).unwrap(), 0.0);
    }

    #[test]
    fn gradient_matches_closed_form() {
        // cost = mean((A - L U)^2), dcost/dU = -2/N * Lᵗ R
        let a = Matrix::from_rows(&[[4.0, 3.0], [6.0, 3.0]]);
        let mut params = lu_params(vec![1.0, 0.0, 0.5, 1.0], vec![1.0, 2.0, 0.0, 1.0]);
        let mut graph = CostGraph::declare(&FactorizationCost::new(Identity::Lu), &a, &params)
            .unwrap();
        graph.forward(&params).unwrap();
        graph.backward(&mut params).unwrap();

        let l = params[0].to_matrix();
        let u = params[1].to_matrix();
        let r = a.sub(&l.matmul(&u));
        let expected_u = l.transpose().matmul(&r).scale(-0.5);
        let expected_l = r.matmul(&u.transpose()).scale(-0.5);
        for k in 0..4 {
            assert!((params[1].grad()[k] - expected_u.as_slice()[k]).abs() < 1e-12);
            assert!((params[0].grad()[k] - expected_l.as_slice()[k]).abs() < 1e-12);
        }
    }

    #[test]
    fn backward_accumulates() {
        let a = Matrix::from_rows(&[[1.0, 0.0], [0.0, 1.0]]);
        let mut params = lu_params(vec![1.0, 0.0, 0.3, 1.0], vec![0.2, 0.1, 0.0, 0.4]);
        let mut graph = CostGraph::declare(&FactorizationCost::new(Identity::Lu), &a, &params)
            .unwrap();
        graph.forward(&params).unwrap();
        graph.backward(&mut params).unwrap();
        let once = params[1].grad().to_vec();
        graph.backward(&mut params).unwrap();
        for (twice, g) in params[1].grad().iter().zip(&once) {
            assert!((twice - 2.0 * g).abs() < 1e-12);
        }
    }

    #[test]
    fn penalty_vanishes_on_projected_parameters() {
        let a = Matrix::from_rows(&[[4.0, 3.0], [6.0, 3.0]]);
        let params = lu_params(vec![1.0, 0.0, 1.5, 1.0], vec![4.0, 3.0, 0.0, -1.5]);
        let cost = FactorizationCost::new(Identity::Lu).with_penalty(10.0);
        let mut graph = CostGraph::declare(&cost, &a, &params).unwrap();
        // Exact factors with clean zero-locked cells: no penalty.
        assert_eq!(graph.forward(&params).unwrap(), 0.0);
    }

    #[test]
    fn penalty_weights_zero_locked_entries() {
        let a = Matrix::from_rows(&[[4.0, 3.0], [6.0, 3.0]]);
        let declared = lu_params(vec![1.0, 0.0, 1.5, 1.0], vec![4.0, 3.0, 0.0, -1.5]);
        let cost = FactorizationCost::new(Identity::Lu).with_penalty(10.0);
        let mut graph = CostGraph::declare(&cost, &a, &declared).unwrap();

        // same layout, but u(1, 0) escaped the upper-triangular structure
        let mut params = vec![
            declared[0].clone(),
            Parameter::with_values("u", StructuralMask::free(2), vec![4.0, 3.0, 0.5, -1.5])
                .unwrap(),
        ];
        // residual [[0, 0], [-0.5, 0]] -> mean 0.0625, penalty 10 * 0.5²
        let value = graph.forward(&params).unwrap();
        assert_relative_eq!(value, 0.0625 + 2.5, epsilon = 1e-12);

        graph.backward(&mut params).unwrap();
        // -0.5 (Lᵗ R)₁₀ = 0.25 from the residual, 2 · 10 · 0.5 from the penalty
        assert_relative_eq!(params[1].grad()[2], 0.25 + 10.0, epsilon = 1e-12);
        // u(0, 0) is free: residual part only, -0.5 (Lᵗ R)₀₀
        assert_relative_eq!(params[1].grad()[0], 0.375, epsilon = 1e-12);
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let a = Matrix::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        let params = lu_params(vec![1.0; 4], vec![1.0; 4]);
        let err = CostGraph::declare(&FactorizationCost::new(Identity::Lu), &a, &params);
        assert!(matches!(err, Err(FactorError::InvalidDimension(_))));
    }

    #[test]
    fn layout_change_is_an_engine_failure() {
        let a = Matrix::from_rows(&[[4.0, 3.0], [6.0, 3.0]]);
        let params = lu_params(vec![1.0; 4], vec![1.0; 4]);
        let mut graph = CostGraph::declare(&FactorizationCost::new(Identity::Lu), &a, &params)
            .unwrap();
        let err = graph.forward(&params[..1]);
        assert!(matches!(err, Err(FactorError::EngineEvaluation(_))));
    }
}
