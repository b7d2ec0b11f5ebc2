//! Post-run checks on learned factors.
//!
//! None of these gate the result: they are computed for the caller to
//! compare, print or assert on.

use factorad::{Field, Matrix, Scalar};
use num_traits::{FromPrimitive, One, Zero};

use crate::cost::Identity;
use crate::error::{FactorError, Result};
use crate::linalg::determinant;
use crate::parameter::Parameter;

/// Determinant of a factor next to the product of its diagonal.
///
/// For a triangular factor the two agree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verification<F> {
    pub diagonal_product: F,
    pub determinant: F,
}

impl<F: Field> Verification<F> {
    /// `|diagonal_product − determinant|`.
    pub fn discrepancy(&self) -> F::Real {
        (self.diagonal_product - self.determinant).modulus()
    }
}

/// Compute the [`Verification`] of one factor.
pub fn verify_factor<F: Field>(factor: &Parameter<F>) -> Result<Verification<F>> {
    let diagonal_product = factor
        .diagonal()
        .into_iter()
        .fold(F::one(), |acc, d| acc * d);
    let n = factor.n();
    let determinant = determinant(factor.values(), n, n)?;
    Ok(Verification {
        diagonal_product,
        determinant,
    })
}

/// `det(A)` next to `det(P) · det(Q)` for a two-factor identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeterminantCheck<F> {
    pub target: F,
    pub factors: F,
}

impl<F: Field> DeterminantCheck<F> {
    /// `|target − factors|`.
    pub fn discrepancy(&self) -> F::Real {
        (self.target - self.factors).modulus()
    }
}

/// Cross-check `det(A)` against the product of the factor determinants.
pub fn determinant_check<F: Field>(
    target: &Matrix<F>,
    left: &Parameter<F>,
    right: &Parameter<F>,
) -> Result<DeterminantCheck<F>> {
    if !target.is_square() || left.n() != target.rows() || right.n() != target.rows() {
        return Err(FactorError::dimension(format!(
            "factors {}x{n} and {}x{m} do not match a {}x{} target",
            left.n(),
            right.n(),
            target.rows(),
            target.cols(),
            n = left.n(),
            m = right.n()
        )));
    }
    let n = target.rows();
    let target = determinant(target.as_slice(), n, n)?;
    let factors = determinant(left.values(), n, n)? * determinant(right.values(), n, n)?;
    Ok(DeterminantCheck { target, factors })
}

/// Mean of `|R|²` over the residual `R` of `identity` at the current
/// parameter values.
///
/// Uses the same expression code as the recorded cost, evaluated on plain
/// values, with the squared modulus in place of the holomorphic square.
pub fn reconstruction_error<F>(
    identity: Identity,
    target: &Matrix<F>,
    params: &[Parameter<F>],
) -> Result<F::Real>
where
    F: Field + Scalar<Field = F>,
{
    if params.len() != identity.arity() {
        return Err(FactorError::dimension(format!(
            "{identity:?} takes {} parameters, got {}",
            identity.arity(),
            params.len()
        )));
    }
    if !target.is_square() || params.iter().any(|p| p.n() != target.rows()) {
        return Err(FactorError::dimension(
            "parameters must match the target's shape",
        ));
    }
    let mats: Vec<Matrix<F>> = params.iter().map(Parameter::to_matrix).collect();
    let residual = identity.residual(target, &mats);
    let cells = residual.as_slice();
    let total = cells
        .iter()
        .fold(F::Real::zero(), |acc, r| acc + r.modulus_sqr());
    let count = F::Real::from_usize(cells.len()).unwrap_or_else(F::Real::one);
    Ok(total / count)
}
