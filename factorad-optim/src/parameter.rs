use factorad::{Field, Matrix};
use rand::Rng;

use crate::error::{FactorError, Result};
use crate::init::{Initializer, SampleField};
use crate::mask::StructuralMask;

/// A named, structurally-constrained `n × n` matrix with its gradient
/// accumulator.
///
/// Values are only written by the initializer and by the optimizer's masked
/// update; the gradient buffer is zeroed before every backward pass.
#[derive(Debug, Clone)]
pub struct Parameter<F: Field> {
    name: String,
    mask: StructuralMask<F>,
    values: Vec<F>,
    grad: Vec<F>,
}

impl<F: Field> Parameter<F> {
    /// Draw a fresh parameter for `mask` from `init`.
    pub fn initialize<R: Rng>(
        name: impl Into<String>,
        mask: StructuralMask<F>,
        init: &mut Initializer<R>,
    ) -> Result<Self>
    where
        F: SampleField,
    {
        let values = init.fill(&mask)?;
        Ok(Self::from_parts(name.into(), mask, values))
    }

    /// Build a parameter from explicit row-major values, projected onto
    /// `mask`: fixed cells take their constant and zero-locked cells `0`.
    pub fn with_values(
        name: impl Into<String>,
        mask: StructuralMask<F>,
        mut values: Vec<F>,
    ) -> Result<Self> {
        let n = mask.n();
        if n == 0 {
            return Err(FactorError::dimension("matrix size must be at least 1"));
        }
        if values.len() != n * n {
            return Err(FactorError::dimension(format!(
                "expected {} values for a {n}x{n} parameter, got {}",
                n * n,
                values.len()
            )));
        }
        for (v, cell) in values.iter_mut().zip(mask.cells()) {
            if let Some(pinned) = cell.pinned_value() {
                *v = pinned;
            }
        }
        Ok(Self::from_parts(name.into(), mask, values))
    }

    fn from_parts(name: String, mask: StructuralMask<F>, values: Vec<F>) -> Self {
        let grad = vec![F::zero(); values.len()];
        Parameter {
            name,
            mask,
            values,
            grad,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Side length.
    #[inline]
    pub fn n(&self) -> usize {
        self.mask.n()
    }

    #[inline]
    pub fn mask(&self) -> &StructuralMask<F> {
        &self.mask
    }

    #[inline]
    pub fn values(&self) -> &[F] {
        &self.values
    }

    #[inline]
    pub fn value(&self, row: usize, col: usize) -> F {
        self.values[row * self.n() + col]
    }

    /// Gradient accumulated by the last backward pass.
    #[inline]
    pub fn grad(&self) -> &[F] {
        &self.grad
    }

    #[inline]
    pub(crate) fn grad_mut(&mut self) -> &mut [F] {
        &mut self.grad
    }

    /// Mask, values and gradient borrowed together for the masked update.
    #[inline]
    pub(crate) fn split_mut(&mut self) -> (&StructuralMask<F>, &mut [F], &[F]) {
        (&self.mask, &mut self.values, &self.grad)
    }

    /// Reset the gradient accumulator.
    pub fn zero_grad(&mut self) {
        self.grad.fill(F::zero());
    }

    /// Sum of squared gradient moduli over every cell, masked or not.
    pub fn grad_norm_sqr(&self) -> F::Real {
        self.grad
            .iter()
            .fold(<F::Real as num_traits::Zero>::zero(), |acc, g| acc + g.modulus_sqr())
    }

    /// The diagonal entries.
    pub fn diagonal(&self) -> Vec<F> {
        (0..self.n()).map(|i| self.value(i, i)).collect()
    }

    /// Copy the values into a [`Matrix`].
    pub fn to_matrix(&self) -> Matrix<F> {
        let n = self.n();
        Matrix::new(n, n, self.values.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_values_projects_onto_mask() {
        let p = Parameter::with_values(
            "l",
            StructuralMask::lower_unit(2),
            vec![9.0_f64, 9.0, 0.5, 9.0],
        )
        .unwrap();
        assert_eq!(p.values(), &[1.0, 0.0, 0.5, 1.0]);
        assert_eq!(p.grad(), &[0.0; 4]);
    }

    #[test]
    fn with_values_rejects_wrong_length() {
        let err = Parameter::with_values("u", StructuralMask::upper(3), vec![1.0_f64; 4]);
        assert!(matches!(err, Err(FactorError::InvalidDimension(_))));
    }
}
