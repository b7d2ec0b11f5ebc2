//! Dense row-major matrices over any [`Scalar`].
//!
//! The same expression code evaluates plain values (`Matrix<f64>`) and records
//! a differentiable graph (`Matrix<BReverse<f64>>`), so a factorization
//! residual is written once and reused by both the cost graph and the
//! verifier.

use std::fmt;

use crate::field::Field;
use crate::scalar::Scalar;

/// A dense `rows × cols` matrix stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Copy> Matrix<T> {
    /// Wrap a row-major buffer. Panics if `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> Self {
        assert_eq!(data.len(), rows * cols, "buffer does not match shape");
        Matrix { rows, cols, data }
    }

    /// Build a matrix from a function of `(row, col)`.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Matrix { rows, cols, data }
    }

    /// Build a matrix from nested rows. Panics on ragged input.
    pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> Self {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            let row = row.as_ref();
            assert_eq!(row.len(), cols, "ragged rows");
            data.extend_from_slice(row);
        }
        Matrix {
            rows: rows.len(),
            cols,
            data,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `true` when `rows == cols`.
    #[inline]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row * self.cols + col] = value;
    }

    /// Row-major view of the entries.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Apply `f` to every entry.
    pub fn map<U: Copy>(&self, f: impl FnMut(T) -> U) -> Matrix<U> {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().copied().map(f).collect(),
        }
    }

    /// `Mᵗ`.
    pub fn transpose(&self) -> Self {
        Matrix::from_fn(self.cols, self.rows, |i, j| self.get(j, i))
    }
}

impl<T: Scalar> Matrix<T> {
    /// Lift a plain matrix into this scalar type as constants.
    pub fn lift(m: &Matrix<T::Field>) -> Self {
        m.map(T::from_f)
    }

    /// The `n × n` identity.
    pub fn identity(n: usize) -> Self {
        let one = T::from_f(<T::Field as num_traits::One>::one());
        Matrix::from_fn(n, n, |i, j| if i == j { one } else { T::zero() })
    }

    /// Primal values of every entry.
    pub fn values(&self) -> Matrix<T::Field> {
        self.map(|x| x.value())
    }

    /// Matrix product `self · rhs`.
    pub fn matmul(&self, rhs: &Self) -> Self {
        assert_eq!(self.cols, rhs.rows, "matmul shape mismatch");
        Matrix::from_fn(self.rows, rhs.cols, |i, j| {
            let mut acc = self.get(i, 0) * rhs.get(0, j);
            for k in 1..self.cols {
                acc = acc + self.get(i, k) * rhs.get(k, j);
            }
            acc
        })
    }

    /// Elementwise `self − rhs`.
    pub fn sub(&self, rhs: &Self) -> Self {
        self.zip_with(rhs, |a, b| a - b)
    }

    /// Elementwise `self + rhs`.
    pub fn add(&self, rhs: &Self) -> Self {
        self.zip_with(rhs, |a, b| a + b)
    }

    /// Elementwise (Hadamard) product.
    pub fn hadamard(&self, rhs: &Self) -> Self {
        self.zip_with(rhs, |a, b| a * b)
    }

    /// Elementwise square.
    pub fn squared(&self) -> Self {
        self.map(T::square)
    }

    /// Multiply every entry by `k`.
    pub fn scale(&self, k: T) -> Self {
        self.map(|x| x * k)
    }

    /// Sum of all entries.
    pub fn sum(&self) -> T {
        self.data
            .iter()
            .copied()
            .reduce(|acc, x| acc + x)
            .unwrap_or_else(T::zero)
    }

    /// Mean of all entries.
    pub fn mean(&self) -> T {
        let one = <T::Field as num_traits::One>::one();
        let inv = one / T::Field::from_usize(self.data.len());
        self.sum() * T::from_f(inv)
    }

    fn zip_with(&self, rhs: &Self, mut f: impl FnMut(T, T) -> T) -> Self {
        assert_eq!(
            (self.rows, self.cols),
            (rhs.rows, rhs.cols),
            "elementwise shape mismatch"
        );
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(rhs.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }
}

impl<T: Copy + fmt::Display> fmt::Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            for j in 0..self.cols {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", self.get(i, j))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matmul_small() {
        let a = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]);
        let b = Matrix::from_rows(&[[0.0, 1.0], [1.0, 0.0]]);
        let c = a.matmul(&b);
        assert_eq!(c, Matrix::from_rows(&[[2.0, 1.0], [4.0, 3.0]]));
    }

    #[test]
    fn transpose_non_square() {
        let a = Matrix::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let t = a.transpose();
        assert_eq!((t.rows(), t.cols()), (3, 2));
        assert_eq!(t.get(2, 1), 6.0);
    }

    #[test]
    fn mean_of_squares() {
        let a = Matrix::from_rows(&[[1.0_f64, -2.0], [3.0, 0.0]]);
        assert_eq!(a.squared().sum(), 14.0);
        assert_eq!(a.squared().mean(), 3.5);
    }

    #[test]
    fn identity_is_neutral() {
        let a = Matrix::from_rows(&[[1.5_f64, 2.0], [-3.0, 4.0]]);
        assert_eq!(Matrix::identity(2).matmul(&a), a);
    }
}
