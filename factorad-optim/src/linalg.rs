use factorad::{Field, Matrix};

use crate::error::{FactorError, Result};

/// Determinant of the top-left `n × n` block of a row-major buffer with row
/// stride `stride`, by cofactor expansion along the first row.
///
/// Scratch space for every minor is allocated once, one `stride × stride`
/// slab per recursion depth, and reused across the whole expansion. Cost is
/// `O(n!)`, so this is meant for the small factors the solver produces.
///
/// Fails with [`FactorError::InvalidDimension`] when `n == 0`, when
/// `stride < n`, or when `buf` holds fewer than `n · stride` entries.
pub fn determinant<F: Field>(buf: &[F], n: usize, stride: usize) -> Result<F> {
    if n == 0 {
        return Err(FactorError::dimension("determinant of a 0x0 matrix"));
    }
    if stride < n {
        return Err(FactorError::dimension(format!(
            "row stride {stride} is smaller than n = {n}"
        )));
    }
    if buf.len() < n * stride {
        return Err(FactorError::dimension(format!(
            "buffer of {} entries cannot hold {n} rows of stride {stride}",
            buf.len()
        )));
    }

    let mut scratch = vec![F::zero(); stride * stride * (n - 1)];
    Ok(cofactor(buf, n, stride, &mut scratch))
}

/// Determinant of a square [`Matrix`].
pub fn determinant_matrix<F: Field>(m: &Matrix<F>) -> Result<F> {
    if !m.is_square() {
        return Err(FactorError::dimension(format!(
            "determinant of a non-square {}x{} matrix",
            m.rows(),
            m.cols()
        )));
    }
    determinant(m.as_slice(), m.rows(), m.cols())
}

// Explicit indexing: minors are copied with the parent's stride
#[allow(clippy::needless_range_loop)]
fn cofactor<F: Field>(m: &[F], n: usize, stride: usize, scratch: &mut [F]) -> F {
    if n == 1 {
        return m[0];
    }
    let (minor, deeper) = scratch.split_at_mut(stride * stride);
    let mut det = F::zero();
    for f in 0..n {
        for i in 1..n {
            let mut c = 0;
            for j in 0..n {
                if j == f {
                    continue;
                }
                minor[(i - 1) * stride + c] = m[i * stride + j];
                c += 1;
            }
        }
        let term = m[f] * cofactor(minor, n - 1, stride, deeper);
        det = if f % 2 == 0 { det + term } else { det - term };
    }
    det
}
