//! Per-cell structural masks.
//!
//! A mask classifies every cell of an `n × n` matrix exactly once. The
//! initializer consults it to decide what to write, and the optimizer
//! consults it to decide what it may update.

use factorad::Field;

/// Classification of a single matrix cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellKind<F> {
    /// Trainable.
    Free,
    /// Held at a constant (e.g. the unit diagonal of `L`).
    Fixed(F),
    /// Held at zero (outside the allowed triangle).
    ZeroLocked,
}

impl<F: Field> CellKind<F> {
    #[inline]
    pub fn is_free(&self) -> bool {
        matches!(self, CellKind::Free)
    }

    /// The value a non-free cell is pinned to, `None` for free cells.
    #[inline]
    pub fn pinned_value(&self) -> Option<F> {
        match *self {
            CellKind::Free => None,
            CellKind::Fixed(c) => Some(c),
            CellKind::ZeroLocked => Some(F::zero()),
        }
    }
}

/// Structural mask over an `n × n` grid, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralMask<F> {
    n: usize,
    cells: Vec<CellKind<F>>,
}

impl<F: Field> StructuralMask<F> {
    /// Classify each cell with `f(row, col)`.
    pub fn from_fn(n: usize, mut f: impl FnMut(usize, usize) -> CellKind<F>) -> Self {
        let mut cells = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                cells.push(f(i, j));
            }
        }
        StructuralMask { n, cells }
    }

    /// Every cell trainable.
    pub fn free(n: usize) -> Self {
        Self::from_fn(n, |_, _| CellKind::Free)
    }

    /// Lower triangle (diagonal included) trainable, upper zero-locked.
    pub fn lower(n: usize) -> Self {
        Self::from_fn(n, |i, j| if j <= i { CellKind::Free } else { CellKind::ZeroLocked })
    }

    /// Strictly-lower trainable, unit diagonal, upper zero-locked.
    pub fn lower_unit(n: usize) -> Self {
        Self::from_fn(n, |i, j| match j.cmp(&i) {
            std::cmp::Ordering::Less => CellKind::Free,
            std::cmp::Ordering::Equal => CellKind::Fixed(F::one()),
            std::cmp::Ordering::Greater => CellKind::ZeroLocked,
        })
    }

    /// Upper triangle (diagonal included) trainable, lower zero-locked.
    pub fn upper(n: usize) -> Self {
        Self::from_fn(n, |i, j| if j >= i { CellKind::Free } else { CellKind::ZeroLocked })
    }

    /// Strictly-upper trainable, unit diagonal, lower zero-locked.
    pub fn upper_unit(n: usize) -> Self {
        Self::from_fn(n, |i, j| match j.cmp(&i) {
            std::cmp::Ordering::Greater => CellKind::Free,
            std::cmp::Ordering::Equal => CellKind::Fixed(F::one()),
            std::cmp::Ordering::Less => CellKind::ZeroLocked,
        })
    }

    /// Diagonal trainable, everything else zero-locked.
    pub fn diagonal(n: usize) -> Self {
        Self::from_fn(n, |i, j| if i == j { CellKind::Free } else { CellKind::ZeroLocked })
    }

    /// Side length.
    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn kind(&self, row: usize, col: usize) -> CellKind<F> {
        self.cells[row * self.n + col]
    }

    #[inline]
    pub fn is_free(&self, row: usize, col: usize) -> bool {
        self.kind(row, col).is_free()
    }

    /// Row-major classification of every cell.
    #[inline]
    pub fn cells(&self) -> &[CellKind<F>] {
        &self.cells
    }

    /// Number of trainable cells.
    pub fn free_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_free()).count()
    }

    /// Row-major 0/1 indicator of the zero-locked cells.
    pub fn zero_locked_indicator(&self) -> Vec<F> {
        self.cells
            .iter()
            .map(|c| match c {
                CellKind::ZeroLocked => F::one(),
                _ => F::zero(),
            })
            .collect()
    }
}
