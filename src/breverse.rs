//! Bytecode-tape reverse-mode AD variable.
//!
//! [`BReverse<F>`] records opcodes to a [`BytecodeTape`](crate::bytecode_tape::BytecodeTape)
//! so that the recorded expression can be re-evaluated at different inputs
//! without re-recording.

use std::fmt::{self, Display};

use crate::bytecode_tape::{self, BtapeThreadLocal, CONSTANT};
use crate::field::Field;
use crate::opcode::{OpCode, UNUSED};

/// Bytecode-tape reverse-mode AD variable.
///
/// Just a value and a tape index. `Copy` because the tape lives in a
/// thread-local, not inside this struct.
#[derive(Clone, Copy, Debug)]
pub struct BReverse<F: Field> {
    pub(crate) value: F,
    pub(crate) index: u32,
}

impl<F: Field> BReverse<F> {
    /// Create a constant (not tracked on tape).
    #[inline]
    pub fn constant(value: F) -> Self {
        BReverse {
            value,
            index: CONSTANT,
        }
    }

    /// Create from a tape allocation (internal use).
    #[inline]
    pub fn from_tape(value: F, index: u32) -> Self {
        BReverse { value, index }
    }

    /// Get the tape index.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Primal value recorded for this variable.
    #[inline]
    pub fn value(&self) -> F {
        self.value
    }

    /// Whether this variable is a constant not yet promoted to the tape.
    #[inline]
    pub fn is_constant(&self) -> bool {
        self.index == CONSTANT
    }
}

impl<F: Field + BtapeThreadLocal> BReverse<F> {
    /// `self * self`, recorded as a single unary op.
    #[inline]
    pub fn square(self) -> Self {
        unary(self, OpCode::Square, self.value * self.value)
    }

    /// `1 / self`.
    #[inline]
    pub fn recip(self) -> Self {
        unary(self, OpCode::Recip, F::one() / self.value)
    }
}

#[inline]
fn unary<F: Field + BtapeThreadLocal>(x: BReverse<F>, op: OpCode, value: F) -> BReverse<F> {
    if x.is_constant() {
        return BReverse::constant(value);
    }
    let index = bytecode_tape::with_active_btape(|t| t.push_op(op, x.index, UNUSED, value));
    BReverse { value, index }
}

impl<F: Field> Display for BReverse<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<F: Field> Default for BReverse<F> {
    fn default() -> Self {
        BReverse::constant(F::zero())
    }
}
