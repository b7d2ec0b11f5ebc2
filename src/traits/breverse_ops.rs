//! `std::ops` implementations for [`BReverse<F>`].
//!
//! Each operator records an opcode to the active bytecode tape. Operations
//! whose operands are all untracked constants are folded without touching
//! the tape.

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num_complex::Complex;

use crate::breverse::BReverse;
use crate::bytecode_tape::{self, BtapeThreadLocal, BytecodeTape, CONSTANT};
use crate::field::Field;
use crate::opcode::{OpCode, UNUSED};

/// Ensure a BReverse operand has a valid tape index. If it's a constant
/// (index == CONSTANT), promote it to a `Const` entry on the tape.
#[inline]
fn ensure_on_tape<F: Field>(x: &BReverse<F>, tape: &mut BytecodeTape<F>) -> u32 {
    if x.index == CONSTANT {
        tape.push_const(x.value)
    } else {
        x.index
    }
}

/// Record a binary op, promoting constants as needed.
#[inline]
fn brev_binary_op<F: Field + BtapeThreadLocal>(
    lhs: BReverse<F>,
    rhs: BReverse<F>,
    op: OpCode,
    value: F,
) -> BReverse<F> {
    if lhs.is_constant() && rhs.is_constant() {
        return BReverse::constant(value);
    }
    let index = bytecode_tape::with_active_btape(|t| {
        let li = ensure_on_tape(&lhs, t);
        let ri = ensure_on_tape(&rhs, t);
        t.push_op(op, li, ri, value)
    });
    BReverse { value, index }
}

// ──────────────────────────────────────────────
//  BReverse<F> ↔ BReverse<F> operators
// ──────────────────────────────────────────────

impl<F: Field + BtapeThreadLocal> Add for BReverse<F> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        brev_binary_op(self, rhs, OpCode::Add, self.value + rhs.value)
    }
}

impl<F: Field + BtapeThreadLocal> Sub for BReverse<F> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        brev_binary_op(self, rhs, OpCode::Sub, self.value - rhs.value)
    }
}

impl<F: Field + BtapeThreadLocal> Mul for BReverse<F> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        brev_binary_op(self, rhs, OpCode::Mul, self.value * rhs.value)
    }
}

impl<F: Field + BtapeThreadLocal> Div for BReverse<F> {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        brev_binary_op(self, rhs, OpCode::Div, self.value / rhs.value)
    }
}

impl<F: Field + BtapeThreadLocal> Neg for BReverse<F> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        let value = -self.value;
        if self.is_constant() {
            return BReverse::constant(value);
        }
        let index =
            bytecode_tape::with_active_btape(|t| t.push_op(OpCode::Neg, self.index, UNUSED, value));
        BReverse { value, index }
    }
}

// Assign variants delegate to the binary ops.
impl<F: Field + BtapeThreadLocal> AddAssign for BReverse<F> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<F: Field + BtapeThreadLocal> SubAssign for BReverse<F> {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<F: Field + BtapeThreadLocal> MulAssign for BReverse<F> {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl<F: Field + BtapeThreadLocal> DivAssign for BReverse<F> {
    #[inline]
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

// ──────────────────────────────────────────────
//  Mixed ops: BReverse<F> with plain field values
// ──────────────────────────────────────────────

// The plain value is promoted to a Const entry on the bytecode tape.
macro_rules! impl_breverse_scalar_ops {
    ($f:ty) => {
        impl_breverse_scalar_ops!(@op $f, Add, add, OpCode::Add);
        impl_breverse_scalar_ops!(@op $f, Sub, sub, OpCode::Sub);
        impl_breverse_scalar_ops!(@op $f, Mul, mul, OpCode::Mul);
        impl_breverse_scalar_ops!(@op $f, Div, div, OpCode::Div);
    };
    (@op $f:ty, $trait:ident, $method:ident, $op:expr) => {
        impl $trait<$f> for BReverse<$f> {
            type Output = BReverse<$f>;
            #[inline]
            fn $method(self, rhs: $f) -> BReverse<$f> {
                brev_binary_op(self, BReverse::constant(rhs), $op, self.value.$method(rhs))
            }
        }

        impl $trait<BReverse<$f>> for $f {
            type Output = BReverse<$f>;
            #[inline]
            fn $method(self, rhs: BReverse<$f>) -> BReverse<$f> {
                brev_binary_op(BReverse::constant(self), rhs, $op, self.$method(rhs.value))
            }
        }
    };
}

impl_breverse_scalar_ops!(f32);
impl_breverse_scalar_ops!(f64);
impl_breverse_scalar_ops!(Complex<f32>);
impl_breverse_scalar_ops!(Complex<f64>);

// ── Comparison ──

impl<F: Field> PartialEq for BReverse<F> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}
