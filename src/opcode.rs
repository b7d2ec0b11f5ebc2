//! Bytecode opcodes for the bytecode tape.
//!
//! Each opcode represents an elementary field operation. The [`eval_forward`]
//! and [`reverse_partials`] functions evaluate / differentiate a single
//! opcode. Every operation is holomorphic, so the same partials hold for real
//! and complex operands.

use crate::field::Field;

/// Sentinel used in `arg_indices[1]` for unary ops (the second argument slot is unused).
pub const UNUSED: u32 = u32::MAX;

/// Elementary operation codes for the bytecode tape.
///
/// Binary ops use both `arg_indices` slots; unary ops use slot 0 only
/// (slot 1 = [`UNUSED`]).
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpCode {
    // ── Structural ──
    /// Input variable (leaf node).
    Input,
    /// Scalar constant.
    Const,

    // ── Binary arithmetic ──
    Add,
    Sub,
    Mul,
    Div,

    // ── Unary ──
    Neg,
    Recip,
    /// `x * x`, kept separate from `Mul` so elementwise squares cost one
    /// tape entry with a single operand.
    Square,
}

impl OpCode {
    /// Whether the op reads `arg_indices[1]`.
    #[inline]
    pub fn is_binary(self) -> bool {
        matches!(self, OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div)
    }
}

/// Evaluate a single opcode in the forward direction.
///
/// For unary ops, `a` is the operand value and `b` is ignored.
#[inline]
pub fn eval_forward<T: Field>(op: OpCode, a: T, b: T) -> T {
    match op {
        OpCode::Input | OpCode::Const => {
            // values are already set during tape setup
            unreachable!("Input/Const should not be re-evaluated via eval_forward")
        }

        OpCode::Add => a + b,
        OpCode::Sub => a - b,
        OpCode::Mul => a * b,
        OpCode::Div => a / b,

        OpCode::Neg => -a,
        OpCode::Recip => T::one() / a,
        OpCode::Square => a * a,
    }
}

/// Compute reverse-mode partials `(∂r/∂a, ∂r/∂b)` for a single opcode,
/// given operand values `a`, `b` and result `r`.
#[inline]
pub fn reverse_partials<T: Field>(op: OpCode, a: T, b: T, r: T) -> (T, T) {
    let zero = T::zero();
    let one = T::one();
    match op {
        OpCode::Input | OpCode::Const => (zero, zero),

        OpCode::Add => (one, one),
        OpCode::Sub => (one, -one),
        OpCode::Mul => (b, a),
        OpCode::Div => {
            let inv = one / b;
            (inv, -a * inv * inv)
        }

        OpCode::Neg => (-one, zero),
        // d/da (1/a) = -1/a² = -r²
        OpCode::Recip => (-(r * r), zero),
        OpCode::Square => (a + a, zero),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn square_partial_is_twice_operand() {
        let (da, db) = reverse_partials(OpCode::Square, 3.0_f64, 0.0, 9.0);
        assert_eq!(da, 6.0);
        assert_eq!(db, 0.0);
    }

    #[test]
    fn complex_div_partials() {
        let a = Complex64::new(1.0, 2.0);
        let b = Complex64::new(0.5, -1.0);
        let r = eval_forward(OpCode::Div, a, b);
        let (da, db) = reverse_partials(OpCode::Div, a, b, r);
        let expected_da = Complex64::new(1.0, 0.0) / b;
        let expected_db = -a / (b * b);
        assert!((da - expected_da).norm() < 1e-14);
        assert!((db - expected_db).norm() < 1e-14);
    }

    #[test]
    fn recip_partial_uses_result() {
        let r = eval_forward(OpCode::Recip, 4.0_f64, 0.0);
        let (da, _) = reverse_partials(OpCode::Recip, 4.0, 0.0, r);
        assert_eq!(da, -1.0 / 16.0);
    }
}
