//! The [`Scalar`] trait for writing AD-generic numeric code.
//!
//! Functions written as `fn f<T: Scalar>(x: T) -> T` work transparently with
//! plain field values (`f64`, `Complex<f64>`, ...) and with [`BReverse`]
//! variables recorded on a bytecode tape.

use std::fmt::{Debug, Display};
use std::ops::{Add, Mul, Neg, Sub};

use num_complex::Complex;

use crate::breverse::BReverse;
use crate::bytecode_tape::BtapeThreadLocal;
use crate::field::Field;

/// The central trait for AD-generic numeric code.
///
/// Only ring operations are required: every expression the factorization
/// residuals need (products, differences, squares, sums and scaling by a
/// constant) is expressible without division.
pub trait Scalar:
    Copy
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + Debug
    + Display
    + 'static
{
    /// The underlying field type recorded on the tape.
    type Field: Field;

    /// Lift a plain field value to this scalar (constant, zero derivative).
    fn from_f(val: Self::Field) -> Self;

    /// Extract the primal value.
    fn value(&self) -> Self::Field;

    /// Elementwise square.
    fn square(self) -> Self;

    /// The additive identity.
    #[inline]
    fn zero() -> Self {
        Self::from_f(<Self::Field as num_traits::Zero>::zero())
    }
}

macro_rules! plain_scalar {
    ($t:ty) => {
        impl Scalar for $t {
            type Field = $t;

            #[inline]
            fn from_f(val: $t) -> Self {
                val
            }

            #[inline]
            fn value(&self) -> $t {
                *self
            }

            #[inline]
            fn square(self) -> Self {
                self * self
            }
        }
    };
}

plain_scalar!(f32);
plain_scalar!(f64);
plain_scalar!(Complex<f32>);
plain_scalar!(Complex<f64>);

impl<F: Field + BtapeThreadLocal> Scalar for BReverse<F> {
    type Field = F;

    #[inline]
    fn from_f(val: F) -> Self {
        BReverse::constant(val)
    }

    #[inline]
    fn value(&self) -> F {
        self.value
    }

    #[inline]
    fn square(self) -> Self {
        BReverse::square(self)
    }
}
