use std::fmt::{Debug, Display};
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_complex::Complex;
use num_traits::{Float as NumFloat, FloatConst, FromPrimitive, One, Zero};

/// Marker trait for base scalar types recorded on the tape (`f32`, `f64`,
/// `Complex<f32>`, `Complex<f64>`).
///
/// Only the four field operations are required, so a recorded expression is
/// holomorphic in every complex input and the reverse sweep yields the
/// complex derivative `∂cost/∂z` directly. AD wrapper types do not implement
/// this trait.
pub trait Field:
    Copy
    + PartialEq
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Send
    + Sync
    + Default
    + Debug
    + Display
    + 'static
{
    /// The real type underlying this field (`Self` for real fields).
    type Real: NumFloat
        + FloatConst
        + FromPrimitive
        + Send
        + Sync
        + Default
        + Debug
        + Display
        + 'static;

    /// Embed a real number.
    fn from_real(re: Self::Real) -> Self;

    /// Modulus `|x|` (absolute value for real fields).
    fn modulus(&self) -> Self::Real;

    /// Squared modulus `|x|²`.
    fn modulus_sqr(&self) -> Self::Real;

    /// Both components finite.
    fn is_finite(&self) -> bool;

    /// Embed a count, e.g. the divisor of a mean.
    #[inline]
    fn from_usize(n: usize) -> Self {
        Self::from_real(Self::Real::from_usize(n).unwrap_or_else(Self::Real::nan))
    }
}

macro_rules! real_field {
    ($t:ty) => {
        impl Field for $t {
            type Real = $t;

            #[inline]
            fn from_real(re: $t) -> Self {
                re
            }

            #[inline]
            fn modulus(&self) -> $t {
                self.abs()
            }

            #[inline]
            fn modulus_sqr(&self) -> $t {
                self * self
            }

            #[inline]
            fn is_finite(&self) -> bool {
                <$t>::is_finite(*self)
            }
        }
    };
}

macro_rules! complex_field {
    ($t:ty) => {
        impl Field for Complex<$t> {
            type Real = $t;

            #[inline]
            fn from_real(re: $t) -> Self {
                Complex::new(re, 0.0)
            }

            #[inline]
            fn modulus(&self) -> $t {
                self.norm()
            }

            #[inline]
            fn modulus_sqr(&self) -> $t {
                self.norm_sqr()
            }

            #[inline]
            fn is_finite(&self) -> bool {
                self.re.is_finite() && self.im.is_finite()
            }
        }
    };
}

real_field!(f32);
real_field!(f64);
complex_field!(f32);
complex_field!(f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complex_modulus_is_euclidean() {
        let z = Complex::new(3.0_f64, 4.0);
        assert_eq!(z.modulus(), 5.0);
        assert_eq!(z.modulus_sqr(), 25.0);
    }

    #[test]
    fn real_modulus_is_abs() {
        assert_eq!((-2.5_f32).modulus(), 2.5);
        assert!(!f64::NAN.is_finite());
        assert_eq!(<f64 as Field>::from_usize(4), 4.0);
    }
}
