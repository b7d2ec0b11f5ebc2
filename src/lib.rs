//! Re-evaluable reverse-mode automatic differentiation over real and complex
//! scalars, with dense matrix expressions on top.
//!
//! A cost expression is recorded once with [`record`] into a
//! [`BytecodeTape`], then replayed with [`BytecodeTape::forward`] and
//! differentiated with [`BytecodeTape::reverse_into`] as many times as needed.

pub mod api;
pub mod breverse;
pub mod bytecode_tape;
pub mod field;
pub mod matrix;
pub mod opcode;
pub mod scalar;
mod traits;

pub use api::{grad, record};
pub use breverse::BReverse;
pub use bytecode_tape::{BtapeThreadLocal, BytecodeTape};
pub use field::Field;
pub use matrix::Matrix;
pub use num_complex::{Complex, Complex32, Complex64};
pub use scalar::Scalar;

/// Type alias for bytecode-tape reverse-mode variables over `f64`.
pub type BReverse64 = BReverse<f64>;
/// Type alias for bytecode-tape reverse-mode variables over `f32`.
pub type BReverse32 = BReverse<f32>;
/// Type alias for bytecode-tape reverse-mode variables over `Complex<f64>`.
pub type BReverseC64 = BReverse<Complex64>;
