//! Structured matrix factorizations found by gradient descent.
//!
//! A factorization is posed as a residual identity over structurally
//! masked parameters (for example `A − L·U` with unit-lower `L` and upper
//! `U`), recorded once as a [`factorad`] tape, and minimised with
//! gradient-clipped projected descent that only ever writes the free cells.
//!
//! ```
//! use factorad::Matrix;
//! use factorad_optim::{
//!     projected_descent, ConvergenceParams, CostGraph, FactorizationCost, Identity,
//!     Initializer, Parameter, ProjectedDescentConfig, StructuralMask,
//! };
//!
//! let a = Matrix::from_rows(&[[4.0, 3.0], [6.0, 3.0]]);
//! let mut init = Initializer::seeded(42).with_scale(0.1);
//! let mut params = vec![
//!     Parameter::initialize("l", StructuralMask::lower_unit(2), &mut init)?,
//!     Parameter::initialize("u", StructuralMask::upper(2), &mut init)?,
//! ];
//! let mut cost = CostGraph::declare(&FactorizationCost::new(Identity::Lu), &a, &params)?;
//! let config = ProjectedDescentConfig::new(
//!     0.1,
//!     ConvergenceParams { max_iter: 100_000, epsilon: 1e-6 },
//! );
//! let result = projected_descent(&mut cost, &mut params, &config)?;
//! assert!(result.iterations > 0);
//! # Ok::<(), factorad_optim::FactorError>(())
//! ```

pub mod convergence;
pub mod cost;
pub mod error;
pub mod init;
pub mod linalg;
pub mod mask;
pub mod objective;
pub mod parameter;
pub mod report;
pub mod result;
pub mod schedule;
pub mod solvers;
pub mod verify;

pub use convergence::{clip_scale, global_norm, ConvergenceParams};
pub use cost::{CostGraph, FactorizationCost, Identity, Reduction};
pub use error::{FactorError, Result};
pub use init::{Initializer, SampleField};
pub use linalg::{determinant, determinant_matrix};
pub use mask::{CellKind, StructuralMask};
pub use objective::Objective;
pub use parameter::Parameter;
pub use result::{ConvergenceState, FactorResult, SolverState, TerminationReason, TrajectoryPoint};
pub use schedule::DiagonalUnlock;
pub use solvers::projected::{projected_descent, ProjectedDescentConfig};
pub use verify::{
    determinant_check, reconstruction_error, verify_factor, DeterminantCheck, Verification,
};
