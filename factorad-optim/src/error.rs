use thiserror::Error;

/// Failures surfaced by the factorization pipeline.
///
/// Running out of iterations is not an error: it is reported as
/// [`TerminationReason::MaxIterations`](crate::TerminationReason::MaxIterations).
#[derive(Debug, Error)]
pub enum FactorError {
    /// A matrix size is zero, or two shapes that must agree do not.
    #[error("invalid dimension: {0}")]
    InvalidDimension(String),
    /// The recorded cost expression could not be evaluated.
    #[error("engine evaluation failed: {0}")]
    EngineEvaluation(String),
    /// The cost plot could not be written.
    #[error("render failed: {0}")]
    Render(String),
}

impl FactorError {
    pub(crate) fn dimension(msg: impl Into<String>) -> Self {
        FactorError::InvalidDimension(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, FactorError>;
