//! Vector runtime errors

use thiserror::Error;

/// Result alias for vector operations.
pub type Result<T> = std::result::Result<T, HdcError>;

/// Failures in the vector runtime.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HdcError {
    /// Two vectors of the same strategy disagree on dimensionality.
    #[error("Dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// Operands come from different strategies.
    #[error("Strategy mismatch: {left} vs {right}")]
    StrategyMismatch {
        left: &'static str,
        right: &'static str,
    },

    /// `bundle` was called with no inputs.
    #[error("Cannot bundle zero vectors")]
    EmptyBundle,
}
