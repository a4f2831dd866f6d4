//! Core error type

use thiserror::Error;

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Failures raised while constructing or rendering core data.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A statement was built without an operator.
    #[error("Statement has no operator")]
    MissingOperator,

    /// Serialisation of a result or snapshot failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
