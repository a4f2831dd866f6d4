//! Engine errors
//!
//! Internal failures are typed; the `prove`/`query`/`abduce` boundary
//! catches them and converts to failure results, so none of these cross
//! into caller code under normal operation.

use thiserror::Error;

/// Result alias for engine internals.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures raised while a call is in flight.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Wall time exceeded the per-call envelope.
    #[error("Timeout exceeded")]
    Timeout,

    /// The global per-call step counter ran out.
    #[error("Step limit exceeded ({limit} steps)")]
    StepLimit { limit: usize },

    /// Malformed goal or pattern.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A collaborator (vector runtime, parser) failed.
    #[error("External error: {0}")]
    External(String),
}

impl From<noema_hdc::HdcError> for EngineError {
    fn from(err: noema_hdc::HdcError) -> Self {
        EngineError::External(err.to_string())
    }
}
