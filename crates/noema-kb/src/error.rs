//! Knowledge-base errors

use thiserror::Error;

/// Result alias for KB construction.
pub type Result<T> = std::result::Result<T, KbError>;

/// Failures while building facts, rules or indices.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KbError {
    /// A conclusion variable does not occur in the rule's condition.
    #[error("Rule {rule:?} binds conclusion variable ?{variable} nowhere in its condition")]
    UnsafeRuleVariable { rule: String, variable: String },

    /// A declaration statement had the wrong arity.
    #[error("Malformed declaration: {0}")]
    MalformedDeclaration(String),
}
