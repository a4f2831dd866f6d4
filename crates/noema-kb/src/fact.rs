//! Facts
//!
//! Facts are append-only in ordinary operation. Derived facts carry a
//! provenance link to the rule that produced them. `Not` facts keep the
//! expanded inner form in metadata so negations index as first-class
//! tuples.

use noema_core::Statement;
use noema_hdc::Vector;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbolic payload of a fact. This is the persisted part; the vector is
/// rebuilt from it on restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactMetadata {
    pub operator: String,
    pub args: Vec<String>,
    /// Inserted by forward chaining rather than loaded from a theory.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub derived: bool,
    /// Expanded operator of a `Not` fact's inner statement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_operator: Option<String>,
    /// Expanded arguments of a `Not` fact's inner statement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_args: Option<Vec<String>>,
    /// Rule that derived this fact.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<String>,
}

impl FactMetadata {
    /// Metadata for a statement, expanding `Not` inner forms when
    /// recoverable.
    pub fn from_statement(stmt: &Statement) -> Self {
        let (inner_operator, inner_args) = match stmt.negation_inner() {
            Some(inner) => (Some(inner.operator.clone()), Some(inner.arg_tokens())),
            None => (None, None),
        };
        Self {
            operator: stmt.operator.clone(),
            args: stmt.arg_tokens(),
            derived: false,
            inner_operator,
            inner_args,
            proof: None,
        }
    }

    /// The statement this metadata describes.
    pub fn statement(&self) -> Statement {
        Statement::from_tokens(self.operator.clone(), &self.args)
    }

    /// Inner positive statement of a `Not` fact, when recorded.
    pub fn inner_statement(&self) -> Option<Statement> {
        match (&self.inner_operator, &self.inner_args) {
            (Some(op), Some(args)) => Some(Statement::from_tokens(op.clone(), args)),
            _ => None,
        }
    }
}

/// A stored fact: dense id, optional vector, symbolic metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub id: u64,
    #[serde(skip)]
    pub vector: Option<Vector>,
    pub metadata: FactMetadata,
}

impl Fact {
    /// DSL rendering of the fact, e.g. `isA Rex Dog`.
    pub fn rendered(&self) -> String {
        let mut out = self.metadata.operator.clone();
        for arg in &self.metadata.args {
            out.push(' ');
            out.push_str(arg);
        }
        out
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rendered())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_facts_expand_inner_metadata() {
        let stmt = Statement::binary("can", "Penguin", "Fly").negated();
        let meta = FactMetadata::from_statement(&stmt);
        assert_eq!(meta.operator, "Not");
        assert_eq!(meta.inner_operator.as_deref(), Some("can"));
        assert_eq!(
            meta.inner_args.as_deref(),
            Some(&["Penguin".to_string(), "Fly".to_string()][..])
        );
        assert_eq!(
            meta.inner_statement().unwrap().to_string(),
            "can Penguin Fly"
        );
    }

    #[test]
    fn metadata_round_trips_to_statement() {
        let stmt = Statement::binary("isA", "Rex", "Dog");
        let meta = FactMetadata::from_statement(&stmt);
        assert_eq!(meta.statement(), stmt);
    }
}
