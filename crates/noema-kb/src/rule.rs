//! Rules and condition trees

use crate::error::{KbError, Result};
use noema_core::{Statement, Term};
use noema_hdc::Vector;
use serde::{Deserialize, Serialize};

/// Parsed premise structure of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConditionTree {
    Leaf {
        ast: Statement,
        #[serde(skip)]
        vector: Option<Vector>,
    },
    And(Vec<ConditionTree>),
    Or(Vec<ConditionTree>),
    Not(Box<ConditionTree>),
}

impl ConditionTree {
    /// Build a tree from a condition statement, recognising `And` / `Or` /
    /// `Not` connective operators (capitalised or not) and treating
    /// everything else as a leaf.
    pub fn from_statement(stmt: &Statement) -> Self {
        match stmt.operator.as_str() {
            "And" | "and" => ConditionTree::And(Self::sub_trees(stmt)),
            "Or" | "or" => ConditionTree::Or(Self::sub_trees(stmt)),
            "Not" | "not" => match stmt.negation_inner() {
                Some(inner) => {
                    ConditionTree::Not(Box::new(ConditionTree::from_statement(&inner)))
                }
                None => ConditionTree::Leaf {
                    ast: stmt.clone(),
                    vector: None,
                },
            },
            _ => ConditionTree::Leaf {
                ast: stmt.clone(),
                vector: None,
            },
        }
    }

    fn sub_trees(stmt: &Statement) -> Vec<ConditionTree> {
        stmt.args
            .iter()
            .map(|arg| match arg {
                Term::Compound(inner) => ConditionTree::from_statement(inner),
                other => ConditionTree::Leaf {
                    ast: Statement::new(other.token(), Vec::new()),
                    vector: None,
                },
            })
            .collect()
    }

    /// Leaf statements in left-to-right order, negated leaves included.
    pub fn leaves(&self) -> Vec<&Statement> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Statement>) {
        match self {
            ConditionTree::Leaf { ast, .. } => out.push(ast),
            ConditionTree::And(parts) | ConditionTree::Or(parts) => {
                for part in parts {
                    part.collect_leaves(out);
                }
            }
            ConditionTree::Not(inner) => inner.collect_leaves(out),
        }
    }
}

/// A rule: *condition ⇒ conclusion*.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: u64,
    pub name: String,
    /// Original DSL line the rule was loaded from.
    pub source: String,
    pub has_variables: bool,
    pub condition: Statement,
    pub conclusion: Statement,
    pub condition_tree: ConditionTree,
    #[serde(skip)]
    pub conclusion_vector: Option<Vector>,
    /// Constructivist level of the conclusion concept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conclusion_level: Option<u32>,
    /// Highest level among premise concepts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_premise_level: Option<u32>,
}

impl Rule {
    /// Build a rule, enforcing the variable-safety invariant: every
    /// variable in the conclusion must occur in the condition.
    pub fn new(id: u64, condition: Statement, conclusion: Statement) -> Result<Self> {
        let condition_vars = condition.variables();
        for conclusion_var in conclusion.variables() {
            if !condition_vars.contains(&conclusion_var) {
                return Err(KbError::UnsafeRuleVariable {
                    rule: conclusion.to_string(),
                    variable: conclusion_var,
                });
            }
        }
        let has_variables = !condition_vars.is_empty() || !conclusion.variables().is_empty();
        let source = format!("Implies ({condition}) ({conclusion})");
        let name = format!("{}_{id}", conclusion.operator);
        Ok(Self {
            id,
            name,
            source,
            has_variables,
            condition_tree: ConditionTree::from_statement(&condition),
            condition,
            conclusion,
            conclusion_vector: None,
            conclusion_level: None,
            max_premise_level: None,
        })
    }

    /// Conclusion leaves usable as evidence for a goal. A compound
    /// `And`/`Or` conclusion contributes each positive leaf; the inner of
    /// a `Not` conclusion is never evidence for the positive form.
    pub fn conclusion_leaves(&self) -> Vec<Statement> {
        match self.conclusion.operator.as_str() {
            "And" | "and" | "Or" | "or" => self
                .conclusion
                .args
                .iter()
                .filter_map(|arg| match arg {
                    Term::Compound(inner) if inner.operator != "Not" => Some(inner.clone()),
                    Term::Compound(_) => None,
                    _ => None,
                })
                .collect(),
            "Not" | "not" => Vec::new(),
            _ => vec![self.conclusion.clone()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noema_core::var;

    #[test]
    fn rejects_unsafe_conclusion_variables() {
        let condition = Statement::new("human", vec![var("x")]);
        let conclusion = Statement::new("knows", vec![var("x"), var("y")]);
        assert!(matches!(
            Rule::new(0, condition, conclusion),
            Err(KbError::UnsafeRuleVariable { variable, .. }) if variable == "y"
        ));
    }

    #[test]
    fn builds_condition_tree_from_connectives() {
        let condition = Statement::new(
            "And",
            vec![
                Term::Compound(Statement::new("human", vec![var("x")])),
                Term::Compound(Statement::new("mortal", vec![var("x")])),
            ],
        );
        let tree = ConditionTree::from_statement(&condition);
        match tree {
            ConditionTree::And(parts) => {
                assert_eq!(parts.len(), 2);
                assert!(matches!(parts[0], ConditionTree::Leaf { .. }));
            }
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn not_conclusion_yields_no_positive_evidence() {
        let condition = Statement::new("wet", vec![var("x")]);
        let conclusion = Statement::new(
            "Not",
            vec![Term::Compound(Statement::new("dry", vec![var("x")]))],
        );
        let rule = Rule::new(1, condition, conclusion).unwrap();
        assert!(rule.conclusion_leaves().is_empty());
    }
}
