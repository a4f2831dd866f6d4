//! Statement AST
//!
//! Statements are immutable after parsing. A statement is an operator token
//! applied to argument terms; a term is an identifier, a literal, a variable
//! (a hole), a named reference into the session scope, or a nested compound
//! statement.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mapping from variable name to ground token.
///
/// Values beginning with `?` denote a still-unbound alias: a rule-conclusion
/// variable that unified with a query hole rather than with a ground token.
pub type Bindings = IndexMap<String, String>;

/// Argument term of a [`Statement`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    /// Bare name: `Tweety`, `isA`
    Identifier(String),
    /// Quoted string or numeral: `"red"`, `42`
    Literal(String),
    /// Hole / logic variable: `?x`
    Variable(String),
    /// Named alias into the session scope: `$pattern`
    Reference(String),
    /// Nested statement: `(can Penguin Fly)`
    Compound(Statement),
}

impl Term {
    /// Ground token rendering used by fact metadata and bindings.
    ///
    /// Variables render as `?name` and references as `$name`, which is the
    /// unbound form [`Statement::instantiate`] leaves in place.
    pub fn token(&self) -> String {
        match self {
            Term::Identifier(name) => name.clone(),
            Term::Literal(value) => value.clone(),
            Term::Variable(name) => format!("?{name}"),
            Term::Reference(name) => format!("${name}"),
            Term::Compound(stmt) => format!("({stmt})"),
        }
    }

    /// True for [`Term::Variable`].
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    /// Variable name without the `?` sigil, if this term is a variable.
    pub fn variable_name(&self) -> Option<&str> {
        match self {
            Term::Variable(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Identifier(name) => write!(f, "{name}"),
            Term::Literal(value) => write!(f, "{value}"),
            Term::Variable(name) => write!(f, "?{name}"),
            Term::Reference(name) => write!(f, "${name}"),
            Term::Compound(stmt) => write!(f, "({stmt})"),
        }
    }
}

/// One parsed statement: `operator arg0 arg1 …`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statement {
    pub operator: String,
    pub args: Vec<Term>,
}

impl Statement {
    pub fn new(operator: impl Into<String>, args: Vec<Term>) -> Self {
        Self {
            operator: operator.into(),
            args,
        }
    }

    /// Statement over plain identifier arguments, the shape of a ground fact.
    pub fn ground(operator: impl Into<String>, args: &[&str]) -> Self {
        Self::new(
            operator,
            args.iter().map(|a| Term::Identifier((*a).to_string())).collect(),
        )
    }

    /// Rebuild a statement from fact metadata (operator + argument tokens).
    ///
    /// Tokens carrying a `?` / `$` sigil round-trip back to variable and
    /// reference terms so that metadata-driven matching sees the same shape
    /// the parser produced.
    pub fn from_tokens(operator: impl Into<String>, args: &[String]) -> Self {
        let args = args
            .iter()
            .map(|token| {
                if let Some(name) = token.strip_prefix('?') {
                    Term::Variable(name.to_string())
                } else if let Some(name) = token.strip_prefix('$') {
                    Term::Reference(name.to_string())
                } else {
                    Term::Identifier(token.clone())
                }
            })
            .collect();
        Self::new(operator, args)
    }

    /// Argument tokens in order, variables rendered as `?name`.
    pub fn arg_tokens(&self) -> Vec<String> {
        self.args.iter().map(Term::token).collect()
    }

    /// True when no argument contains a variable at any depth.
    pub fn is_ground(&self) -> bool {
        fn term_ground(term: &Term) -> bool {
            match term {
                Term::Variable(_) => false,
                Term::Compound(inner) => inner.is_ground(),
                _ => true,
            }
        }
        self.args.iter().all(term_ground)
    }

    /// Every variable name occurring in the statement, in first-seen order.
    pub fn variables(&self) -> Vec<String> {
        let mut out = Vec::new();
        fn walk(term: &Term, out: &mut Vec<String>) {
            match term {
                Term::Variable(name) => {
                    if !out.iter().any(|seen| seen == name) {
                        out.push(name.clone());
                    }
                }
                Term::Compound(inner) => {
                    for arg in &inner.args {
                        walk(arg, out);
                    }
                }
                _ => {}
            }
        }
        for arg in &self.args {
            walk(arg, &mut out);
        }
        out
    }

    /// Substitute bound variables, producing the DSL-like form
    /// `op arg0 … argn`. Unbound variables render as `?name`.
    pub fn instantiate(&self, bindings: &Bindings) -> String {
        let mut parts = vec![self.operator.clone()];
        for arg in &self.args {
            parts.push(Self::instantiate_term(arg, bindings));
        }
        parts.join(" ")
    }

    fn instantiate_term(term: &Term, bindings: &Bindings) -> String {
        match term {
            Term::Variable(name) => bindings
                .get(name.as_str())
                .cloned()
                .unwrap_or_else(|| format!("?{name}")),
            Term::Compound(inner) => format!("({})", inner.instantiate(bindings)),
            other => other.token(),
        }
    }

    /// Statement with bound variables replaced by ground identifier terms.
    pub fn substituted(&self, bindings: &Bindings) -> Statement {
        fn subst(term: &Term, bindings: &Bindings) -> Term {
            match term {
                Term::Variable(name) => match bindings.get(name.as_str()) {
                    Some(token) if !token.starts_with('?') => {
                        Term::Identifier(token.clone())
                    }
                    Some(token) => Term::Variable(token[1..].to_string()),
                    None => term.clone(),
                },
                Term::Compound(inner) => Term::Compound(inner.substituted(bindings)),
                other => other.clone(),
            }
        }
        Statement {
            operator: self.operator.clone(),
            args: self.args.iter().map(|a| subst(a, bindings)).collect(),
        }
    }

    /// For `Not` statements, the inner positive form when recoverable.
    ///
    /// Handles both the compound form `Not (op a b)` and the n-ary expanded
    /// form `Not op a b`. Returns `None` for anything else.
    pub fn negation_inner(&self) -> Option<Statement> {
        if self.operator != "Not" {
            return None;
        }
        match self.args.as_slice() {
            [Term::Compound(inner)] => Some(inner.clone()),
            [Term::Identifier(op), rest @ ..] if !rest.is_empty() => {
                Some(Statement::new(op.clone(), rest.to_vec()))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.operator)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

// Helper constructors
impl Statement {
    pub fn unary(operator: impl Into<String>, arg: impl Into<String>) -> Self {
        Self::new(operator, vec![Term::Identifier(arg.into())])
    }

    pub fn binary(
        operator: impl Into<String>,
        arg0: impl Into<String>,
        arg1: impl Into<String>,
    ) -> Self {
        Self::new(
            operator,
            vec![Term::Identifier(arg0.into()), Term::Identifier(arg1.into())],
        )
    }

    /// Negated form wrapping this statement as a compound argument.
    pub fn negated(self) -> Self {
        Self::new("Not", vec![Term::Compound(self)])
    }
}

pub fn ident(name: impl Into<String>) -> Term {
    Term::Identifier(name.into())
}

pub fn var(name: impl Into<String>) -> Term {
    Term::Variable(name.into())
}

pub fn lit(value: impl Into<String>) -> Term {
    Term::Literal(value.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_dsl_form() {
        let stmt = Statement::binary("isA", "Tweety", "Penguin");
        assert_eq!(stmt.to_string(), "isA Tweety Penguin");
    }

    #[test]
    fn instantiate_substitutes_bound_and_keeps_holes() {
        let stmt = Statement::new("can", vec![var("who"), ident("Fly")]);
        let mut bindings = Bindings::new();
        assert_eq!(stmt.instantiate(&bindings), "can ?who Fly");
        bindings.insert("who".into(), "Tweety".into());
        assert_eq!(stmt.instantiate(&bindings), "can Tweety Fly");
    }

    #[test]
    fn negation_inner_recovers_both_forms() {
        let compound = Statement::binary("can", "Penguin", "Fly").negated();
        assert_eq!(
            compound.negation_inner().unwrap().to_string(),
            "can Penguin Fly"
        );

        let nary = Statement::ground("Not", &["can", "Penguin", "Fly"]);
        assert_eq!(
            nary.negation_inner().unwrap().to_string(),
            "can Penguin Fly"
        );
    }

    #[test]
    fn variables_in_first_seen_order() {
        let stmt = Statement::new(
            "rel",
            vec![var("b"), var("a"), Term::Compound(Statement::new("inner", vec![var("b"), var("c")]))],
        );
        assert_eq!(stmt.variables(), vec!["b", "a", "c"]);
    }
}
