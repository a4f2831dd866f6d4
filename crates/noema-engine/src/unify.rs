//! Unification
//!
//! Matches a pattern AST against a target AST under a binding set.
//! Variables may occur on both sides (rule conclusions against patterns
//! with holes); rule variables are renamed apart before matching so the
//! two namespaces cannot capture each other. Non-variable atoms unify iff
//! their type discriminant agrees and their canonicalised names compare
//! equal.

use noema_core::{Bindings, Statement, Term};
use noema_kb::{ComponentKb, Rule};

/// Unify `pattern` with `target` under `bindings`, returning the extended
/// binding set on success.
pub(crate) fn unify(
    kb: &ComponentKb,
    pattern: &Statement,
    target: &Statement,
    bindings: &Bindings,
) -> Option<Bindings> {
    if !kb.tokens_match(&pattern.operator, &target.operator)
        || pattern.args.len() != target.args.len()
    {
        return None;
    }
    let mut current = bindings.clone();
    for (p, t) in pattern.args.iter().zip(&target.args) {
        if !unify_term(kb, p, t, &mut current) {
            return None;
        }
    }
    Some(current)
}

fn unify_term(kb: &ComponentKb, pattern: &Term, target: &Term, bindings: &mut Bindings) -> bool {
    match (pattern, target) {
        (Term::Variable(v), t) => bind_var(kb, v, t, bindings),
        (t, Term::Variable(v)) => bind_var(kb, v, t, bindings),
        (Term::Identifier(a), Term::Identifier(b)) => kb.tokens_match(a, b),
        (Term::Literal(a), Term::Literal(b)) => kb.tokens_match(a, b),
        (Term::Reference(a), Term::Reference(b)) => a == b,
        (Term::Compound(a), Term::Compound(b)) => {
            if !kb.tokens_match(&a.operator, &b.operator) || a.args.len() != b.args.len() {
                return false;
            }
            a.args
                .iter()
                .zip(&b.args)
                .all(|(pa, ta)| unify_term(kb, pa, ta, bindings))
        }
        _ => false,
    }
}

/// Bind a variable to the other side's token, following `?`-alias chains.
/// Binding an already-bound variable succeeds only when the values agree.
fn bind_var(kb: &ComponentKb, name: &str, other: &Term, bindings: &mut Bindings) -> bool {
    let name = resolve_alias(bindings, name);
    let other_token = match other {
        Term::Variable(v) => {
            let v = resolve_alias(bindings, v);
            if v == name {
                return true;
            }
            match bindings.get(v.as_str()) {
                Some(value) => value.clone(),
                None => {
                    // Both unbound: alias one to the other.
                    bindings.insert(name, format!("?{v}"));
                    return true;
                }
            }
        }
        other => other.token(),
    };
    match bindings.get(name.as_str()) {
        Some(existing) => kb.tokens_match(existing, &other_token),
        None => {
            bindings.insert(name, other_token);
            true
        }
    }
}

/// Follow `?`-alias chains to the final variable name. Chains are produced
/// when two unbound variables unify; they are short, but a guard caps the
/// walk anyway.
fn resolve_alias(bindings: &Bindings, name: &str) -> String {
    let mut current = name.to_string();
    for _ in 0..16 {
        match bindings.get(current.as_str()) {
            Some(value) if value.starts_with('?') => current = value[1..].to_string(),
            _ => break,
        }
    }
    current
}

/// Look a variable up through alias chains, returning its ground token.
pub(crate) fn lookup(bindings: &Bindings, name: &str) -> Option<String> {
    let resolved = resolve_alias(bindings, name);
    bindings
        .get(resolved.as_str())
        .filter(|value| !value.starts_with('?'))
        .cloned()
}

/// Rename a rule's variables apart with a depth-derived suffix, the
/// standard guard against capture when the same rule is applied at
/// several depths of one proof.
pub(crate) fn rename_rule_apart(rule: &Rule, suffix: usize) -> (Statement, Statement) {
    (
        rename_statement(&rule.condition, suffix),
        rename_statement(&rule.conclusion, suffix),
    )
}

fn rename_statement(stmt: &Statement, suffix: usize) -> Statement {
    Statement {
        operator: stmt.operator.clone(),
        args: stmt.args.iter().map(|t| rename_term(t, suffix)).collect(),
    }
}

fn rename_term(term: &Term, suffix: usize) -> Term {
    match term {
        Term::Variable(name) => Term::Variable(format!("{name}__{suffix}")),
        Term::Compound(inner) => Term::Compound(rename_statement(inner, suffix)),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noema_core::{ident, var};

    fn kb() -> ComponentKb {
        ComponentKb::new(true)
    }

    #[test]
    fn binds_variables_to_ground_tokens() {
        let pattern = Statement::new("parent", vec![var("x"), ident("mary")]);
        let target = Statement::ground("parent", &["john", "mary"]);
        let bindings = unify(&kb(), &pattern, &target, &Bindings::new()).unwrap();
        assert_eq!(bindings.get("x").map(String::as_str), Some("john"));
    }

    #[test]
    fn conflicting_bindings_fail() {
        let pattern = Statement::new("parent", vec![var("x"), var("x")]);
        let target = Statement::ground("parent", &["john", "mary"]);
        assert!(unify(&kb(), &pattern, &target, &Bindings::new()).is_none());
    }

    #[test]
    fn variables_on_both_sides_alias() {
        let pattern = Statement::new("subject", vec![var("who")]);
        let target = Statement::new("subject", vec![var("x")]);
        let bindings = unify(&kb(), &pattern, &target, &Bindings::new()).unwrap();
        // One side aliases the other; grounding either resolves both.
        let mut extended = bindings.clone();
        extended.insert("x".into(), "Socrates".into());
        assert_eq!(lookup(&extended, "who").as_deref(), Some("Socrates"));
    }

    #[test]
    fn type_discriminants_must_agree() {
        let pattern = Statement::new("age", vec![ident("7")]);
        let target = Statement::new("age", vec![noema_core::lit("7")]);
        assert!(unify(&kb(), &pattern, &target, &Bindings::new()).is_none());
    }

    #[test]
    fn synonyms_unify_under_canonicalization() {
        let mut kb = ComponentKb::new(true);
        kb.add_statement(&Statement::binary("synonym", "car", "auto"), None);
        let pattern = Statement::ground("owns", &["Alice", "car"]);
        let target = Statement::ground("owns", &["Alice", "auto"]);
        assert!(unify(&kb, &pattern, &target, &Bindings::new()).is_some());
    }

    #[test]
    fn compound_arguments_unify_elementwise() {
        let pattern = Statement::new(
            "believes",
            vec![
                ident("Alice"),
                Term::Compound(Statement::new("likes", vec![var("x"), ident("Tea")])),
            ],
        );
        let target = Statement::new(
            "believes",
            vec![
                ident("Alice"),
                Term::Compound(Statement::ground("likes", &["Bob", "Tea"])),
            ],
        );
        let bindings = unify(&kb(), &pattern, &target, &Bindings::new()).unwrap();
        assert_eq!(bindings.get("x").map(String::as_str), Some("Bob"));
    }

    #[test]
    fn arity_mismatch_fails() {
        let pattern = Statement::ground("rel", &["a"]);
        let target = Statement::ground("rel", &["a", "b"]);
        assert!(unify(&kb(), &pattern, &target, &Bindings::new()).is_none());
    }
}
