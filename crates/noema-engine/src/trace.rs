//! Failure search traces
//!
//! For every failure at depth 0 the engine renders a short natural-language
//! account of what was searched: entity existence, the `isA` chain, which
//! types hold an inheritable property and what blocked it, direction
//! violations on transitive relations, explicit negations, and rule
//! premise coverage.

use crate::relations::isa_hierarchy;
use crate::session::Session;
use crate::unify::unify;
use noema_core::{Bindings, Statement};
use std::collections::VecDeque;

/// Render the search trace for a failed goal. `negated_context` marks
/// failures produced by an explicit blocker (negation gate, exception),
/// which additionally walk the chain to the would-be provider.
pub(crate) fn build_search_trace(
    session: &Session,
    goal: &Statement,
    negated_context: bool,
) -> String {
    let kb = session.kb();
    let semantic = session.semantic();
    let args = goal.arg_tokens();
    let mut lines: Vec<String> = Vec::new();

    let subject = args.first().cloned();
    match &subject {
        Some(entity) if !kb.knows_entity(entity) => {
            lines.push(format!("Entity '{entity}' unknown in KB."));
        }
        Some(entity) => {
            let chain = isa_hierarchy(session, entity);
            if chain.is_empty() {
                lines.push(format!("'{entity}' has no isA ancestors."));
            } else {
                let rendered: Vec<String> =
                    chain.iter().map(|(ancestor, _)| ancestor.clone()).collect();
                lines.push(format!("isA chain: {entity} -> {}.", rendered.join(" -> ")));
            }
        }
        None => lines.push("Goal has no subject argument.".to_string()),
    }

    if let Some(negation) = args
        .first()
        .and_then(|_| kb.find_negation(&goal.operator, &args))
    {
        lines.push(format!("Explicit negation found: {}.", negation.rendered()));
    }

    if semantic.is_inheritable(&goal.operator) && args.len() == 2 {
        inheritance_trace(session, goal, &args, negated_context, &mut lines);
    }

    if semantic.is_transitive(&goal.operator) && args.len() == 2 {
        if reverse_path_exists(session, &goal.operator, &args[1], &args[0]) {
            lines.push(match goal.operator.as_str() {
                "before" | "after" => "Temporal order violated: the reverse path exists.".into(),
                "causes" => "Causal direction violated: the reverse path exists.".into(),
                op => format!("{op} direction violated: the reverse path exists."),
            });
        } else {
            lines.push(format!(
                "No {} path from {} to {} within the search depth.",
                goal.operator, args[0], args[1]
            ));
        }
    }

    rule_coverage_trace(session, goal, &mut lines);

    if lines.is_empty() {
        lines.push("Nothing in the KB relates to this goal.".to_string());
    }
    lines.join(" ")
}

/// Which types hold the property, and what blocks the subject from
/// inheriting it.
fn inheritance_trace(
    session: &Session,
    goal: &Statement,
    args: &[String],
    negated_context: bool,
    lines: &mut Vec<String>,
) {
    let kb = session.kb();
    let holders: Vec<String> = kb
        .find_by_operator_and_arg1(&goal.operator, &args[1], true)
        .iter()
        .filter(|fact| fact.metadata.args.len() == 2)
        .map(|fact| fact.metadata.args[0].clone())
        .collect();
    if holders.is_empty() {
        lines.push(format!(
            "No type holds {} {} anywhere in the KB.",
            goal.operator, args[1]
        ));
        return;
    }
    lines.push(format!(
        "{} {} holds for: {}.",
        goal.operator,
        args[1],
        holders.join(", ")
    ));

    let hierarchy = isa_hierarchy(session, &args[0]);
    let inherits_from: Vec<&String> = holders
        .iter()
        .filter(|holder| {
            hierarchy
                .iter()
                .any(|(ancestor, _)| kb.tokens_match(ancestor, holder))
        })
        .collect();
    if inherits_from.is_empty() {
        lines.push(format!(
            "{} is not an instance of any of them.",
            args[0]
        ));
        return;
    }
    if negated_context {
        // Walk the chain up to the would-be provider and name the blocker.
        for (ancestor, _) in &hierarchy {
            if let Some(blocking) =
                kb.find_negation(&goal.operator, &[ancestor.clone(), args[1].clone()])
            {
                lines.push(format!(
                    "{} would inherit from {}, but {} blocks it: {}.",
                    args[0],
                    inherits_from
                        .iter()
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                    ancestor,
                    blocking.rendered()
                ));
                return;
            }
            if inherits_from.iter().any(|h| kb.tokens_match(h, ancestor)) {
                break;
            }
        }
    }
}

/// Whether the transitive closure reaches `to` from `from` (used to report
/// direction violations on the reversed goal).
fn reverse_path_exists(session: &Session, relation: &str, from: &str, to: &str) -> bool {
    let kb = session.kb();
    let mut seen = vec![kb.canonicalize_name(from)];
    let mut queue = VecDeque::from([from.to_string()]);
    let mut hops = 0usize;
    while let Some(current) = queue.pop_front() {
        hops += 1;
        if hops > 256 {
            break;
        }
        for fact in kb.find_by_operator_and_arg0(relation, &current, true) {
            if fact.metadata.args.len() != 2 {
                continue;
            }
            let next = fact.metadata.args[1].clone();
            if kb.tokens_match(&next, to) {
                return true;
            }
            let canon = kb.canonicalize_name(&next);
            if !seen.iter().any(|s| *s == canon) {
                seen.push(canon);
                queue.push_back(next);
            }
        }
    }
    false
}

/// Which premises of a matching rule were found and which are missing.
/// Renaming apart is unnecessary here: the bindings never escape this
/// rendering.
fn rule_coverage_trace(session: &Session, goal: &Statement, lines: &mut Vec<String>) {
    let kb = session.kb();
    for rule in session.rules() {
        let Some(bindings) = unify(kb, &rule.conclusion, goal, &Bindings::new()) else {
            continue;
        };
        let mut found = Vec::new();
        let mut missing = Vec::new();
        for leaf in rule.condition_tree.leaves() {
            let instantiated = leaf.substituted(&bindings);
            let rendered = instantiated.instantiate(&bindings);
            if instantiated.is_ground()
                && kb.has_nary(&instantiated.operator, &instantiated.arg_tokens())
            {
                found.push(rendered);
            } else {
                missing.push(rendered);
            }
        }
        if !found.is_empty() || !missing.is_empty() {
            let mut sentence = format!("Rule {} was consulted:", rule.name);
            if !found.is_empty() {
                sentence.push_str(&format!(" premises found: {};", found.join(", ")));
            }
            if !missing.is_empty() {
                sentence.push_str(&format!(" premises missing: {};", missing.join(", ")));
            }
            lines.push(sentence.trim_end_matches(';').to_string() + ".");
        }
        break;
    }
}
