//! KB matcher
//!
//! Direct lookup, pattern enumeration and rule chaining. Pattern
//! enumeration unifies against indexed candidates, expands transitive
//! closures for one-variable patterns, and falls back to backward rule
//! chaining at bounded depth.

use crate::condition::prove_condition;
use crate::error::Result;
use crate::prove::prove_goal;
use crate::session::Session;
use crate::state::{Derivation, ProofState, ProveOutcome, Solution, VisitKey};
use crate::unify::{rename_rule_apart, unify};
use noema_core::{Bindings, Statement, Step, StepOperation};
use noema_hdc::fnv1a64;
use noema_kb::{ConditionTree, Rule};
use std::collections::VecDeque;
use tracing::trace;

/// Cap on enumerated solutions per leaf pattern.
const MAX_LEAF_SOLUTIONS: usize = 32;

/// Strongest HDC similarity between the goal and any indexed fact.
pub(crate) fn direct_similarity(
    session: &Session,
    goal: &Statement,
    goal_vector: &noema_hdc::Vector,
) -> f64 {
    let kb = session.kb();
    let args = goal.arg_tokens();
    let candidates = match args.first() {
        Some(arg0) => kb.find_by_operator_and_arg0(&goal.operator, arg0, true),
        None => kb.find_by_operator(&goal.operator, true),
    };
    let space = session.space();
    candidates
        .iter()
        .filter_map(|fact| fact.vector.as_ref())
        .map(|vector| space.similarity(goal_vector, vector))
        .fold(0.0, f64::max)
}

/// Enumerate every way a possibly-variable pattern matches the KB:
/// indexed facts first, then transitive expansion, then rule chaining.
/// Results arrive in KB insertion order, then expansion order.
pub(crate) fn find_all_fact_matches(
    session: &Session,
    state: &mut ProofState,
    pattern: &Statement,
    bindings: &Bindings,
    depth: usize,
) -> Result<Vec<Solution>> {
    let kb = session.kb();
    let concrete = pattern.substituted(bindings);

    if concrete.is_ground() {
        return match prove_goal(session, state, &concrete, depth + 1)? {
            ProveOutcome::Proved {
                confidence, steps, ..
            } => Ok(vec![Solution {
                bindings: bindings.clone(),
                confidence,
                steps: prefixed(&concrete, steps),
            }]),
            _ => Ok(Vec::new()),
        };
    }

    let mut solutions: Vec<Solution> = Vec::new();
    let tokens = concrete.arg_tokens();
    let known_arg0 = tokens.first().filter(|t| !t.starts_with('?'));

    let candidates = match known_arg0 {
        Some(arg0) => kb.find_by_operator_and_arg0(&concrete.operator, arg0, true),
        None => kb.find_by_operator(&concrete.operator, true),
    };
    for fact in candidates {
        state.tick()?;
        if let Some(extended) = unify(kb, &concrete, &fact.metadata.statement(), bindings) {
            solutions.push(Solution {
                bindings: extended,
                confidence: 1.0,
                steps: vec![Step::fact(StepOperation::PremiseMatch, fact.rendered())],
            });
            if solutions.len() >= MAX_LEAF_SOLUTIONS {
                return Ok(solutions);
            }
        }
    }

    // One-variable / one-known transitive chaining.
    if session.semantic().is_transitive(&concrete.operator) && tokens.len() == 2 {
        expand_transitive_pattern(session, state, &concrete, bindings, &mut solutions)?;
    }

    if solutions.len() < MAX_LEAF_SOLUTIONS && depth < state.max_depth {
        let chained = try_rule_chain_for_condition(session, state, &concrete, bindings, depth)?;
        solutions.extend(chained);
        solutions.truncate(MAX_LEAF_SOLUTIONS);
    }

    Ok(solutions)
}

fn prefixed(goal: &Statement, mut steps: Vec<Step>) -> Vec<Step> {
    let mut out = vec![Step::fact(StepOperation::PremiseMatch, goal.to_string())];
    out.append(&mut steps);
    out
}

/// For `R a ?x` walk forward, for `R ?x b` walk backward, binding the hole
/// to every node the transitive closure reaches.
fn expand_transitive_pattern(
    session: &Session,
    state: &mut ProofState,
    pattern: &Statement,
    bindings: &Bindings,
    solutions: &mut Vec<Solution>,
) -> Result<()> {
    let kb = session.kb();
    let thresholds = session.thresholds();
    let tokens = pattern.arg_tokens();
    let (hole, origin, forward) = match (tokens[0].strip_prefix('?'), tokens[1].strip_prefix('?'))
    {
        (None, Some(hole)) => (hole.to_string(), tokens[0].clone(), true),
        (Some(hole), None) => (hole.to_string(), tokens[1].clone(), false),
        _ => return Ok(()),
    };

    let mut seen: Vec<String> = vec![kb.canonicalize_name(&origin)];
    let mut queue: VecDeque<(String, usize, Vec<Step>)> =
        VecDeque::from([(origin.clone(), 0usize, Vec::new())]);
    while let Some((current, hops, path)) = queue.pop_front() {
        if hops >= state.max_depth || solutions.len() >= MAX_LEAF_SOLUTIONS {
            break;
        }
        state.tick()?;
        let edges = if forward {
            kb.find_by_operator_and_arg0(&pattern.operator, &current, true)
        } else {
            kb.find_by_operator_and_arg1(&pattern.operator, &current, true)
        };
        for fact in edges {
            if fact.metadata.args.len() != 2 {
                continue;
            }
            let next = if forward {
                fact.metadata.args[1].clone()
            } else {
                fact.metadata.args[0].clone()
            };
            let canon = kb.canonicalize_name(&next);
            if seen.iter().any(|s| *s == canon) {
                continue;
            }
            seen.push(canon);
            let mut steps = path.clone();
            steps.push(
                Step::fact(StepOperation::TransitiveEdge, fact.rendered())
                    .with_detail(pattern.operator.clone()),
            );
            let mut extended = bindings.clone();
            extended.insert(hole.clone(), next.clone());
            solutions.push(Solution {
                bindings: extended,
                confidence: thresholds.transitive_base
                    * thresholds.transitive_decay.powi(hops as i32),
                steps: steps.clone(),
            });
            queue.push_back((next, hops + 1, steps));
        }
    }
    Ok(())
}

/// Backward chaining for a condition pattern: select rules whose
/// conclusion unifies with it, prove their premises under the resulting
/// bindings.
pub(crate) fn try_rule_chain_for_condition(
    session: &Session,
    state: &mut ProofState,
    pattern: &Statement,
    bindings: &Bindings,
    depth: usize,
) -> Result<Vec<Solution>> {
    let kb = session.kb();
    let thresholds = session.thresholds();
    let mut solutions = Vec::new();

    for rule in session.rules() {
        if !rule
            .conclusion_leaves()
            .iter()
            .any(|leaf| kb.tokens_match(&leaf.operator, &pattern.operator))
        {
            continue;
        }
        let key = VisitKey::Condition(fnv1a64(
            format!("{}#{}", rule.id, pattern.instantiate(bindings)).as_bytes(),
        ));
        let found = state.with_key(key, |state| {
            state.tick()?;
            let suffix = rule.id as usize + depth * 131;
            let (condition, conclusion) = rename_rule_apart(rule, suffix);
            let mut out = Vec::new();
            for leaf in conclusion_leaves_of(&conclusion) {
                let Some(extended) = unify(kb, &leaf, pattern, bindings) else {
                    continue;
                };
                let tree = ConditionTree::from_statement(&condition);
                for solution in prove_condition(session, state, &tree, &extended, depth + 1)? {
                    let mut steps = vec![Step::new(StepOperation::RuleMatch)
                        .with_rule(rule.name.clone())
                        .with_bindings(public_bindings(&solution.bindings))];
                    steps.extend(solution.steps.clone());
                    out.push(Solution {
                        bindings: public_bindings(&solution.bindings),
                        confidence: thresholds.rule_confidence
                            * solution.confidence
                            * thresholds.confidence_decay,
                        steps,
                    });
                }
            }
            Ok(out)
        })?;
        if let Some(found) = found {
            solutions.extend(found);
        }
        if solutions.len() >= MAX_LEAF_SOLUTIONS {
            break;
        }
    }
    trace!(pattern = %pattern, count = solutions.len(), "rule chain candidates");
    Ok(solutions)
}

/// Conclusion leaves of a renamed conclusion statement, mirroring
/// [`Rule::conclusion_leaves`].
fn conclusion_leaves_of(conclusion: &Statement) -> Vec<Statement> {
    match conclusion.operator.as_str() {
        "And" | "and" | "Or" | "or" => conclusion
            .args
            .iter()
            .filter_map(|arg| match arg {
                noema_core::Term::Compound(inner) if inner.operator != "Not" => {
                    Some(inner.clone())
                }
                _ => None,
            })
            .collect(),
        "Not" | "not" => Vec::new(),
        _ => vec![conclusion.clone()],
    }
}

/// Drop renamed-apart rule variables (`name__suffix`) from a binding set.
pub(crate) fn public_bindings(bindings: &Bindings) -> Bindings {
    bindings
        .iter()
        .filter(|(name, _)| !name.contains("__"))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Match a goal against one rule's conclusion: structural equality under
/// canonicalisation for ground rules, full unification for rules with
/// variables, HDC similarity as the ground fallback.
pub(crate) fn try_rule_match(
    session: &Session,
    state: &mut ProofState,
    goal: &Statement,
    goal_vector: &noema_hdc::Vector,
    rule: &Rule,
    depth: usize,
) -> Result<Option<Derivation>> {
    let kb = session.kb();
    let thresholds = session.thresholds();
    let space = session.space();

    let suffix = rule.id as usize + depth * 131;
    let (condition, conclusion) = rename_rule_apart(rule, suffix);

    for leaf in conclusion_leaves_of(&conclusion) {
        let matched_bindings = if rule.has_variables {
            unify(kb, &leaf, goal, &Bindings::new())
        } else {
            let structural = kb.tokens_match(&leaf.operator, &goal.operator)
                && leaf.args.len() == goal.args.len()
                && leaf
                    .arg_tokens()
                    .iter()
                    .zip(goal.arg_tokens())
                    .all(|(a, b)| kb.tokens_match(a, &b));
            let similar = rule
                .conclusion_vector
                .as_ref()
                .map(|v| space.similarity(goal_vector, v) >= thresholds.conclusion_match)
                .unwrap_or(false);
            if structural || similar {
                Some(Bindings::new())
            } else {
                None
            }
        };
        let Some(seed) = matched_bindings else {
            continue;
        };
        let tree = ConditionTree::from_statement(&condition);
        let found = prove_condition(session, state, &tree, &seed, depth + 1)?;
        if let Some(solution) = found.into_iter().next() {
            let mut steps = vec![Step::new(StepOperation::RuleMatch)
                .with_rule(rule.name.clone())
                .with_bindings(public_bindings(&solution.bindings))];
            steps.extend(solution.steps);
            return Ok(Some(Derivation {
                confidence: thresholds.rule_confidence
                    * solution.confidence
                    * thresholds.confidence_decay,
                steps,
            }));
        }
    }
    Ok(None)
}
