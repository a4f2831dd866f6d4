//! Query engine: hole-filling search
//!
//! Produces a ranked list of binding maps for a pattern with holes.
//! Passes: indexed KB scan (synonym-aware, unification-driven), transitive
//! expansion for single-hole patterns, property-inheritance expansion, and
//! bundle-pattern intersection. Results are filtered against explicit
//! negations and, for modal operators, against type-class values.

use crate::error::Result;
use crate::matcher::find_all_fact_matches;
use crate::prove::prove_goal;
use crate::relations::isa_hierarchy;
use crate::session::Session;
use crate::state::{ProofState, ProveOutcome, Solution};
use noema_core::{
    Bindings, QueryMatch, QueryOptions, QueryResult, Statement, Step, StepOperation,
};
use std::collections::VecDeque;
use tracing::debug;

/// Operators whose query answers must be concrete values, not type
/// classes.
const MODAL_OPERATORS: [&str; 5] = ["can", "must", "may", "should", "might"];

pub(crate) fn run_query(
    session: &Session,
    pattern: &Statement,
    options: &QueryOptions,
) -> QueryResult {
    if pattern.operator.is_empty() {
        return QueryResult::failed("Invalid input: pattern has no operator");
    }
    let depth = options.max_depth.min(options.expansion_depth.max(1));
    let mut state = ProofState::with_limits(depth, options.max_steps, options.timeout);
    match collect_matches(session, &mut state, pattern) {
        Ok(matches) => {
            let truncated = matches.len() > options.max_results;
            let mut kept = matches;
            kept.truncate(options.max_results);
            QueryResult::from_matches(kept, truncated)
        }
        Err(error) => QueryResult::failed(error.to_string()),
    }
}

fn collect_matches(
    session: &Session,
    state: &mut ProofState,
    pattern: &Statement,
) -> Result<Vec<QueryMatch>> {
    let holes = pattern.variables();
    if holes.is_empty() {
        // A ground pattern degenerates to a proof.
        return Ok(match prove_goal(session, state, pattern, 0)? {
            ProveOutcome::Proved {
                method,
                confidence,
                steps,
            } => vec![QueryMatch {
                bindings: Bindings::new(),
                score: confidence,
                method,
                steps,
            }],
            _ => Vec::new(),
        });
    }

    let mut matches: Vec<QueryMatch> = Vec::new();

    // KB scan with unification, transitive expansion and rule chaining.
    for solution in find_all_fact_matches(session, state, pattern, &Bindings::new(), 0)? {
        matches.push(to_match(solution, &holes));
    }

    // Property-inheritance expansion.
    let tokens = pattern.arg_tokens();
    if session.semantic().is_inheritable(&pattern.operator) && tokens.len() == 2 {
        expand_inheritance(session, state, pattern, &tokens, &holes, &mut matches)?;
    }

    // Bundle-pattern intersection on a known first argument.
    if let Some(first) = tokens.first() {
        if !first.starts_with('?') {
            if let Some(sources) = session.bundle(first) {
                expand_bundle(session, state, pattern, first, &sources, &holes, &mut matches)?;
            }
        }
    }

    matches = filter_matches(session, pattern, matches);
    dedupe(&mut matches);
    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    debug!(pattern = %pattern, count = matches.len(), "query complete");
    Ok(matches)
}

fn to_match(solution: Solution, holes: &[String]) -> QueryMatch {
    let method = if solution
        .steps
        .iter()
        .any(|s| s.operation == StepOperation::RuleMatch)
    {
        "rule_chain"
    } else if solution
        .steps
        .iter()
        .any(|s| s.operation == StepOperation::TransitiveEdge)
    {
        "transitive_expansion"
    } else {
        "direct_match"
    };
    QueryMatch {
        bindings: project(&solution.bindings, holes),
        score: solution.confidence,
        method: method.to_string(),
        steps: solution.steps,
    }
}

/// Keep only the caller's holes, resolved through alias chains.
fn project(bindings: &Bindings, holes: &[String]) -> Bindings {
    let mut out = Bindings::new();
    for hole in holes {
        if let Some(value) = crate::unify::lookup(bindings, hole) {
            out.insert(hole.clone(), value);
        }
    }
    out
}

/// `P e ?v`: values inherited from ancestors. `P ?e v`: entities that
/// inherit from a type holding the property. Every candidate is confirmed
/// by a full proof so exceptions keep their veto.
fn expand_inheritance(
    session: &Session,
    state: &mut ProofState,
    pattern: &Statement,
    tokens: &[String],
    holes: &[String],
    matches: &mut Vec<QueryMatch>,
) -> Result<()> {
    let kb = session.kb();
    match (tokens[0].strip_prefix('?'), tokens[1].strip_prefix('?')) {
        (None, Some(hole)) => {
            let entity = &tokens[0];
            for (ancestor, _) in isa_hierarchy(session, entity) {
                state.tick()?;
                for fact in kb.find_by_operator_and_arg0(&pattern.operator, &ancestor, true) {
                    if fact.metadata.args.len() != 2 {
                        continue;
                    }
                    let value = fact.metadata.args[1].clone();
                    push_verified(
                        session,
                        state,
                        pattern,
                        hole,
                        &value,
                        holes,
                        matches,
                    )?;
                }
            }
        }
        (Some(hole), None) => {
            let value = &tokens[1];
            for fact in kb.find_by_operator_and_arg1(&pattern.operator, value, true) {
                if fact.metadata.args.len() != 2 {
                    continue;
                }
                let holder = fact.metadata.args[0].clone();
                for descendant in descendants_of(session, &holder) {
                    state.tick()?;
                    push_verified(
                        session,
                        state,
                        pattern,
                        hole,
                        &descendant,
                        holes,
                        matches,
                    )?;
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn push_verified(
    session: &Session,
    state: &mut ProofState,
    pattern: &Statement,
    hole: &str,
    value: &str,
    holes: &[String],
    matches: &mut Vec<QueryMatch>,
) -> Result<()> {
    let mut bindings = Bindings::new();
    bindings.insert(hole.to_string(), value.to_string());
    let ground = pattern.substituted(&bindings);
    if let ProveOutcome::Proved {
        confidence, steps, ..
    } = prove_goal(session, state, &ground, 1)?
    {
        matches.push(QueryMatch {
            bindings: project(&bindings, holes),
            score: confidence,
            method: "inheritance_expansion".to_string(),
            steps,
        });
    }
    Ok(())
}

/// Entities below a type in the `isA` graph (reverse BFS), cycle-safe.
fn descendants_of(session: &Session, ancestor: &str) -> Vec<String> {
    let kb = session.kb();
    let mut out = Vec::new();
    let mut seen = vec![kb.canonicalize_name(ancestor)];
    let mut queue = VecDeque::from([ancestor.to_string()]);
    while let Some(current) = queue.pop_front() {
        for fact in kb.find_by_operator_and_arg1("isA", &current, true) {
            if fact.metadata.args.len() != 2 {
                continue;
            }
            let child = fact.metadata.args[0].clone();
            let canon = kb.canonicalize_name(&child);
            if seen.iter().any(|s| *s == canon) {
                continue;
            }
            seen.push(canon);
            out.push(child.clone());
            queue.push_back(child);
        }
    }
    out
}

/// Bundle-pattern intersection: values holding for *all* source entities
/// of a named bundle.
fn expand_bundle(
    session: &Session,
    state: &mut ProofState,
    pattern: &Statement,
    bundle_name: &str,
    sources: &[String],
    holes: &[String],
    matches: &mut Vec<QueryMatch>,
) -> Result<()> {
    let tokens = pattern.arg_tokens();
    let Some(hole) = tokens.get(1).and_then(|t| t.strip_prefix('?')) else {
        return Ok(());
    };
    let kb = session.kb();
    let thresholds = session.thresholds();

    let mut common: Option<Vec<String>> = None;
    for source in sources {
        state.tick()?;
        let values: Vec<String> = kb
            .find_by_operator_and_arg0(&pattern.operator, source, true)
            .iter()
            .filter(|fact| fact.metadata.args.len() == 2)
            .map(|fact| fact.metadata.args[1].clone())
            .collect();
        common = Some(match common {
            None => values,
            Some(previous) => previous
                .into_iter()
                .filter(|value| values.iter().any(|v| kb.tokens_match(v, value)))
                .collect(),
        });
    }

    for value in common.unwrap_or_default() {
        let mut bindings = Bindings::new();
        bindings.insert(hole.to_string(), value.clone());
        matches.push(QueryMatch {
            bindings: project(&bindings, holes),
            score: thresholds.bundle_common_score,
            method: "bundle_intersection".to_string(),
            steps: vec![Step::new(StepOperation::QueryBinding)
                .with_detail(format!("common to all members of {bundle_name}"))],
        });
    }
    Ok(())
}

/// Reject type-class values for modal operators and anything matching an
/// explicit negation.
fn filter_matches(
    session: &Session,
    pattern: &Statement,
    matches: Vec<QueryMatch>,
) -> Vec<QueryMatch> {
    let kb = session.kb();
    let modal = MODAL_OPERATORS.contains(&pattern.operator.as_str());
    matches
        .into_iter()
        .filter(|m| {
            let ground = pattern.substituted(&m.bindings);
            let tokens = ground.arg_tokens();
            if ground.is_ground() && kb.find_negation(&ground.operator, &tokens).is_some() {
                return false;
            }
            if modal {
                // A value with sub-types is a class, not an answer.
                for value in m.bindings.values() {
                    if !kb.find_by_operator_and_arg1("isA", value, true).is_empty() {
                        return false;
                    }
                }
            }
            true
        })
        .collect()
}

fn dedupe(matches: &mut Vec<QueryMatch>) {
    let mut seen: Vec<Bindings> = Vec::new();
    matches.retain(|m| {
        if seen.iter().any(|s| *s == m.bindings) {
            false
        } else {
            seen.push(m.bindings.clone());
            true
        }
    });
}
