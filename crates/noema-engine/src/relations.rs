//! Typed-relation reasoners
//!
//! Graph walks over the relations the semantic index declares transitive,
//! symmetric, reflexive, inverse or inheritable. All walks are per-call
//! cycle-guarded and emit step records naming the evidence fact.

use crate::error::Result;
use crate::prove::prove_goal;
use crate::session::Session;
use crate::state::{Derivation, ProofState, VisitKey};
use noema_core::{Statement, Step, StepOperation};
use std::collections::VecDeque;
use tracing::trace;

/// BFS over outgoing `relation` edges from `from` towards `to`. Shorter
/// paths win; confidence is `TRANSITIVE_BASE · TRANSITIVE_DECAY^(len−1)`.
pub(crate) fn prove_transitive(
    session: &Session,
    state: &mut ProofState,
    relation: &str,
    from: &str,
    to: &str,
    _depth: usize,
) -> Result<Option<Derivation>> {
    let key = VisitKey::Chain(relation.to_string(), from.to_string(), to.to_string());
    let outcome = state.with_key(key, |state| {
        let kb = session.kb();
        let thresholds = session.thresholds();
        let max_len = state.max_depth.max(1);

        // parent[node] = (predecessor, edge rendering)
        let mut parents: Vec<(String, String, String)> = Vec::new();
        let mut seen: Vec<String> = vec![kb.canonicalize_name(from)];
        let mut queue: VecDeque<(String, usize)> = VecDeque::from([(from.to_string(), 0)]);

        while let Some((current, hops)) = queue.pop_front() {
            if hops >= max_len {
                continue;
            }
            state.tick()?;
            for fact in kb.find_by_operator_and_arg0(relation, &current, true) {
                if fact.metadata.args.len() != 2 {
                    continue;
                }
                let next = fact.metadata.args[1].clone();
                let canon_next = kb.canonicalize_name(&next);
                if seen.iter().any(|s| *s == canon_next) {
                    continue;
                }
                seen.push(canon_next);
                parents.push((next.clone(), current.clone(), fact.rendered()));
                if kb.tokens_match(&next, to) {
                    let edges = unwind_path(&parents, &next, from, kb);
                    let confidence = thresholds.transitive_base
                        * thresholds
                            .transitive_decay
                            .powi(edges.len() as i32 - 1);
                    let steps = edges
                        .into_iter()
                        .map(|edge| {
                            Step::fact(StepOperation::TransitiveEdge, edge)
                                .with_detail(relation.to_string())
                        })
                        .collect();
                    trace!(relation, from, to, confidence, "transitive chain found");
                    return Ok(Some(Derivation { confidence, steps }));
                }
                queue.push_back((next, hops + 1));
            }
        }
        Ok(None)
    })?;
    Ok(outcome.flatten())
}

fn unwind_path(
    parents: &[(String, String, String)],
    last: &str,
    origin: &str,
    kb: &noema_kb::ComponentKb,
) -> Vec<String> {
    let mut edges = Vec::new();
    let mut cursor = last.to_string();
    while !kb.tokens_match(&cursor, origin) {
        let Some((_, predecessor, rendered)) = parents
            .iter()
            .find(|(node, _, _)| *node == cursor)
        else {
            break;
        };
        edges.push(rendered.clone());
        cursor = predecessor.clone();
    }
    edges.reverse();
    edges
}

/// Reverse lookup for a symmetric relation; reflexive relations accept
/// `R x x` trivially. Falls back to a full sub-proof of the reversed goal.
pub(crate) fn prove_symmetric(
    session: &Session,
    state: &mut ProofState,
    relation: &str,
    a: &str,
    b: &str,
    depth: usize,
) -> Result<Option<Derivation>> {
    let kb = session.kb();
    let thresholds = session.thresholds();

    if session.semantic().is_reflexive(relation) && kb.tokens_match(a, b) {
        return Ok(Some(Derivation {
            confidence: thresholds.transitive_base,
            steps: vec![Step::fact(
                StepOperation::ReflexiveDirect,
                format!("{relation} {a} {b}"),
            )],
        }));
    }
    if !session.semantic().is_symmetric(relation) {
        return Ok(None);
    }

    // Unordered pair key: proving either direction claims the same slot.
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let key = VisitKey::Chain(relation.to_string(), lo.to_string(), hi.to_string());
    let outcome = state.with_key(key, |state| {
        state.tick()?;
        if let Some(fact) = kb.find_exact(relation, &[b.to_string(), a.to_string()]) {
            return Ok(Some(Derivation {
                confidence: thresholds.confidence_decay,
                steps: vec![Step::fact(StepOperation::SymmetricDirect, fact.rendered())],
            }));
        }
        let reversed = Statement::binary(relation, b, a);
        match prove_goal(session, state, &reversed, depth + 1)? {
            crate::state::ProveOutcome::Proved {
                confidence,
                mut steps,
                ..
            } => {
                steps.push(
                    Step::fact(StepOperation::SymmetricDirect, reversed.to_string())
                        .with_detail("proved reversed goal"),
                );
                Ok(Some(Derivation {
                    confidence: confidence * thresholds.confidence_decay,
                    steps,
                }))
            }
            _ => Ok(None),
        }
    })?;
    Ok(outcome.flatten())
}

/// Inverse-relation reasoner: `R a b` follows from `R' b a`. The cycle key
/// is normalised over the relation pair so the walk cannot bounce between
/// `R` and `R'`.
pub(crate) fn prove_inverse(
    session: &Session,
    state: &mut ProofState,
    relation: &str,
    a: &str,
    b: &str,
    depth: usize,
) -> Result<Option<Derivation>> {
    let Some(inverse) = session.semantic().inverse_of(relation) else {
        return Ok(None);
    };
    let kb = session.kb();
    let thresholds = session.thresholds();

    let (canonical_rel, x, y) = if relation <= inverse.as_str() {
        (relation.to_string(), a.to_string(), b.to_string())
    } else {
        (inverse.clone(), b.to_string(), a.to_string())
    };
    let key = VisitKey::Chain(canonical_rel, x, y);
    let outcome = state.with_key(key, |state| {
        state.tick()?;
        if let Some(fact) = kb.find_exact(&inverse, &[b.to_string(), a.to_string()]) {
            return Ok(Some(Derivation {
                confidence: thresholds.confidence_decay,
                steps: vec![Step::fact(
                    StepOperation::InverseDirectMetadata,
                    fact.rendered(),
                )
                .with_detail(format!("{inverse} is inverse of {relation}"))],
            }));
        }
        let inverted = Statement::binary(inverse.as_str(), b, a);
        match prove_goal(session, state, &inverted, depth + 1)? {
            crate::state::ProveOutcome::Proved {
                confidence,
                mut steps,
                ..
            } => {
                steps.push(
                    Step::fact(StepOperation::InverseDirectMetadata, inverted.to_string())
                        .with_detail("proved inverted goal"),
                );
                Ok(Some(Derivation {
                    confidence: confidence * thresholds.confidence_decay,
                    steps,
                }))
            }
            _ => Ok(None),
        }
    })?;
    Ok(outcome.flatten())
}

/// Outcome of the property-inheritance walk.
#[derive(Debug, Clone)]
pub(crate) enum InheritanceOutcome {
    Proved(Derivation),
    /// An exception on a type more specific than any provider settles the
    /// goal as false.
    Blocked {
        blocker: String,
        steps: Vec<Step>,
    },
    NotApplicable,
}

/// Ancestors of `entity` along `isA`, most specific first, with hop
/// counts. Cycle-safe; synonym-aware.
pub(crate) fn isa_hierarchy(session: &Session, entity: &str) -> Vec<(String, usize)> {
    let kb = session.kb();
    let mut out: Vec<(String, usize)> = Vec::new();
    let mut seen: Vec<String> = vec![kb.canonicalize_name(entity)];
    let mut queue: VecDeque<(String, usize)> = VecDeque::from([(entity.to_string(), 0)]);
    while let Some((current, hops)) = queue.pop_front() {
        for fact in kb.find_by_operator_and_arg0("isA", &current, true) {
            if fact.metadata.args.len() != 2 {
                continue;
            }
            let parent = fact.metadata.args[1].clone();
            let canon = kb.canonicalize_name(&parent);
            if seen.iter().any(|s| *s == canon) {
                continue;
            }
            seen.push(canon);
            out.push((parent.clone(), hops + 1));
            queue.push_back((parent, hops + 1));
        }
    }
    out
}

/// Prove `property entity value` by inheriting from an ancestor type,
/// unless a more specific exception fires first.
pub(crate) fn prove_inheritance(
    session: &Session,
    state: &mut ProofState,
    property: &str,
    entity: &str,
    value: &str,
    _depth: usize,
) -> Result<InheritanceOutcome> {
    let kb = session.kb();
    let thresholds = session.thresholds();
    let mut steps: Vec<Step> = Vec::new();

    for (ancestor, hops) in isa_hierarchy(session, entity) {
        state.tick()?;
        steps.push(
            Step::fact(StepOperation::IsaHop, format!("isA {entity} {ancestor}"))
                .with_detail(format!("hop {hops}")),
        );
        if let Some(blocking) = kb.find_negation(property, &[ancestor.clone(), value.to_string()])
        {
            steps.push(Step::fact(StepOperation::NotFact, blocking.rendered()));
            return Ok(InheritanceOutcome::Blocked {
                blocker: ancestor,
                steps,
            });
        }
        if let Some(provider) = kb.find_exact(property, &[ancestor.clone(), value.to_string()]) {
            let confidence =
                thresholds.transitive_base * thresholds.transitive_decay.powi(hops as i32);
            steps.push(
                Step::fact(StepOperation::InheritedProperty, provider.rendered())
                    .with_confidence(confidence),
            );
            return Ok(InheritanceOutcome::Proved(Derivation { confidence, steps }));
        }
    }
    Ok(InheritanceOutcome::NotApplicable)
}
