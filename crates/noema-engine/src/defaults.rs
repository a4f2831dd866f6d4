//! Default / exception resolver
//!
//! Non-monotonic defaults ordered by type specificity. `Default P T v`
//! grants `P e v` to instances of `T`; `Exception P T' v` on a strictly
//! more specific `T'` blocks it. A blocking exception is definitive: the
//! strategy ladder stops.

use crate::error::Result;
use crate::relations::isa_hierarchy;
use crate::session::Session;
use crate::state::{Derivation, ProofState};
use noema_core::{Step, StepOperation};
use tracing::debug;

/// Exception confidence fixed by the resolver contract.
const EXCEPTION_CONFIDENCE: f64 = 0.95;

/// How the resolver settled `(entity, property, value)`.
#[derive(Debug, Clone)]
pub(crate) enum DefaultOutcome {
    /// Exactly one default applies.
    Applied(Derivation),
    /// Several same-specificity defaults split the confidence evenly.
    ConflictSplit(Derivation),
    /// An exception blocks every default. Definitive.
    ExceptionApplied { blocker: String, confidence: f64, steps: Vec<Step> },
    /// No default and no exception concerned this triple.
    NotApplicable,
}

pub(crate) fn resolve_default(
    session: &Session,
    state: &mut ProofState,
    property: &str,
    entity: &str,
    value: &str,
) -> Result<DefaultOutcome> {
    let kb = session.kb();
    let thresholds = session.thresholds();

    // Specificity order: the entity itself, then ancestors outward.
    let mut hierarchy: Vec<String> = vec![entity.to_string()];
    hierarchy.extend(isa_hierarchy(session, entity).into_iter().map(|(t, _)| t));

    let specificity_of = |token: &str| -> Option<usize> {
        hierarchy.iter().position(|t| kb.tokens_match(t, token))
    };

    // Applicable defaults / exceptions: declarations whose type appears in
    // the hierarchy, tagged with its specificity index.
    let mut defaults: Vec<(usize, String)> = Vec::new();
    for fact in kb.find_by_operator("Default", true) {
        state.tick()?;
        let [op, ty, v] = fact.metadata.args.as_slice() else {
            continue;
        };
        if kb.tokens_match(op, property) && kb.tokens_match(v, value) {
            if let Some(index) = specificity_of(ty) {
                defaults.push((index, fact.rendered()));
            }
        }
    }
    let mut exceptions: Vec<(usize, String)> = Vec::new();
    for fact in kb.find_by_operator("Exception", true) {
        state.tick()?;
        let [op, ty, v] = fact.metadata.args.as_slice() else {
            continue;
        };
        if kb.tokens_match(op, property) && kb.tokens_match(v, value) {
            if let Some(index) = specificity_of(ty) {
                exceptions.push((index, fact.rendered()));
            }
        }
    }

    if defaults.is_empty() && exceptions.is_empty() {
        return Ok(DefaultOutcome::NotApplicable);
    }

    // A default is blocked by any strictly more specific exception.
    let active: Vec<(usize, String)> = defaults
        .iter()
        .filter(|(default_index, _)| {
            !exceptions
                .iter()
                .any(|(exception_index, _)| exception_index < default_index)
        })
        .cloned()
        .collect();

    if active.is_empty() {
        if let Some((_, exception)) = exceptions.first() {
            debug!(property, entity, value, exception, "exception blocks defaults");
            let steps = vec![
                Step::fact(StepOperation::ExceptionApplied, exception.clone())
                    .with_confidence(EXCEPTION_CONFIDENCE),
            ];
            return Ok(DefaultOutcome::ExceptionApplied {
                blocker: exception.clone(),
                confidence: EXCEPTION_CONFIDENCE,
                steps,
            });
        }
        return Ok(DefaultOutcome::NotApplicable);
    }

    let best_specificity = active.iter().map(|(index, _)| *index).min().unwrap_or(0);
    let winners: Vec<(usize, String)> = active
        .into_iter()
        .filter(|(index, _)| *index == best_specificity)
        .collect();

    if winners.len() == 1 {
        let confidence = thresholds.default_confidence;
        return Ok(DefaultOutcome::Applied(Derivation {
            confidence,
            steps: vec![
                Step::fact(StepOperation::DefaultApplied, winners[0].1.clone())
                    .with_confidence(confidence),
            ],
        }));
    }

    let confidence = thresholds.default_confidence / winners.len() as f64;
    let steps = winners
        .iter()
        .map(|(_, default)| {
            Step::fact(StepOperation::DefaultConflictSplit, default.clone())
                .with_confidence(confidence)
        })
        .collect();
    Ok(DefaultOutcome::ConflictSplit(Derivation { confidence, steps }))
}
