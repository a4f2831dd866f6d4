//! Abduction: best-explanation search
//!
//! Three generators, merged, scored and truncated: backward rule
//! matching, backward walks over `causes` facts, and analogical
//! similarity in a banded range.

use crate::condition::prove_condition;
use crate::error::Result;
use crate::session::Session;
use crate::state::{ProofState, VisitKey};
use crate::unify::{rename_rule_apart, unify};
use noema_core::{
    AbduceOptions, AbductionResult, Bindings, Explanation, Statement, Step, StepOperation,
};
use noema_hdc::fnv1a64;
use std::collections::VecDeque;
use tracing::debug;

pub(crate) fn run_abduce(
    session: &Session,
    observation: &Statement,
    options: &AbduceOptions,
) -> AbductionResult {
    let observation_text = observation.to_string();
    if observation.operator.is_empty() {
        return AbductionResult {
            success: false,
            observation: observation_text,
            explanations: Vec::new(),
            reason: Some("Invalid input: observation has no operator".into()),
        };
    }
    let mut state = ProofState::with_limits(
        options.max_causal_depth,
        10_000,
        options.timeout,
    );
    match gather(session, &mut state, observation, options) {
        Ok(mut explanations) => {
            explanations.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            // Keep the best-scoring copy of each hypothesis.
            let mut seen: Vec<String> = Vec::new();
            explanations.retain(|e| {
                if seen.iter().any(|s| *s == e.hypothesis) {
                    false
                } else {
                    seen.push(e.hypothesis.clone());
                    true
                }
            });
            explanations.retain(|e| e.score >= options.min_confidence);
            explanations.truncate(options.max_explanations);
            AbductionResult {
                success: !explanations.is_empty(),
                observation: observation_text,
                explanations,
                reason: None,
            }
        }
        Err(error) => AbductionResult {
            success: false,
            observation: observation_text,
            explanations: Vec::new(),
            reason: Some(error.to_string()),
        },
    }
}

fn gather(
    session: &Session,
    state: &mut ProofState,
    observation: &Statement,
    options: &AbduceOptions,
) -> Result<Vec<Explanation>> {
    let mut explanations = Vec::new();
    rule_backward(session, state, observation, &mut explanations)?;
    causal_backward(session, state, observation, options, &mut explanations)?;
    analogical(session, observation, &mut explanations)?;
    debug!(observation = %observation, count = explanations.len(), "abduction gathered");
    Ok(explanations)
}

/// Each rule whose conclusion unifies with the observation hypothesises
/// its grounded condition.
fn rule_backward(
    session: &Session,
    state: &mut ProofState,
    observation: &Statement,
    explanations: &mut Vec<Explanation>,
) -> Result<()> {
    let kb = session.kb();
    let thresholds = session.thresholds();
    for rule in session.rules() {
        state.tick()?;
        let (condition, conclusion) = rename_rule_apart(rule, 3);
        let Some(bindings) = unify(kb, &conclusion, observation, &Bindings::new()) else {
            continue;
        };
        // Ground what the premises explain; prefer premises the KB can
        // already partially satisfy.
        let key = VisitKey::Condition(fnv1a64(
            format!("abduce#{}#{observation}", rule.id).as_bytes(),
        ));
        let solutions = state
            .with_key(key, |state| {
                let tree = noema_kb::ConditionTree::from_statement(&condition);
                prove_condition(session, state, &tree, &bindings, 1)
            })?
            .unwrap_or_default();
        let (hypothesis, score) = match solutions.first() {
            Some(solution) => (
                condition.instantiate(&solution.bindings),
                thresholds.rule_confidence * solution.confidence,
            ),
            None => (
                condition.instantiate(&bindings),
                thresholds.rule_confidence * thresholds.condition_confidence,
            ),
        };
        explanations.push(Explanation {
            hypothesis,
            method: "rule_backward".to_string(),
            score,
            steps: vec![Step::new(StepOperation::Hypothesis)
                .with_rule(rule.name.clone())
                .with_detail(observation.to_string())],
        });
    }
    Ok(())
}

/// BFS backwards over `causes` facts from the observed effect. Confidence
/// decays with path length.
fn causal_backward(
    session: &Session,
    state: &mut ProofState,
    observation: &Statement,
    options: &AbduceOptions,
    explanations: &mut Vec<Explanation>,
) -> Result<()> {
    let kb = session.kb();
    let thresholds = session.thresholds();
    let effect = if observation.args.is_empty() {
        observation.operator.clone()
    } else {
        observation.arg_tokens().join(" ")
    };

    let mut seen = vec![kb.canonicalize_name(&effect)];
    let mut queue: VecDeque<(String, usize, Vec<Step>)> =
        VecDeque::from([(effect, 0usize, Vec::new())]);
    while let Some((current, length, path)) = queue.pop_front() {
        if length >= options.max_causal_depth {
            continue;
        }
        state.tick()?;
        for fact in kb.find_by_operator_and_arg1("causes", &current, true) {
            if fact.metadata.args.len() != 2 {
                continue;
            }
            let cause = fact.metadata.args[0].clone();
            let canon = kb.canonicalize_name(&cause);
            if seen.iter().any(|s| *s == canon) {
                continue;
            }
            seen.push(canon);
            let mut steps = path.clone();
            steps.push(Step::fact(StepOperation::CausalEdge, fact.rendered()));
            let score = thresholds.transitive_base
                * thresholds.transitive_decay.powi(length as i32);
            explanations.push(Explanation {
                hypothesis: cause.clone(),
                method: "causal_chain".to_string(),
                score,
                steps: steps.clone(),
            });
            queue.push_back((cause, length + 1, steps));
        }
    }
    Ok(())
}

/// KB facts whose vectors sit in the analogy band: similar enough to be
/// suggestive, not so similar that they are the same fact.
fn analogical(
    session: &Session,
    observation: &Statement,
    explanations: &mut Vec<Explanation>,
) -> Result<()> {
    let thresholds = session.thresholds();
    let space = session.space();
    let target = session.encode(observation)?;
    for fact in session.kb().facts() {
        let Some(vector) = &fact.vector else {
            continue;
        };
        let similarity = space.similarity(&target, vector);
        if similarity >= thresholds.analogy_min && similarity < thresholds.analogy_max {
            explanations.push(Explanation {
                hypothesis: fact.rendered(),
                method: "analogy".to_string(),
                score: similarity * thresholds.analogy_discount,
                steps: vec![Step::fact(StepOperation::AnalogyMatch, fact.rendered())
                    .with_confidence(similarity)],
            });
        }
    }
    Ok(())
}
