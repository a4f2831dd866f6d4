//! Proof engine: the strategy ladder
//!
//! Given a goal, the ladder runs in a fixed order: negation handling,
//! the goal-negation gate, direct and synonym matches, the typed-relation
//! reasoners, default/exception resolution, propositional modus ponens,
//! rule matching, and finally the gated weak direct match. Every strategy
//! consults the semantic index; a definitive blocker stops the ladder.

use crate::defaults::{resolve_default, DefaultOutcome};
use crate::error::{EngineError, Result};
use crate::matcher::{direct_similarity, try_rule_match};
use crate::relations::{
    prove_inheritance, prove_inverse, prove_symmetric, prove_transitive, InheritanceOutcome,
};
use crate::session::Session;
use crate::state::{ProofState, ProveOutcome, VisitKey};
use crate::trace::build_search_trace;
use noema_core::{
    ProofResult, ProveOptions, Statement, Step, StepOperation,
};
use noema_kb::LevelMap;
use tracing::debug;

/// Confidence granted when an explicit `Not` fact settles a negated goal.
const EXPLICIT_NEGATION_CONFIDENCE: f64 = 0.95;

/// Possession predicates that inherit through the value's type chain.
const POSSESSION_OPERATORS: [&str; 4] = ["has", "owns", "holds", "contains"];

/// The symbolic reasoning engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymbolicEngine;

impl SymbolicEngine {
    /// Prove a goal statement. Never raises: limits, timeouts and invalid
    /// input all come back as failure results.
    pub fn prove(
        &self,
        session: &Session,
        goal: &Statement,
        options: &ProveOptions,
    ) -> ProofResult {
        let goal_text = goal.to_string();
        if goal.operator.is_empty() {
            return ProofResult::failure(goal_text, "Invalid input: statement has no operator");
        }
        if !goal.is_ground() {
            return ProofResult::failure(
                goal_text,
                "Invalid input: goal contains unbound variables; use query for hole-filling",
            );
        }

        let mut state = ProofState::new(options);
        match prove_goal(session, &mut state, goal, 0) {
            Ok(ProveOutcome::Proved {
                method,
                confidence,
                steps,
            }) => {
                let mut result = ProofResult::success(goal_text, method, confidence)
                    .with_steps(steps);
                result.reasoning_steps = state.steps_used;
                result
            }
            Ok(ProveOutcome::Blocked {
                method,
                reason,
                steps,
            }) => {
                let mut result = ProofResult::failure(goal_text, reason)
                    .with_method(method)
                    .definitive();
                result.steps = steps;
                result.reasoning_steps = state.steps_used;
                if options.include_search_trace {
                    result.search_trace = Some(build_search_trace(session, goal, true));
                }
                result
            }
            Ok(ProveOutcome::NotProved) => {
                let mut result =
                    ProofResult::failure(goal_text, "No strategy established the goal");
                result.reasoning_steps = state.steps_used;
                if options.include_search_trace {
                    result.search_trace = Some(build_search_trace(session, goal, false));
                }
                result
            }
            Err(error) => {
                let mut result = ProofResult::failure(goal_text, error.to_string());
                result.reasoning_steps = state.steps_used;
                result
            }
        }
    }
}

/// One rung-by-rung pass over the strategies for `goal` at `depth`.
pub(crate) fn prove_goal(
    session: &Session,
    state: &mut ProofState,
    goal: &Statement,
    depth: usize,
) -> Result<ProveOutcome> {
    state.tick()?;
    if state.depth_exhausted(depth) {
        return Ok(ProveOutcome::NotProved);
    }
    let vector = session.encode(goal)?;
    let outcome = state.with_key(VisitKey::Goal(vector.digest()), |state| {
        run_ladder(session, state, goal, &vector, depth)
    })?;
    // A revisited goal on the current path is a cycle: fail the branch
    // silently so the caller can try alternatives.
    Ok(outcome.unwrap_or(ProveOutcome::NotProved))
}

fn run_ladder(
    session: &Session,
    state: &mut ProofState,
    goal: &Statement,
    vector: &noema_hdc::Vector,
    depth: usize,
) -> Result<ProveOutcome> {
    let kb = session.kb();
    let semantic = session.semantic();
    let thresholds = session.thresholds();
    let args = goal.arg_tokens();

    debug!(goal = %goal, depth, "ladder enter");

    // Negated goals: explicit negation, disjointness, then the inner
    // positive under the closed/open-world switch.
    if goal.operator == "Not" {
        let Some(inner) = goal.negation_inner() else {
            return Err(EngineError::InvalidInput(format!(
                "Malformed negation: {goal}"
            )));
        };
        if let Some(fact) = kb.find_negation(&inner.operator, &inner.arg_tokens()) {
            return Ok(ProveOutcome::proved(
                "not_fact",
                EXPLICIT_NEGATION_CONFIDENCE,
                vec![Step::fact(StepOperation::NotFact, fact.rendered())],
            ));
        }
        if let Some(derivation) = try_disjoint_negation(session, state, &inner)? {
            return Ok(ProveOutcome::proved(
                "disjoint_proof",
                derivation.confidence,
                derivation.steps,
            ));
        }
        return match prove_goal(session, state, &inner, depth + 1)? {
            ProveOutcome::Proved { .. } => Ok(ProveOutcome::NotProved),
            _ if session.config().closed_world_assumption => Ok(ProveOutcome::proved(
                "closed_world_assumption",
                thresholds.default_confidence,
                vec![Step::new(StepOperation::ClosedWorldAssumption)
                    .with_detail(inner.to_string())],
            )),
            // Open world: inability to prove the positive is not evidence.
            _ => Ok(ProveOutcome::NotProved),
        };
    }

    // Goal-negation gate: an explicit `Not` of this goal fails it outright.
    if !state.ignore_negation {
        if let Some(negation) = kb.find_negation(&goal.operator, &args) {
            return Ok(ProveOutcome::Blocked {
                method: "negation_blocked".into(),
                reason: format!("Explicit negation in KB: {}", negation.rendered()),
                steps: vec![Step::fact(StepOperation::NotFact, negation.rendered())],
            });
        }
    }

    // Direct match: strong similarity confirmed by metadata, or metadata
    // alone as the authoritative fallback.
    let exact = kb.find_exact(&goal.operator, &args).map(|f| f.rendered());
    let similarity = direct_similarity(session, goal, vector);
    if let Some(rendered) = &exact {
        if similarity >= thresholds.very_strong_match {
            return Ok(ProveOutcome::proved(
                "direct_fact",
                similarity,
                vec![Step::fact(StepOperation::DirectFact, rendered.clone())
                    .with_confidence(similarity)],
            ));
        }
        return Ok(ProveOutcome::proved(
            "direct_fact",
            thresholds.strong_match,
            vec![Step::fact(StepOperation::MetadataFact, rendered.clone())
                .with_confidence(thresholds.strong_match)],
        ));
    }

    // Synonym match on the second argument's equivalence class.
    if args.len() == 2 {
        for synonym in kb.expand_synonyms(&args[1]).into_iter().skip(1) {
            state.tick()?;
            if let Some(fact) = kb.find_exact(&goal.operator, &[args[0].clone(), synonym.clone()])
            {
                return Ok(ProveOutcome::proved(
                    "synonym_match",
                    thresholds.synonym_confidence,
                    vec![Step::fact(StepOperation::SynonymMatch, fact.rendered())
                        .with_detail(format!("{} ~ {}", args[1], synonym))],
                ));
            }
        }
    }

    if session.config().use_semantic_index && args.len() == 2 {
        if semantic.is_transitive(&goal.operator) {
            if let Some(derivation) =
                prove_transitive(session, state, &goal.operator, &args[0], &args[1], depth)?
            {
                return Ok(ProveOutcome::proved(
                    "transitive_chain",
                    derivation.confidence,
                    derivation.steps,
                ));
            }
        }
        if semantic.is_symmetric(&goal.operator) || semantic.is_reflexive(&goal.operator) {
            if let Some(derivation) =
                prove_symmetric(session, state, &goal.operator, &args[0], &args[1], depth)?
            {
                return Ok(ProveOutcome::proved(
                    "symmetric_relation",
                    derivation.confidence,
                    derivation.steps,
                ));
            }
        }
        if let Some(derivation) =
            prove_inverse(session, state, &goal.operator, &args[0], &args[1], depth)?
        {
            return Ok(ProveOutcome::proved(
                "inverse_direct_metadata",
                derivation.confidence,
                derivation.steps,
            ));
        }
        if semantic.is_inheritable(&goal.operator) {
            match prove_inheritance(session, state, &goal.operator, &args[0], &args[1], depth)? {
                InheritanceOutcome::Proved(derivation) => {
                    return Ok(ProveOutcome::proved(
                        "inherited_property",
                        derivation.confidence,
                        derivation.steps,
                    ));
                }
                InheritanceOutcome::Blocked { blocker, steps } => {
                    return Ok(ProveOutcome::Blocked {
                        method: "default_reasoning".into(),
                        reason: format!(
                            "{} {} {} is blocked: {blocker} carries an explicit exception",
                            goal.operator, args[0], args[1]
                        ),
                        steps,
                    });
                }
                InheritanceOutcome::NotApplicable => {}
            }

            // Default / exception resolution for inheritable properties.
            match resolve_default(session, state, &goal.operator, &args[0], &args[1])? {
                DefaultOutcome::Applied(derivation) => {
                    return Ok(ProveOutcome::proved(
                        "default_applied",
                        derivation.confidence,
                        derivation.steps,
                    ));
                }
                DefaultOutcome::ConflictSplit(derivation) => {
                    return Ok(ProveOutcome::proved(
                        "default_conflict_split",
                        derivation.confidence,
                        derivation.steps,
                    ));
                }
                DefaultOutcome::ExceptionApplied {
                    blocker,
                    confidence: _,
                    steps,
                } => {
                    return Ok(ProveOutcome::Blocked {
                        method: "exception_applied".into(),
                        reason: format!("Exception applies: {blocker}"),
                        steps,
                    });
                }
                DefaultOutcome::NotApplicable => {}
            }
        }

        // Value-type inheritance for possession predicates: `has e T`
        // holds when `has e x` and `isA x … T`.
        if POSSESSION_OPERATORS.contains(&goal.operator.as_str()) {
            if let Some(derivation) = try_value_type_inheritance(session, state, goal, depth)? {
                return Ok(ProveOutcome::proved(
                    "value_type_inheritance",
                    derivation.confidence,
                    derivation.steps,
                ));
            }
        }
    }

    // Propositional modus ponens over `implies` facts.
    if goal.operator == "holds" && args.len() == 1 {
        if let Some(derivation) = try_modus_ponens(session, state, &args[0], depth)? {
            return Ok(ProveOutcome::proved(
                "modus_ponens",
                derivation.confidence,
                derivation.steps,
            ));
        }
    }

    // Rule matching, in session order, level-pruned when enabled.
    let goal_level = session.levels().concept_level(&goal.operator);
    for rule in session.rules() {
        if !rule
            .conclusion_leaves()
            .iter()
            .any(|leaf| kb.tokens_match(&leaf.operator, &goal.operator))
        {
            continue;
        }
        if state.use_level_optimization
            && !LevelMap::rule_within_level(rule, goal_level, state.strict_level_pruning)
        {
            continue;
        }
        if let Some(derivation) = try_rule_match(session, state, goal, vector, rule, depth)? {
            return Ok(ProveOutcome::proved(
                "rule_match",
                derivation.confidence,
                derivation.steps,
            ));
        }
    }

    // Weak direct match behind the entity-existence gate.
    if similarity > thresholds.strong_match {
        if let Some(subject) = args.first() {
            if kb.knows_entity(subject) {
                return Ok(ProveOutcome::proved(
                    "weak_direct",
                    similarity,
                    vec![Step::fact(StepOperation::WeakDirect, goal.to_string())
                        .with_confidence(similarity)],
                ));
            }
        }
    }

    Ok(ProveOutcome::NotProved)
}

/// Spatial negation through disjointness: `Not (locatedIn a b)` holds when
/// `locatedIn a c` and `disjoint b c`.
fn try_disjoint_negation(
    session: &Session,
    state: &mut ProofState,
    inner: &Statement,
) -> Result<Option<crate::state::Derivation>> {
    if inner.operator != "locatedIn" || inner.args.len() != 2 {
        return Ok(None);
    }
    let kb = session.kb();
    let thresholds = session.thresholds();
    let args = inner.arg_tokens();
    for located in kb.find_by_operator_and_arg0("locatedIn", &args[0], true) {
        state.tick()?;
        if located.metadata.args.len() != 2 {
            continue;
        }
        let there = located.metadata.args[1].clone();
        if kb.tokens_match(&there, &args[1]) {
            continue;
        }
        let disjoint = kb
            .find_exact("disjoint", &[args[1].clone(), there.clone()])
            .or_else(|| kb.find_exact("disjoint", &[there.clone(), args[1].clone()]));
        if let Some(disjoint) = disjoint {
            return Ok(Some(crate::state::Derivation {
                confidence: thresholds.transitive_base,
                steps: vec![
                    Step::fact(StepOperation::DisjointProof, located.rendered()),
                    Step::fact(StepOperation::DisjointProof, disjoint.rendered()),
                ],
            }));
        }
    }
    Ok(None)
}

/// `holds p` follows from `implies q p` and `holds q`.
fn try_modus_ponens(
    session: &Session,
    state: &mut ProofState,
    proposition: &str,
    depth: usize,
) -> Result<Option<crate::state::Derivation>> {
    let kb = session.kb();
    let thresholds = session.thresholds();
    for implication in kb.find_by_operator("implies", true) {
        state.tick()?;
        let [antecedent, consequent] = implication.metadata.args.as_slice() else {
            continue;
        };
        if !kb.tokens_match(consequent, proposition) {
            continue;
        }
        let premise = Statement::unary("holds", antecedent.clone());
        if let ProveOutcome::Proved {
            confidence,
            mut steps,
            ..
        } = prove_goal(session, state, &premise, depth + 1)?
        {
            steps.push(
                Step::fact(StepOperation::ModusPonens, implication.rendered())
                    .with_detail(format!("holds {antecedent} ⊢ holds {proposition}")),
            );
            return Ok(Some(crate::state::Derivation {
                confidence: confidence * thresholds.confidence_decay,
                steps,
            }));
        }
    }
    Ok(None)
}

/// `has e T` via `has e x ∧ isA x … T`.
fn try_value_type_inheritance(
    session: &Session,
    state: &mut ProofState,
    goal: &Statement,
    depth: usize,
) -> Result<Option<crate::state::Derivation>> {
    let kb = session.kb();
    let thresholds = session.thresholds();
    let args = goal.arg_tokens();
    if args.len() != 2 {
        return Ok(None);
    }
    for possession in kb.find_by_operator_and_arg0(&goal.operator, &args[0], true) {
        state.tick()?;
        if possession.metadata.args.len() != 2 {
            continue;
        }
        let owned = possession.metadata.args[1].clone();
        if kb.tokens_match(&owned, &args[1]) {
            continue;
        }
        if let Some(chain) = prove_transitive(session, state, "isA", &owned, &args[1], depth)? {
            let mut steps = vec![Step::fact(
                StepOperation::ValueTypeInheritance,
                possession.rendered(),
            )];
            steps.extend(chain.steps);
            return Ok(Some(crate::state::Derivation {
                confidence: chain.confidence * thresholds.confidence_decay,
                steps,
            }));
        }
    }
    Ok(None)
}
