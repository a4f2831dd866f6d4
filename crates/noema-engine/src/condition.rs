//! Condition prover
//!
//! Recursive descent with backtracking over `Leaf | And | Or | Not`
//! premise trees. `And` carries bindings left to right and retries earlier
//! parts through the enumerated alternatives (SLD style); `Or` succeeds at
//! the first succeeding branch without leaking bindings from failed ones;
//! `Not` is negation-as-failure under the closed-world switch, with
//! existential witness search for unbound variables.

use crate::error::Result;
use crate::matcher::find_all_fact_matches;
use crate::session::Session;
use crate::state::{ProofState, Solution};
use noema_core::{Bindings, Statement, Step, StepOperation};
use noema_kb::ConditionTree;

/// Cap on carried partial solutions inside one `And`.
const MAX_PARTIALS: usize = 64;
/// Cap on existential witnesses tried for one unbound `Not` variable.
const MAX_WITNESSES: usize = 64;

/// Prove a condition tree under a partial binding set, returning every
/// discovered solution in deterministic order.
pub(crate) fn prove_condition(
    session: &Session,
    state: &mut ProofState,
    tree: &ConditionTree,
    bindings: &Bindings,
    depth: usize,
) -> Result<Vec<Solution>> {
    if state.depth_exhausted(depth) {
        return Ok(Vec::new());
    }
    let thresholds = session.thresholds();
    match tree {
        ConditionTree::Leaf { ast, .. } => {
            find_all_fact_matches(session, state, ast, bindings, depth)
        }
        ConditionTree::And(parts) => {
            // An empty And trivially succeeds.
            let mut partials = vec![Solution {
                bindings: bindings.clone(),
                confidence: 1.0,
                steps: Vec::new(),
            }];
            for part in parts {
                let mut extended: Vec<Solution> = Vec::new();
                for partial in &partials {
                    for sub in
                        prove_condition(session, state, part, &partial.bindings, depth + 1)?
                    {
                        extended.push(Solution {
                            bindings: sub.bindings,
                            confidence: partial.confidence.min(sub.confidence),
                            steps: {
                                let mut steps = partial.steps.clone();
                                steps.extend(sub.steps);
                                steps
                            },
                        });
                        if extended.len() >= MAX_PARTIALS {
                            break;
                        }
                    }
                    if extended.len() >= MAX_PARTIALS {
                        break;
                    }
                }
                if extended.is_empty() {
                    return Ok(Vec::new());
                }
                partials = extended;
            }
            Ok(decayed(partials, thresholds.confidence_decay, thresholds.condition_confidence))
        }
        ConditionTree::Or(parts) => {
            let mut solutions = Vec::new();
            for part in parts {
                // Bindings from failed branches do not leak: each branch
                // starts from the caller's bindings.
                let found = prove_condition(session, state, part, bindings, depth + 1)?;
                solutions.extend(found);
                if solutions.len() >= MAX_PARTIALS {
                    break;
                }
            }
            Ok(decayed(solutions, thresholds.confidence_decay, thresholds.condition_confidence))
        }
        ConditionTree::Not(inner) => prove_negated(session, state, inner, bindings, depth),
    }
}

fn decayed(mut solutions: Vec<Solution>, decay: f64, floor: f64) -> Vec<Solution> {
    for solution in &mut solutions {
        solution.confidence *= decay;
    }
    solutions.retain(|s| s.confidence >= floor);
    solutions
}

/// Negation-as-failure for one negated sub-tree.
fn prove_negated(
    session: &Session,
    state: &mut ProofState,
    inner: &ConditionTree,
    bindings: &Bindings,
    depth: usize,
) -> Result<Vec<Solution>> {
    let thresholds = session.thresholds();
    let cwa = session.config().closed_world_assumption;

    // The negated form the KB can store explicitly, for the open-world path.
    let inner_leaf: Option<Statement> = match inner {
        ConditionTree::Leaf { ast, .. } => Some(ast.substituted(bindings)),
        _ => None,
    };

    let unbound = unbound_variables(inner, bindings);
    if unbound.is_empty() {
        if cwa {
            let proved = prove_condition(session, state, inner, bindings, depth + 1)?;
            if proved.is_empty() {
                return Ok(vec![negation_solution(
                    bindings.clone(),
                    thresholds.default_confidence,
                    inner_leaf.as_ref(),
                )]);
            }
            return Ok(Vec::new());
        }
        // Open world: only an explicit negation proves Not.
        if let Some(leaf) = &inner_leaf {
            if session
                .kb()
                .find_negation(&leaf.operator, &leaf.arg_tokens())
                .is_some()
            {
                return Ok(vec![negation_solution(
                    bindings.clone(),
                    thresholds.default_confidence,
                    Some(leaf),
                )]);
            }
        }
        return Ok(Vec::new());
    }

    if !cwa {
        // Open world with holes: enumerate stored negations that unify.
        let Some(leaf) = &inner_leaf else {
            return Ok(Vec::new());
        };
        let mut solutions = Vec::new();
        for fact in session.kb().find_by_operator("Not", true) {
            state.tick()?;
            let Some(stored_inner) = fact.metadata.inner_statement() else {
                continue;
            };
            if let Some(extended) = crate::unify::unify(session.kb(), leaf, &stored_inner, bindings)
            {
                solutions.push(negation_solution(
                    extended,
                    thresholds.default_confidence,
                    Some(&stored_inner),
                ));
            }
        }
        return Ok(solutions);
    }

    // Closed world with holes: existential witness search over the entity
    // domain. Bind the first unbound variable to each candidate and keep
    // the ones whose instantiated inner goal is unprovable.
    let witness_var = unbound[0].clone();
    let mut solutions = Vec::new();
    for candidate in session.kb().entity_domain().into_iter().take(MAX_WITNESSES) {
        state.tick()?;
        let mut attempt = bindings.clone();
        attempt.insert(witness_var.clone(), candidate.clone());
        let proved = prove_condition(session, state, inner, &attempt, depth + 1)?;
        if proved.is_empty() {
            solutions.push(negation_solution(
                attempt,
                thresholds.default_confidence,
                inner_leaf.as_ref(),
            ));
            if solutions.len() >= MAX_PARTIALS {
                break;
            }
        }
    }
    Ok(solutions)
}

fn negation_solution(bindings: Bindings, confidence: f64, inner: Option<&Statement>) -> Solution {
    let mut step = Step::new(StepOperation::ConditionNot).with_confidence(confidence);
    if let Some(inner) = inner {
        step = step.with_detail(format!("Not ({})", inner.instantiate(&bindings)));
    }
    Solution {
        bindings,
        confidence,
        steps: vec![step],
    }
}

/// Variables of the sub-tree still unbound under `bindings`, first-seen
/// order.
fn unbound_variables(tree: &ConditionTree, bindings: &Bindings) -> Vec<String> {
    let mut out = Vec::new();
    for leaf in tree.leaves() {
        for name in leaf.variables() {
            if crate::unify::lookup(bindings, &name).is_none()
                && !out.iter().any(|seen| *seen == name)
            {
                out.push(name);
            }
        }
    }
    out
}

