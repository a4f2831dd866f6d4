//! HDC-first engine variants
//!
//! Contract-identical to the symbolic engine. Vector similarity proposes
//! candidates; the symbolic engine validates them. Unvalidated hits are
//! discarded. Synonym matches sourced from ComponentKB metadata
//! equivalence are trusted without re-validation. Quantified goals
//! delegate to the symbolic engine unconditionally.

use crate::prove::SymbolicEngine;
use crate::query::run_query;
use crate::relations::prove_transitive;
use crate::session::Session;
use crate::state::ProofState;
use crate::stats::ReasoningStats;
use noema_core::{
    Bindings, HdcStrategy, ProofResult, ProveOptions, QueryMatch, QueryOptions, QueryResult,
    Statement, Step, StepOperation,
};
use noema_hdc::{is_reserved_token, position_role, Vector, OPERATOR_ROLE};
use tracing::debug;

/// Candidates considered per hole when decoding a query vector.
const DECODE_TOP_K: usize = 8;

/// The holographic engine owns the symbolic one for validation.
#[derive(Debug, Default, Clone, Copy)]
pub struct HolographicEngine {
    symbolic: SymbolicEngine,
}

impl HolographicEngine {
    pub fn new() -> Self {
        Self {
            symbolic: SymbolicEngine,
        }
    }

    /// HDC-first proof: similarity passes first, each hit validated
    /// symbolically, full symbolic fallback when policy permits.
    pub fn prove(
        &self,
        session: &Session,
        goal: &Statement,
        options: &ProveOptions,
    ) -> ProofResult {
        if is_quantified(goal) {
            return self.symbolic.prove(session, goal, options);
        }
        let goal_vector = match session.encode(goal) {
            Ok(vector) => vector,
            Err(error) => return ProofResult::failure(goal.to_string(), error.to_string()),
        };

        if let Some(result) = self.direct_candidates(session, goal, &goal_vector, options) {
            return result;
        }
        if let Some(result) = self.transitive_candidates(session, goal, options) {
            return result;
        }
        if let Some(result) = self.rule_candidates(session, goal, &goal_vector, options) {
            return result;
        }

        if session.config().hdc_fallback_to_symbolic {
            return self.symbolic.prove(session, goal, options);
        }
        ProofResult::failure(goal.to_string(), "No HDC candidate survived validation")
    }

    /// Direct similarity scan narrowed by the operator index.
    fn direct_candidates(
        &self,
        session: &Session,
        goal: &Statement,
        goal_vector: &Vector,
        options: &ProveOptions,
    ) -> Option<ProofResult> {
        let kb = session.kb();
        let thresholds = session.thresholds();
        let space = session.space();
        let args = goal.arg_tokens();
        let candidates = match args.first() {
            Some(arg0) => kb.find_by_operator_and_arg0(&goal.operator, arg0, true),
            None => kb.find_by_operator(&goal.operator, true),
        };
        for fact in candidates {
            let Some(vector) = &fact.vector else {
                continue;
            };
            let similarity = space.similarity(goal_vector, vector);
            if similarity < thresholds.hdc_match {
                continue;
            }
            ReasoningStats::bump(&session.stats().hdc_candidates);

            // Metadata-equivalent candidates (synonym matches included)
            // are trusted without re-validation.
            let equivalent = kb.tokens_match(&fact.metadata.operator, &goal.operator)
                && fact.metadata.args.len() == args.len()
                && fact
                    .metadata
                    .args
                    .iter()
                    .zip(&args)
                    .all(|(stored, wanted)| kb.tokens_match(stored, wanted));
            if equivalent {
                ReasoningStats::bump(&session.stats().hdc_validated);
                let mut result =
                    ProofResult::success(goal.to_string(), "hdc_direct", similarity).with_steps(
                        vec![
                            Step::fact(StepOperation::HdcCandidate, fact.rendered())
                                .with_confidence(similarity),
                            Step::fact(StepOperation::SynonymMatch, fact.rendered()),
                        ],
                    );
                result.reasoning_steps = 1;
                return Some(result);
            }

            let validated = self.symbolic.prove(session, goal, options);
            if validated.valid {
                ReasoningStats::bump(&session.stats().hdc_validated);
                return Some(annotate(validated, fact.rendered(), similarity));
            }
            debug!(candidate = %fact.rendered(), "HDC hit discarded by validation");
        }
        None
    }

    /// Transitive-chain discovery. Validation checks each edge exists as a
    /// KB fact, which the chain walk guarantees by construction.
    fn transitive_candidates(
        &self,
        session: &Session,
        goal: &Statement,
        options: &ProveOptions,
    ) -> Option<ProofResult> {
        let args = goal.arg_tokens();
        if args.len() != 2 || !session.semantic().is_transitive(&goal.operator) {
            return None;
        }
        let mut state = ProofState::new(options);
        let chain =
            prove_transitive(session, &mut state, &goal.operator, &args[0], &args[1], 0)
                .ok()
                .flatten()?;
        ReasoningStats::bump(&session.stats().hdc_candidates);
        ReasoningStats::bump(&session.stats().hdc_validated);
        let mut result =
            ProofResult::success(goal.to_string(), "hdc_transitive", chain.confidence)
                .with_steps(chain.steps);
        result.reasoning_steps = state.steps_used;
        Some(result)
    }

    /// Rule-conclusion similarity; hits are re-proved symbolically and the
    /// resulting step list attached.
    fn rule_candidates(
        &self,
        session: &Session,
        goal: &Statement,
        goal_vector: &Vector,
        options: &ProveOptions,
    ) -> Option<ProofResult> {
        let thresholds = session.thresholds();
        let space = session.space();
        for rule in session.rules() {
            let Some(conclusion_vector) = &rule.conclusion_vector else {
                continue;
            };
            let similarity = space.similarity(goal_vector, conclusion_vector);
            if similarity < thresholds.conclusion_match && !rule.has_variables {
                continue;
            }
            if rule.has_variables {
                // Variable conclusions encode their hole tokens, so raw
                // similarity undershoots; let unification decide instead.
                let renamed = crate::unify::rename_rule_apart(rule, 11).1;
                let matches_any = conclusion_operator_matches(session, &renamed, goal);
                if !matches_any {
                    continue;
                }
            }
            ReasoningStats::bump(&session.stats().hdc_candidates);
            let validated = self.symbolic.prove(session, goal, options);
            if validated.valid {
                ReasoningStats::bump(&session.stats().hdc_validated);
                return Some(annotate(validated, rule.name.clone(), similarity));
            }
        }
        None
    }

    /// Hole-filling through the vector runtime: unbind the query from the
    /// KB bundle, decode each hole position against the vocabulary, verify
    /// every candidate with a symbolic proof, and emit only verified
    /// bindings.
    pub fn query(
        &self,
        session: &Session,
        pattern: &Statement,
        options: &QueryOptions,
    ) -> QueryResult {
        if session.config().hdc_strategy == HdcStrategy::Exact {
            // Equality similarity cannot decode superpositions; the
            // symbolic scan is the exact-mode answer.
            return run_query(session, pattern, options);
        }
        let holes = pattern.variables();
        if holes.len() != 1 {
            return run_query(session, pattern, options);
        }

        match self.decode_and_verify(session, pattern, &holes[0], None, options) {
            Some(matches) if !matches.is_empty() => {
                QueryResult::from_matches(matches, false)
            }
            _ => run_query(session, pattern, options),
        }
    }

    /// Progressive variant: iterate cumulative level bundles, returning
    /// early once a level yields verified bindings.
    pub fn query_progressive(
        &self,
        session: &Session,
        pattern: &Statement,
        options: &QueryOptions,
    ) -> QueryResult {
        if session.config().hdc_strategy == HdcStrategy::Exact {
            return run_query(session, pattern, options);
        }
        let holes = pattern.variables();
        if holes.len() != 1 {
            return run_query(session, pattern, options);
        }
        for level in 1..=session.levels().max_fact_level() {
            if let Some(matches) =
                self.decode_and_verify(session, pattern, &holes[0], Some(level), options)
            {
                if !matches.is_empty() {
                    return QueryResult::from_matches(matches, false);
                }
            }
        }
        run_query(session, pattern, options)
    }

    fn decode_and_verify(
        &self,
        session: &Session,
        pattern: &Statement,
        hole: &str,
        max_level: Option<u32>,
        options: &QueryOptions,
    ) -> Option<Vec<QueryMatch>> {
        let space = session.space();
        let vectors: Vec<&Vector> = session
            .kb()
            .facts()
            .iter()
            .filter(|fact| match max_level {
                Some(level) => session
                    .levels()
                    .fact_level(fact.id)
                    .map(|l| l <= level)
                    .unwrap_or(false),
                None => true,
            })
            .filter_map(|fact| fact.vector.as_ref())
            .collect();
        if vectors.is_empty() {
            return None;
        }
        let kb_bundle = space.bundle(&vectors).ok()?;

        // Query vector from the known parts only.
        let operator_part = space
            .bind(&space.atom(OPERATOR_ROLE), &space.atom(&pattern.operator))
            .ok()?;
        let mut parts = vec![operator_part];
        let mut hole_position = None;
        for (index, token) in pattern.arg_tokens().iter().enumerate() {
            if token.starts_with('?') {
                hole_position = Some(index);
                continue;
            }
            let bound = space
                .bind(&space.atom(&position_role(index)), &space.atom(token))
                .ok()?;
            parts.push(bound);
        }
        let hole_position = hole_position?;
        let refs: Vec<&Vector> = parts.iter().collect();
        let query_vector = space.bundle(&refs).ok()?;

        let answer = space.unbind(&kb_bundle, &query_vector).ok()?;
        let decoded = space
            .unbind(&answer, &space.atom(&position_role(hole_position)))
            .ok()?;

        let mut matches = Vec::new();
        let prove_options = ProveOptions {
            timeout: options.timeout,
            max_depth: options.max_depth,
            ..ProveOptions::default()
        };
        for hit in session.vocabulary().top_k_similar(&decoded, DECODE_TOP_K) {
            if is_reserved_token(&hit.name) {
                continue;
            }
            ReasoningStats::bump(&session.stats().hdc_candidates);
            let mut bindings = Bindings::new();
            bindings.insert(hole.to_string(), hit.name.clone());
            let ground = pattern.substituted(&bindings);
            let verified = self.symbolic.prove(session, &ground, &prove_options);
            if verified.valid {
                ReasoningStats::bump(&session.stats().hdc_validated);
                matches.push(QueryMatch {
                    bindings,
                    score: verified.confidence,
                    method: "hdc_decode".to_string(),
                    steps: verified.proof.unwrap_or_default(),
                });
            }
            if matches.len() >= options.max_results {
                break;
            }
        }
        Some(matches)
    }
}

fn annotate(mut result: ProofResult, candidate: String, similarity: f64) -> ProofResult {
    let mut steps = vec![
        Step::fact(StepOperation::HdcCandidate, candidate).with_confidence(similarity),
        Step::new(StepOperation::HdcValidated),
    ];
    steps.extend(result.steps);
    result.steps = steps.clone();
    if result.proof.is_some() {
        result.proof = Some(steps);
    }
    result
}

fn conclusion_operator_matches(session: &Session, conclusion: &Statement, goal: &Statement) -> bool {
    session.kb().tokens_match(&conclusion.operator, &goal.operator)
        && conclusion.args.len() == goal.args.len()
}

/// Quantified goals (and their negations) always take the symbolic path.
fn is_quantified(goal: &Statement) -> bool {
    match goal.operator.as_str() {
        "Exists" | "ForAll" => true,
        "Not" => goal
            .negation_inner()
            .map(|inner| matches!(inner.operator.as_str(), "Exists" | "ForAll"))
            .unwrap_or(false),
        _ => false,
    }
}
