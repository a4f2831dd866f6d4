//! Session: the long-lived reasoning context
//!
//! Owns the KB, rules, indices, vocabulary, level map and configuration
//! for its lifetime. Proof and query calls borrow it immutably; only
//! explicit forward chaining (and loading) mutates it. Statistics
//! counters are advisory atomics.

use crate::abduce::run_abduce;
use crate::backend::ReasoningBackend;
use crate::error::EngineError;
use crate::forward::run_forward_chain;
use crate::holographic::HolographicEngine;
use crate::prove::SymbolicEngine;
use crate::stats::ReasoningStats;
use indexmap::IndexMap;
use noema_core::{
    AbduceOptions, AbductionResult, ProofResult, ProveOptions, QueryOptions, QueryResult,
    ReasoningPriority, SessionConfig, Statement, Term, Thresholds,
};
use noema_hdc::{encode_statement, encode_statement_pure, Vector, VectorSpace, Vocabulary};
use noema_kb::{ComponentKb, FactMetadata, LevelMap, Rule, SemanticIndex};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Result alias for session construction and loading.
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Failures while building or loading a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Parse error: {0}")]
    Parse(#[from] noema_parser::ParseError),

    #[error("Knowledge base error: {0}")]
    Kb(#[from] noema_kb::KbError),

    #[error("Vector runtime error: {0}")]
    Hdc(#[from] noema_hdc::HdcError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid statement: {0}")]
    Invalid(String),
}

/// What one `load` call contributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub facts: usize,
    pub rules: usize,
    pub declarations: usize,
}

/// Long-lived reasoning context.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    thresholds: Thresholds,
    space: VectorSpace,
    kb: ComponentKb,
    rules: Vec<Rule>,
    semantic: SemanticIndex,
    vocabulary: Vocabulary,
    levels: LevelMap,
    bundles: IndexMap<String, Vec<String>>,
    stats: ReasoningStats,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let space = VectorSpace::new(config.hdc_strategy);
        Self {
            thresholds: Thresholds::for_strategy(config.hdc_strategy),
            space,
            kb: ComponentKb::new(config.canonicalization_enabled),
            rules: Vec::new(),
            semantic: SemanticIndex::new(),
            vocabulary: Vocabulary::new(space),
            levels: LevelMap::new(),
            bundles: IndexMap::new(),
            stats: ReasoningStats::default(),
            config,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(SessionConfig::default())
    }

    // Accessors used across the engine modules.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }
    pub fn space(&self) -> &VectorSpace {
        &self.space
    }
    pub fn kb(&self) -> &ComponentKb {
        &self.kb
    }
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
    pub fn semantic(&self) -> &SemanticIndex {
        &self.semantic
    }
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }
    pub fn levels(&self) -> &LevelMap {
        &self.levels
    }
    pub fn stats(&self) -> &ReasoningStats {
        &self.stats
    }

    /// Members of a named entity bundle, if declared.
    pub fn bundle(&self, name: &str) -> Option<Vec<String>> {
        self.bundles.get(name).cloned()
    }

    /// Encode a statement without touching session state. Atom vectors are
    /// deterministic functions of their names, so this matches what load
    /// time produced.
    pub fn encode(&self, stmt: &Statement) -> Result<Vector, EngineError> {
        Ok(encode_statement_pure(&self.space, stmt)?)
    }

    /// Load a theory / domain source: rules, semantic declarations, facts.
    pub fn load(&mut self, source: &str) -> SessionResult<LoadReport> {
        let statements = noema_parser::parse(source)?;
        let mut report = LoadReport::default();
        for stmt in statements {
            if self.semantic.absorb(&stmt) {
                report.declarations += 1;
                continue;
            }
            if let Some((condition, conclusion)) = rule_parts(&stmt) {
                self.add_rule(condition, conclusion)?;
                report.rules += 1;
                continue;
            }
            self.add_fact(&stmt)?;
            report.facts += 1;
        }
        info!(
            facts = report.facts,
            rules = report.rules,
            declarations = report.declarations,
            "theory loaded"
        );
        Ok(report)
    }

    /// Insert one fact statement, indexing it and assigning its level.
    pub fn add_fact(&mut self, stmt: &Statement) -> SessionResult<u64> {
        if stmt.operator.is_empty() {
            return Err(SessionError::Invalid("statement has no operator".into()));
        }
        if matches!(stmt.operator.as_str(), "bundle" | "induce") && stmt.args.len() >= 2 {
            let tokens = stmt.arg_tokens();
            self.bundles
                .insert(tokens[0].clone(), tokens[1..].to_vec());
        }
        let vector = encode_statement(&mut self.vocabulary, stmt)?;
        let id = self.kb.add_statement(stmt, Some(vector));
        if let Some(fact) = self.kb.fact(id) {
            let metadata = fact.metadata.clone();
            self.levels.observe_fact(id, &metadata);
        }
        Ok(id)
    }

    /// Insert a rule, enforcing the variable-safety invariant and
    /// recording its constructivist levels.
    pub fn add_rule(
        &mut self,
        condition: Statement,
        conclusion: Statement,
    ) -> SessionResult<u64> {
        let id = self.rules.len() as u64;
        let mut rule = Rule::new(id, condition, conclusion)?;
        rule.conclusion_vector = Some(encode_statement(&mut self.vocabulary, &rule.conclusion)?);
        let (conclusion_level, max_premise_level) = self.levels.observe_rule(&rule);
        rule.conclusion_level = Some(conclusion_level);
        rule.max_premise_level = Some(max_premise_level);
        debug!(rule = %rule.name, "rule added");
        self.rules.push(rule);
        Ok(id)
    }

    /// Insert a fact produced by forward chaining, provenance-linked to
    /// the rule that derived it.
    pub(crate) fn insert_derived_fact(
        &mut self,
        stmt: &Statement,
        rule_name: &str,
    ) -> Result<u64, EngineError> {
        let vector = encode_statement(&mut self.vocabulary, stmt)?;
        let mut metadata = FactMetadata::from_statement(stmt);
        metadata.derived = true;
        metadata.proof = Some(rule_name.to_string());
        let id = self.kb.add_fact(metadata.clone(), Some(vector));
        self.levels.observe_fact(id, &metadata);
        ReasoningStats::bump(&self.stats.facts_derived);
        Ok(id)
    }

    /// The engine variant the session's reasoning priority selects.
    fn backend(&self) -> Box<dyn ReasoningBackend> {
        match self.config.reasoning_priority {
            ReasoningPriority::SymbolicPriority => Box::new(SymbolicEngine),
            ReasoningPriority::HolographicPriority => Box::new(HolographicEngine::new()),
        }
    }

    /// Prove a goal with the engine the session's priority selects.
    pub fn prove(&self, goal: &Statement, options: &ProveOptions) -> ProofResult {
        ReasoningStats::bump(&self.stats.proofs_attempted);
        let started = std::time::Instant::now();
        let result = self.backend().prove(self, goal, options);
        if result.valid {
            ReasoningStats::bump(&self.stats.proofs_succeeded);
        }
        ReasoningStats::add(
            &self.stats.reasoning_steps,
            result.reasoning_steps as u64,
        );
        if self.config.timers_enabled {
            ReasoningStats::add(
                &self.stats.elapsed_micros,
                started.elapsed().as_micros() as u64,
            );
        }
        result
    }

    /// Enumerate bindings for a pattern with holes.
    pub fn query(&self, pattern: &Statement, options: &QueryOptions) -> QueryResult {
        ReasoningStats::bump(&self.stats.queries_run);
        self.backend().query(self, pattern, options)
    }

    /// Progressive level-wise query (holographic candidate search over
    /// cumulative level bundles).
    pub fn query_progressive(
        &self,
        pattern: &Statement,
        options: &QueryOptions,
    ) -> QueryResult {
        ReasoningStats::bump(&self.stats.queries_run);
        HolographicEngine::new().query_progressive(self, pattern, options)
    }

    /// Best-explanation search for an observation.
    pub fn abduce(&self, observation: &Statement, options: &AbduceOptions) -> AbductionResult {
        ReasoningStats::bump(&self.stats.abductions_run);
        run_abduce(self, observation, options)
    }

    /// Run forward chaining to fixpoint; derived facts join the KB.
    pub fn forward_chain(&mut self, max_rounds: Option<usize>) -> SessionResult<Vec<u64>> {
        Ok(run_forward_chain(self, max_rounds)?)
    }

    /// Persistable state: facts (metadata only), rules, semantic
    /// declarations, bundles and configuration.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            config: self.config.clone(),
            facts: self
                .kb
                .facts()
                .iter()
                .map(|fact| fact.metadata.clone())
                .collect(),
            rules: self
                .rules
                .iter()
                .map(|rule| RuleSnapshot {
                    condition: rule.condition.clone(),
                    conclusion: rule.conclusion.clone(),
                })
                .collect(),
            semantic: self.semantic.clone(),
            bundles: self.bundles.clone(),
        }
    }

    /// Rebuild a session from a snapshot; vectors and indices are derived
    /// state and are reconstructed.
    pub fn restore(snapshot: SessionSnapshot) -> SessionResult<Self> {
        let mut session = Session::new(snapshot.config);
        session.semantic = snapshot.semantic;
        session.bundles = snapshot.bundles;
        for metadata in snapshot.facts {
            let vector = encode_statement(&mut session.vocabulary, &metadata.statement())?;
            let id = session.kb.add_fact(metadata.clone(), Some(vector));
            session.levels.observe_fact(id, &metadata);
        }
        for rule in snapshot.rules {
            session.add_rule(rule.condition, rule.conclusion)?;
        }
        Ok(session)
    }
}

/// Persisted form of one rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSnapshot {
    pub condition: Statement,
    pub conclusion: Statement,
}

/// Opaque persisted session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub config: SessionConfig,
    pub facts: Vec<FactMetadata>,
    pub rules: Vec<RuleSnapshot>,
    pub semantic: SemanticIndex,
    pub bundles: IndexMap<String, Vec<String>>,
}

impl SessionSnapshot {
    pub fn to_json(&self) -> SessionResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> SessionResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// `Implies (condition…) (conclusion…)`: capitalised always a rule, the
/// lowercase form only when both sides are compound (a bare `implies p q`
/// fact feeds propositional modus ponens instead).
fn rule_parts(stmt: &Statement) -> Option<(Statement, Statement)> {
    let compound = |term: &Term| match term {
        Term::Compound(inner) => Some(inner.clone()),
        _ => None,
    };
    match (stmt.operator.as_str(), stmt.args.as_slice()) {
        ("Implies" | "implies", [condition, conclusion]) => {
            Some((compound(condition)?, compound(conclusion)?))
        }
        _ => None,
    }
}

/// Parse a single statement from text, for callers assembling goals by
/// hand.
pub fn parse_statement(text: &str) -> SessionResult<Statement> {
    let mut statements = noema_parser::parse(text)?;
    match statements.len() {
        1 => Ok(statements.remove(0)),
        0 => Err(SessionError::Invalid("empty statement".into())),
        n => Err(SessionError::Invalid(format!(
            "expected one statement, found {n}"
        ))),
    }
}

/// Check whether the session knows nothing yet (useful in tests and REPL
/// front-ends deciding whether to seed a default theory).
impl Session {
    pub fn is_empty(&self) -> bool {
        self.kb.is_empty() && self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_routes_statements() {
        let mut session = Session::with_defaults();
        let report = session
            .load(
                "transitiveRelation ancestorOf\n\
                 isA Rex Dog\n\
                 Implies (And (human ?x) (mortal ?x)) (subject ?x)\n",
            )
            .unwrap();
        assert_eq!(report.declarations, 1);
        assert_eq!(report.facts, 1);
        assert_eq!(report.rules, 1);
        assert!(session.semantic().is_transitive("ancestorOf"));
        assert_eq!(session.rules().len(), 1);
    }

    #[test]
    fn lowercase_implies_fact_is_not_a_rule() {
        let mut session = Session::with_defaults();
        let report = session.load("implies rain wet\n").unwrap();
        assert_eq!(report.rules, 0);
        assert_eq!(report.facts, 1);
    }

    #[test]
    fn snapshot_round_trips() {
        let mut session = Session::with_defaults();
        session
            .load(
                "inverseRelation parentOf childOf\n\
                 childOf Alice Bob\n\
                 Implies (human ?x) (mortal ?x)\n",
            )
            .unwrap();
        let json = session.snapshot().to_json().unwrap();
        let restored = Session::restore(SessionSnapshot::from_json(&json).unwrap()).unwrap();
        assert_eq!(restored.kb().len(), session.kb().len());
        assert_eq!(restored.rules().len(), 1);
        assert_eq!(
            restored.semantic().inverse_of("parentOf").as_deref(),
            Some("childOf")
        );
    }
}
