//! Proof-step records
//!
//! Every reasoning strategy emits [`Step`]s naming the evidence it used.
//! The operation discriminant is a closed enum rather than a free string so
//! traces stay byte-identical across runs.

use crate::ast::Bindings;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant for a proof step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOperation {
    /// Goal matched a stored fact directly (strong similarity + metadata).
    DirectFact,
    /// Metadata held the exact fact even though similarity was weak.
    MetadataFact,
    /// Weak similarity accepted behind the entity-existence gate.
    WeakDirect,
    /// Goal matched through a synonym of its second argument.
    SynonymMatch,
    /// One edge of a transitive chain.
    TransitiveEdge,
    /// Whole-chain summary for a transitive proof.
    TransitiveChain,
    /// Symmetric relation satisfied by the reversed fact.
    SymmetricDirect,
    /// Reflexive relation satisfied trivially (`R x x`).
    ReflexiveDirect,
    /// Inverse relation satisfied by the inverted fact's metadata.
    InverseDirectMetadata,
    /// Property inherited from an ancestor type.
    InheritedProperty,
    /// One `isA` hop walked while resolving inheritance.
    IsaHop,
    /// An explicit `Not` fact was found for the goal.
    NotFact,
    /// Negation concluded because the positive goal failed under CWA.
    ClosedWorldAssumption,
    /// A default applied for an inheritable property.
    DefaultApplied,
    /// Two or more same-specificity defaults split the confidence.
    DefaultConflictSplit,
    /// A strictly more specific exception blocked every default.
    ExceptionApplied,
    /// Propositional modus ponens over `implies` / `holds`.
    ModusPonens,
    /// A rule's conclusion unified with the goal.
    RuleMatch,
    /// One premise of a matched rule was established.
    PremiseMatch,
    /// Conjunction node proved.
    ConditionAnd,
    /// Disjunction node proved.
    ConditionOr,
    /// Negation node proved (negation-as-failure or explicit).
    ConditionNot,
    /// Spatial disjointness proof for a negated `locatedIn`-style goal.
    DisjointProof,
    /// Value-type inheritance for possession predicates.
    ValueTypeInheritance,
    /// Holographic candidate proposed by similarity search.
    HdcCandidate,
    /// Holographic candidate survived symbolic validation.
    HdcValidated,
    /// Query binding emitted.
    QueryBinding,
    /// Abductive hypothesis recorded.
    Hypothesis,
    /// Causal edge walked backwards during abduction.
    CausalEdge,
    /// Analogical match within the similarity band.
    AnalogyMatch,
    /// Derived fact inserted by forward chaining.
    ForwardDerived,
    /// Cycle key already on the path; branch abandoned.
    CycleDetected,
}

impl StepOperation {
    /// Stable snake_case name used in rendered traces.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepOperation::DirectFact => "direct_fact",
            StepOperation::MetadataFact => "metadata_fact",
            StepOperation::WeakDirect => "weak_direct",
            StepOperation::SynonymMatch => "synonym_match",
            StepOperation::TransitiveEdge => "transitive_edge",
            StepOperation::TransitiveChain => "transitive_chain",
            StepOperation::SymmetricDirect => "symmetric_direct",
            StepOperation::ReflexiveDirect => "reflexive_direct",
            StepOperation::InverseDirectMetadata => "inverse_direct_metadata",
            StepOperation::InheritedProperty => "inherited_property",
            StepOperation::IsaHop => "isa_hop",
            StepOperation::NotFact => "not_fact",
            StepOperation::ClosedWorldAssumption => "closed_world_assumption",
            StepOperation::DefaultApplied => "default_applied",
            StepOperation::DefaultConflictSplit => "default_conflict_split",
            StepOperation::ExceptionApplied => "exception_applied",
            StepOperation::ModusPonens => "modus_ponens",
            StepOperation::RuleMatch => "rule_match",
            StepOperation::PremiseMatch => "premise_match",
            StepOperation::ConditionAnd => "condition_and",
            StepOperation::ConditionOr => "condition_or",
            StepOperation::ConditionNot => "condition_not",
            StepOperation::DisjointProof => "disjoint_proof",
            StepOperation::ValueTypeInheritance => "value_type_inheritance",
            StepOperation::HdcCandidate => "hdc_candidate",
            StepOperation::HdcValidated => "hdc_validated",
            StepOperation::QueryBinding => "query_binding",
            StepOperation::Hypothesis => "hypothesis",
            StepOperation::CausalEdge => "causal_edge",
            StepOperation::AnalogyMatch => "analogy_match",
            StepOperation::ForwardDerived => "forward_derived",
            StepOperation::CycleDetected => "cycle_detected",
        }
    }
}

impl fmt::Display for StepOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record in a justification trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub operation: StepOperation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bindings: Option<Bindings>,
}

impl Step {
    pub fn new(operation: StepOperation) -> Self {
        Self {
            operation,
            fact: None,
            rule: None,
            confidence: None,
            detail: None,
            bindings: None,
        }
    }

    pub fn fact(operation: StepOperation, fact: impl Into<String>) -> Self {
        Self {
            fact: Some(fact.into()),
            ..Self::new(operation)
        }
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.bindings = Some(bindings);
        self
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.operation)?;
        if let Some(fact) = &self.fact {
            write!(f, " [{fact}]")?;
        }
        if let Some(rule) = &self.rule {
            write!(f, " rule={rule}")?;
        }
        if let Some(confidence) = self.confidence {
            write!(f, " conf={confidence:.3}")?;
        }
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_renders_operation_and_evidence() {
        let step = Step::fact(StepOperation::TransitiveEdge, "isA Rex Dog")
            .with_confidence(0.9);
        assert_eq!(step.to_string(), "transitive_edge [isA Rex Dog] conf=0.900");
    }
}
