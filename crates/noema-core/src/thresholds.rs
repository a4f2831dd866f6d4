//! Per-strategy threshold tables
//!
//! Each HDC strategy has its own operating point: exact vectors compare by
//! equality, dense binary hypervectors tolerate more noise, sparse block
//! vectors sit in between. All confidence arithmetic in the engine reads
//! from this table; no strategy hardcodes a constant.

use crate::options::HdcStrategy;
use serde::{Deserialize, Serialize};

/// Similarity and confidence constants for one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Minimum similarity for a direct-match candidate.
    pub similarity: f64,
    /// Minimum similarity for validating an HDC candidate.
    pub verification: f64,
    /// Confidence granted when metadata holds the exact fact.
    pub strong_match: f64,
    /// Similarity above which a direct match needs no metadata fallback.
    pub very_strong_match: f64,
    /// Minimum similarity for an HDC candidate to be proposed at all.
    pub hdc_match: f64,
    /// Minimum similarity between a rule conclusion and a goal.
    pub conclusion_match: f64,
    /// Floor for a proved condition's confidence.
    pub condition_confidence: f64,
    /// Multiplier applied at every recursion step.
    pub confidence_decay: f64,
    /// Base confidence of a one-edge transitive chain.
    pub transitive_base: f64,
    /// Per-extra-edge decay of a transitive chain.
    pub transitive_decay: f64,
    /// Minimum similarity for matching legacy reference-form negations.
    pub rule_match: f64,
    /// Confidence of a goal established through a rule.
    pub rule_confidence: f64,
    /// Similarity for the plain direct scan in the query engine.
    pub direct_match: f64,
    /// Confidence of an applied default.
    pub default_confidence: f64,
    /// Lower edge of the analogy band (inclusive).
    pub analogy_min: f64,
    /// Upper edge of the analogy band (exclusive; above is "same fact").
    pub analogy_max: f64,
    /// Multiplier applied to analogical explanations.
    pub analogy_discount: f64,
    /// Score of a bundle-intersection query answer.
    pub bundle_common_score: f64,
    /// Fixed confidence of a synonym match.
    pub synonym_confidence: f64,
}

impl Thresholds {
    /// Operating point for a strategy.
    pub fn for_strategy(strategy: HdcStrategy) -> Self {
        match strategy {
            HdcStrategy::Exact => Self {
                similarity: 0.99,
                verification: 0.99,
                strong_match: 0.8,
                very_strong_match: 0.98,
                hdc_match: 0.99,
                conclusion_match: 0.99,
                condition_confidence: 0.5,
                confidence_decay: 0.95,
                transitive_base: 0.9,
                transitive_decay: 0.9,
                rule_match: 0.99,
                rule_confidence: 0.85,
                direct_match: 0.99,
                default_confidence: 0.9,
                analogy_min: 0.4,
                analogy_max: 0.98,
                analogy_discount: 0.6,
                bundle_common_score: 0.75,
                synonym_confidence: 0.95,
            },
            HdcStrategy::DenseBinary => Self {
                similarity: 0.82,
                verification: 0.85,
                strong_match: 0.8,
                very_strong_match: 0.95,
                hdc_match: 0.78,
                conclusion_match: 0.8,
                condition_confidence: 0.5,
                confidence_decay: 0.95,
                transitive_base: 0.9,
                transitive_decay: 0.9,
                rule_match: 0.85,
                rule_confidence: 0.85,
                direct_match: 0.88,
                default_confidence: 0.9,
                analogy_min: 0.35,
                analogy_max: 0.88,
                analogy_discount: 0.6,
                bundle_common_score: 0.75,
                synonym_confidence: 0.95,
            },
            HdcStrategy::SparsePolynomial => Self {
                similarity: 0.75,
                verification: 0.8,
                strong_match: 0.8,
                very_strong_match: 0.92,
                hdc_match: 0.7,
                conclusion_match: 0.75,
                condition_confidence: 0.5,
                confidence_decay: 0.95,
                transitive_base: 0.9,
                transitive_decay: 0.9,
                rule_match: 0.8,
                rule_confidence: 0.85,
                direct_match: 0.82,
                default_confidence: 0.9,
                analogy_min: 0.3,
                analogy_max: 0.82,
                analogy_discount: 0.6,
                bundle_common_score: 0.75,
                synonym_confidence: 0.95,
            },
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::for_strategy(HdcStrategy::Exact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_table_is_strictest() {
        let exact = Thresholds::for_strategy(HdcStrategy::Exact);
        let dense = Thresholds::for_strategy(HdcStrategy::DenseBinary);
        let sparse = Thresholds::for_strategy(HdcStrategy::SparsePolynomial);
        assert!(exact.similarity > dense.similarity);
        assert!(dense.similarity > sparse.similarity);
        assert!(exact.analogy_max > sparse.analogy_max);
    }
}
