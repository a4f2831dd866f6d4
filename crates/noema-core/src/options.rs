//! Call options and session configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which vector strategy the session runs under. Selects the threshold table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum HdcStrategy {
    /// Canonical-form vectors; similarity is equality. The reference mode.
    #[default]
    Exact,
    /// Dense binary hypervectors: XOR bind, majority bundle.
    DenseBinary,
    /// Block-structured sparse vectors: modular bind, per-block majority.
    SparsePolynomial,
}

/// Which engine variant answers calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ReasoningPriority {
    #[default]
    SymbolicPriority,
    HolographicPriority,
}

/// Process-wide knobs fixed at session construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub hdc_strategy: HdcStrategy,
    pub reasoning_priority: ReasoningPriority,
    pub closed_world_assumption: bool,
    pub canonicalization_enabled: bool,
    pub use_semantic_index: bool,
    /// Level-based rule pruning; off pending validation.
    pub use_level_optimization: bool,
    /// Advisory timing counters.
    pub timers_enabled: bool,
    /// Whether the holographic engine may fall back to the full symbolic
    /// engine when every candidate pass comes up empty.
    pub hdc_fallback_to_symbolic: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hdc_strategy: HdcStrategy::Exact,
            reasoning_priority: ReasoningPriority::SymbolicPriority,
            closed_world_assumption: true,
            canonicalization_enabled: true,
            use_semantic_index: true,
            use_level_optimization: false,
            timers_enabled: false,
            hdc_fallback_to_symbolic: true,
        }
    }
}

/// Per-call limits and switches for `prove`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProveOptions {
    pub max_depth: usize,
    pub max_steps: usize,
    pub timeout: Duration,
    pub include_search_trace: bool,
    /// Skip the goal-negation gate: stored `Not` facts no longer fail the
    /// matching positive goal outright.
    pub ignore_negation: bool,
    pub use_level_optimization: bool,
    /// Prune rules with unknown levels too, not only provably-higher ones.
    pub strict_level_pruning: bool,
}

impl Default for ProveOptions {
    fn default() -> Self {
        Self {
            max_depth: 12,
            max_steps: 10_000,
            timeout: Duration::from_millis(5_000),
            include_search_trace: true,
            ignore_negation: false,
            use_level_optimization: false,
            strict_level_pruning: false,
        }
    }
}

/// Per-call limits for `query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub max_results: usize,
    pub max_depth: usize,
    pub max_steps: usize,
    pub timeout: Duration,
    /// Transitive-expansion depth for single-hole patterns.
    pub expansion_depth: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            max_results: 50,
            max_depth: 10,
            max_steps: 20_000,
            timeout: Duration::from_millis(5_000),
            expansion_depth: 6,
        }
    }
}

/// Per-call limits for `abduce`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbduceOptions {
    pub max_explanations: usize,
    pub min_confidence: f64,
    /// Backward search depth over `causes` facts.
    pub max_causal_depth: usize,
    pub timeout: Duration,
}

impl Default for AbduceOptions {
    fn default() -> Self {
        Self {
            max_explanations: 5,
            min_confidence: 0.3,
            max_causal_depth: 6,
            timeout: Duration::from_millis(5_000),
        }
    }
}
