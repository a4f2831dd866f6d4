//! Result types returned across the engine boundary
//!
//! No exception crosses `prove` / `query` / `abduce` under normal
//! operation: limits, timeouts and malformed input all surface as a
//! failed result carrying a `reason`.

use crate::ast::Bindings;
use crate::step::Step;
use serde::{Deserialize, Serialize};

/// Outcome of a `prove` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofResult {
    pub valid: bool,
    pub confidence: f64,
    pub goal: String,
    /// Strategy that settled the goal, e.g. `direct_fact`, `transitive_chain`,
    /// `exception_applied`, `closed_world_assumption`.
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub steps: Vec<Step>,
    /// Justification steps of the successful branch, absent on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<Vec<Step>>,
    pub reasoning_steps: usize,
    /// An exception settled the goal as false; no further strategy may run.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub definitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_trace: Option<String>,
}

impl ProofResult {
    pub fn success(goal: impl Into<String>, method: impl Into<String>, confidence: f64) -> Self {
        Self {
            valid: true,
            confidence,
            goal: goal.into(),
            method: method.into(),
            reason: None,
            steps: Vec::new(),
            proof: None,
            reasoning_steps: 0,
            definitive: false,
            search_trace: None,
        }
    }

    pub fn failure(goal: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            confidence: 0.0,
            goal: goal.into(),
            method: "none".into(),
            reason: Some(reason.into()),
            steps: Vec::new(),
            proof: None,
            reasoning_steps: 0,
            definitive: false,
            search_trace: None,
        }
    }

    pub fn with_steps(mut self, steps: Vec<Step>) -> Self {
        if self.valid {
            self.proof = Some(steps.clone());
        }
        self.steps = steps;
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn definitive(mut self) -> Self {
        self.definitive = true;
        self
    }
}

/// One ranked answer produced by the query engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    pub bindings: Bindings,
    pub score: f64,
    pub method: String,
    pub steps: Vec<Step>,
}

/// Outcome of a `query` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub success: bool,
    pub count: usize,
    pub results: Vec<QueryMatch>,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self {
            success: false,
            count: 0,
            results: Vec::new(),
            truncated: false,
            reason: None,
        }
    }

    pub fn from_matches(results: Vec<QueryMatch>, truncated: bool) -> Self {
        Self {
            success: !results.is_empty(),
            count: results.len(),
            results,
            truncated,
            reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::empty()
        }
    }
}

/// One candidate explanation produced by abduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// Grounded hypothesis in DSL form, e.g. `Fire` or `human Socrates`.
    pub hypothesis: String,
    pub method: String,
    pub score: f64,
    pub steps: Vec<Step>,
}

/// Outcome of an `abduce` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbductionResult {
    pub success: bool,
    pub observation: String,
    pub explanations: Vec<Explanation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
