//! Per-call proof state
//!
//! Created and discarded by every `prove`/`query`/`abduce` call. Holds the
//! step counter, the clock, and the cycle-detection set. Visited keys are
//! scoped per goal or condition and removed on return, so the same
//! sub-goal can legitimately reappear along a different branch (diamond
//! re-entry) while true cycles are cut.

use crate::error::{EngineError, Result};
use noema_core::{Bindings, ProveOptions, Step};
use std::collections::HashSet;
use std::time::Instant;

/// Cycle-detection key. Digests come from the goal's vector hash; chain
/// keys cover `(relation, a, b)` walks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum VisitKey {
    Goal(u64),
    Condition(u64),
    Chain(String, String, String),
}

/// Transient state threaded through one reasoning call.
#[derive(Debug)]
pub(crate) struct ProofState {
    pub max_depth: usize,
    pub max_steps: usize,
    pub started: Instant,
    pub timeout: std::time::Duration,
    pub steps_used: usize,
    pub ignore_negation: bool,
    pub use_level_optimization: bool,
    pub strict_level_pruning: bool,
    visited: HashSet<VisitKey>,
}

impl ProofState {
    pub fn new(options: &ProveOptions) -> Self {
        Self {
            max_depth: options.max_depth,
            max_steps: options.max_steps,
            started: Instant::now(),
            timeout: options.timeout,
            steps_used: 0,
            ignore_negation: options.ignore_negation,
            use_level_optimization: options.use_level_optimization,
            strict_level_pruning: options.strict_level_pruning,
            visited: HashSet::new(),
        }
    }

    pub fn with_limits(max_depth: usize, max_steps: usize, timeout: std::time::Duration) -> Self {
        Self {
            max_depth,
            max_steps,
            started: Instant::now(),
            timeout,
            steps_used: 0,
            ignore_negation: false,
            use_level_optimization: false,
            strict_level_pruning: false,
            visited: HashSet::new(),
        }
    }

    /// Account one reasoning step; checks the step budget and the clock.
    pub fn tick(&mut self) -> Result<()> {
        self.steps_used += 1;
        if self.steps_used > self.max_steps {
            return Err(EngineError::StepLimit {
                limit: self.max_steps,
            });
        }
        if self.started.elapsed() > self.timeout {
            return Err(EngineError::Timeout);
        }
        Ok(())
    }

    /// True when a branch at this depth must stop expanding.
    pub fn depth_exhausted(&self, depth: usize) -> bool {
        depth > self.max_depth
    }

    /// Run `f` with `key` marked visited, removing the mark on every exit
    /// path. Returns `Ok(None)` when the key is already on the path, i.e.
    /// a cycle, failing silently so the caller can try alternatives.
    pub fn with_key<T>(
        &mut self,
        key: VisitKey,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<Option<T>> {
        if !self.visited.insert(key.clone()) {
            return Ok(None);
        }
        let outcome = f(self);
        self.visited.remove(&key);
        outcome.map(Some)
    }
}

/// One way a condition was satisfied: the bindings it produced, the
/// confidence of the branch, and its justification steps.
#[derive(Debug, Clone)]
pub(crate) struct Solution {
    pub bindings: Bindings,
    pub confidence: f64,
    pub steps: Vec<Step>,
}

/// A successfully established goal.
#[derive(Debug, Clone)]
pub(crate) struct Derivation {
    pub confidence: f64,
    pub steps: Vec<Step>,
}

/// Internal outcome of the strategy ladder for one goal.
#[derive(Debug, Clone)]
pub(crate) enum ProveOutcome {
    /// A strategy established the goal.
    Proved {
        method: String,
        confidence: f64,
        steps: Vec<Step>,
    },
    /// A definitive blocker (exception, explicit negation) settled the
    /// goal as false; no further strategy may run.
    Blocked {
        method: String,
        reason: String,
        steps: Vec<Step>,
    },
    /// Nothing applied; the caller may fall through or fail.
    NotProved,
}

impl ProveOutcome {
    pub fn proved(method: &str, confidence: f64, steps: Vec<Step>) -> Self {
        ProveOutcome::Proved {
            method: method.to_string(),
            confidence,
            steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn with_key_detects_cycles_and_restores() {
        let mut state = ProofState::with_limits(8, 100, Duration::from_secs(1));
        let key = VisitKey::Chain("isA".into(), "A".into(), "B".into());

        let outer = state
            .with_key(key.clone(), |state| {
                // Re-entering the same key inside the scope is a cycle.
                let inner = state.with_key(key.clone(), |_| Ok(1)).unwrap();
                assert!(inner.is_none());
                Ok(2)
            })
            .unwrap();
        assert_eq!(outer, Some(2));

        // The key was removed on exit; a fresh entry succeeds.
        let again = state.with_key(key, |_| Ok(3)).unwrap();
        assert_eq!(again, Some(3));
    }

    #[test]
    fn step_budget_is_enforced() {
        let mut state = ProofState::with_limits(8, 2, Duration::from_secs(1));
        assert!(state.tick().is_ok());
        assert!(state.tick().is_ok());
        assert!(matches!(
            state.tick(),
            Err(EngineError::StepLimit { limit: 2 })
        ));
    }
}
