//! Advisory reasoning statistics
//!
//! Counters are incremented unlocked (relaxed atomics); callers running
//! concurrent proofs under an external mutex get exact numbers, anyone
//! else gets advisory ones.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Session-wide counters.
#[derive(Debug, Default)]
pub struct ReasoningStats {
    pub proofs_attempted: AtomicU64,
    pub proofs_succeeded: AtomicU64,
    pub queries_run: AtomicU64,
    pub abductions_run: AtomicU64,
    pub reasoning_steps: AtomicU64,
    pub hdc_candidates: AtomicU64,
    pub hdc_validated: AtomicU64,
    pub facts_derived: AtomicU64,
    /// Accumulated only when `timers_enabled` is set.
    pub elapsed_micros: AtomicU64,
}

/// Plain-data copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub proofs_attempted: u64,
    pub proofs_succeeded: u64,
    pub queries_run: u64,
    pub abductions_run: u64,
    pub reasoning_steps: u64,
    pub hdc_candidates: u64,
    pub hdc_validated: u64,
    pub facts_derived: u64,
    pub elapsed_micros: u64,
}

impl ReasoningStats {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicU64, amount: u64) {
        counter.fetch_add(amount, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            proofs_attempted: self.proofs_attempted.load(Ordering::Relaxed),
            proofs_succeeded: self.proofs_succeeded.load(Ordering::Relaxed),
            queries_run: self.queries_run.load(Ordering::Relaxed),
            abductions_run: self.abductions_run.load(Ordering::Relaxed),
            reasoning_steps: self.reasoning_steps.load(Ordering::Relaxed),
            hdc_candidates: self.hdc_candidates.load(Ordering::Relaxed),
            hdc_validated: self.hdc_validated.load(Ordering::Relaxed),
            facts_derived: self.facts_derived.load(Ordering::Relaxed),
            elapsed_micros: self.elapsed_micros.load(Ordering::Relaxed),
        }
    }
}
