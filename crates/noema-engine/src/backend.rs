//! Engine dispatch
//!
//! One interface, exactly two implementations: the symbolic engine and
//! the holographic engine that owns it for validation. The session picks
//! one by its configured reasoning priority.

use crate::holographic::HolographicEngine;
use crate::prove::SymbolicEngine;
use crate::query::run_query;
use crate::session::Session;
use noema_core::{ProofResult, ProveOptions, QueryOptions, QueryResult, Statement};

/// Contract shared by the symbolic and holographic engines.
pub trait ReasoningBackend {
    fn prove(&self, session: &Session, goal: &Statement, options: &ProveOptions) -> ProofResult;
    fn query(&self, session: &Session, pattern: &Statement, options: &QueryOptions)
        -> QueryResult;
}

impl ReasoningBackend for SymbolicEngine {
    fn prove(&self, session: &Session, goal: &Statement, options: &ProveOptions) -> ProofResult {
        SymbolicEngine::prove(self, session, goal, options)
    }

    fn query(
        &self,
        session: &Session,
        pattern: &Statement,
        options: &QueryOptions,
    ) -> QueryResult {
        run_query(session, pattern, options)
    }
}

impl ReasoningBackend for HolographicEngine {
    fn prove(&self, session: &Session, goal: &Statement, options: &ProveOptions) -> ProofResult {
        HolographicEngine::prove(self, session, goal, options)
    }

    fn query(
        &self,
        session: &Session,
        pattern: &Statement,
        options: &QueryOptions,
    ) -> QueryResult {
        HolographicEngine::query(self, session, pattern, options)
    }
}
