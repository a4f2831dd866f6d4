//! Noema reasoning core
//!
//! The strategy-ladder proof engine, the condition prover with
//! backtracking, the KB matcher, the typed-relation reasoners, the
//! default/exception resolver, the query engine, abduction, the
//! HDC-first variants and explicit forward chaining, all reached
//! through a [`Session`].
//!
//! ```no_run
//! use noema_core::ProveOptions;
//! use noema_engine::{parse_statement, Session};
//!
//! let mut session = Session::with_defaults();
//! session.load("isA Rex Dog\nisA Dog Mammal\nisA Mammal Animal\n").unwrap();
//! let goal = parse_statement("isA Rex Animal").unwrap();
//! let result = session.prove(&goal, &ProveOptions::default());
//! assert!(result.valid);
//! ```

mod abduce;
mod backend;
mod condition;
mod defaults;
mod error;
mod forward;
mod holographic;
mod matcher;
mod prove;
mod query;
mod relations;
mod session;
mod state;
mod stats;
mod trace;
mod unify;

pub use backend::ReasoningBackend;
pub use error::{EngineError, Result};
pub use holographic::HolographicEngine;
pub use prove::SymbolicEngine;
pub use session::{
    parse_statement, LoadReport, RuleSnapshot, Session, SessionError, SessionResult,
    SessionSnapshot,
};
pub use stats::{ReasoningStats, StatsSnapshot};
