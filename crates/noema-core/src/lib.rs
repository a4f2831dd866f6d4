//! Core data model shared by every Noema crate
//!
//! Holds the statement AST, bindings, proof-step records, result types,
//! call options and the per-strategy threshold tables. Nothing in here
//! performs reasoning; the engine crate consumes these types.

pub mod ast;
pub mod error;
pub mod options;
pub mod result;
pub mod step;
pub mod thresholds;

pub use ast::*;
pub use error::*;
pub use options::*;
pub use result::*;
pub use step::*;
pub use thresholds::*;
