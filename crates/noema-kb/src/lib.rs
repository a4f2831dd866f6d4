//! Knowledge-base layer
//!
//! Indexed fact storage with synonym equivalence classes and canonical
//! names, first-class indexable negations, rules with condition trees,
//! the semantic relation registry and the constructivist level map.

pub mod component;
pub mod error;
pub mod fact;
pub mod levels;
pub mod rule;
pub mod semantic;

pub use component::*;
pub use error::*;
pub use fact::*;
pub use levels::*;
pub use rule::*;
pub use semantic::*;
