//! Semantic relation registry
//!
//! Populated from theory declarations (`transitiveRelation R`,
//! `symmetricRelation R`, `reflexiveRelation R`, `inverseRelation R Rinv`,
//! `inheritable P`). A small built-in table applies only while no
//! declaration at all has been loaded; the first declaration switches the
//! index to declared-only mode.

use noema_core::Statement;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

static BUILTIN_TRANSITIVE: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    BTreeSet::from(["isA", "partOf", "locatedIn", "contains", "before", "after", "causes"])
});

static BUILTIN_SYMMETRIC: Lazy<BTreeSet<&'static str>> =
    Lazy::new(|| BTreeSet::from(["siblingOf", "marriedTo", "adjacentTo", "disjoint"]));

static BUILTIN_REFLEXIVE: Lazy<BTreeSet<&'static str>> =
    Lazy::new(|| BTreeSet::from(["sameAs", "equals"]));

static BUILTIN_INVERSE: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        ("parentOf", "childOf"),
        ("childOf", "parentOf"),
        ("contains", "locatedIn"),
        ("locatedIn", "contains"),
    ])
});

static BUILTIN_INHERITABLE: Lazy<BTreeSet<&'static str>> =
    Lazy::new(|| BTreeSet::from(["can", "has", "owns", "eats", "likes"]));

/// Registry of relation properties consulted by every specialised reasoner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemanticIndex {
    transitive: BTreeSet<String>,
    symmetric: BTreeSet<String>,
    reflexive: BTreeSet<String>,
    inverse: BTreeMap<String, String>,
    inheritable: BTreeSet<String>,
    declared: bool,
}

impl SemanticIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the statement is a semantic declaration this index
    /// absorbs. Non-declarations are left to the fact store.
    pub fn absorb(&mut self, stmt: &Statement) -> bool {
        let args = stmt.arg_tokens();
        match (stmt.operator.as_str(), args.as_slice()) {
            ("transitiveRelation", [relation]) => {
                self.declared = true;
                self.transitive.insert(relation.clone());
            }
            ("symmetricRelation", [relation]) => {
                self.declared = true;
                self.symmetric.insert(relation.clone());
            }
            ("reflexiveRelation", [relation]) => {
                self.declared = true;
                self.reflexive.insert(relation.clone());
            }
            ("inverseRelation", [relation, inverse]) => {
                self.declared = true;
                self.inverse.insert(relation.clone(), inverse.clone());
                self.inverse.insert(inverse.clone(), relation.clone());
            }
            ("inheritable", [property]) => {
                self.declared = true;
                self.inheritable.insert(property.clone());
            }
            _ => return false,
        }
        debug!(declaration = %stmt, "semantic index absorb");
        true
    }

    /// Whether any declaration has been loaded; the built-in fallback is
    /// active only while this is false.
    pub fn has_declarations(&self) -> bool {
        self.declared
    }

    pub fn is_transitive(&self, operator: &str) -> bool {
        if self.declared {
            self.transitive.contains(operator)
        } else {
            BUILTIN_TRANSITIVE.contains(operator)
        }
    }

    pub fn is_symmetric(&self, operator: &str) -> bool {
        if self.declared {
            self.symmetric.contains(operator)
        } else {
            BUILTIN_SYMMETRIC.contains(operator)
        }
    }

    pub fn is_reflexive(&self, operator: &str) -> bool {
        if self.declared {
            self.reflexive.contains(operator)
        } else {
            BUILTIN_REFLEXIVE.contains(operator)
        }
    }

    pub fn inverse_of(&self, operator: &str) -> Option<String> {
        if self.declared {
            self.inverse.get(operator).cloned()
        } else {
            BUILTIN_INVERSE.get(operator).map(|s| (*s).to_string())
        }
    }

    pub fn is_inheritable(&self, operator: &str) -> bool {
        if self.declared {
            self.inheritable.contains(operator)
        } else {
            BUILTIN_INHERITABLE.contains(operator)
        }
    }

    /// Declared inheritable properties (or the built-ins while no theory
    /// is loaded), for search-trace rendering.
    pub fn inheritable_properties(&self) -> Vec<String> {
        if self.declared {
            self.inheritable.iter().cloned().collect()
        } else {
            BUILTIN_INHERITABLE.iter().map(|s| (*s).to_string()).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_fallback_applies_without_declarations() {
        let index = SemanticIndex::new();
        assert!(index.is_transitive("isA"));
        assert!(index.is_inheritable("can"));
        assert_eq!(index.inverse_of("parentOf").as_deref(), Some("childOf"));
    }

    #[test]
    fn declarations_override_the_fallback_entirely() {
        let mut index = SemanticIndex::new();
        assert!(index.absorb(&Statement::unary("transitiveRelation", "ancestorOf")));
        assert!(index.is_transitive("ancestorOf"));
        // Built-in entries stop applying once any declaration is loaded.
        assert!(!index.is_transitive("isA"));
        assert!(!index.is_inheritable("can"));
    }

    #[test]
    fn inverse_declarations_are_bidirectional() {
        let mut index = SemanticIndex::new();
        index.absorb(&Statement::binary("inverseRelation", "parentOf", "childOf"));
        assert_eq!(index.inverse_of("childOf").as_deref(), Some("parentOf"));
        assert_eq!(index.inverse_of("parentOf").as_deref(), Some("childOf"));
    }

    #[test]
    fn non_declarations_are_rejected() {
        let mut index = SemanticIndex::new();
        assert!(!index.absorb(&Statement::binary("isA", "Rex", "Dog")));
        assert!(!index.has_declarations());
    }
}
