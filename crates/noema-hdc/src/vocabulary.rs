//! Vocabulary: name → vector item memory
//!
//! Insertion-ordered so top-K results tie-break deterministically.

use crate::space::VectorSpace;
use crate::vector::Vector;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Item memory mapping atom names to their vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    space: VectorSpace,
    atoms: IndexMap<String, Vector>,
}

/// One scored hit from a vocabulary search.
#[derive(Debug, Clone, PartialEq)]
pub struct VocabHit {
    pub name: String,
    pub similarity: f64,
}

impl Vocabulary {
    pub fn new(space: VectorSpace) -> Self {
        Self {
            space,
            atoms: IndexMap::new(),
        }
    }

    pub fn space(&self) -> &VectorSpace {
        &self.space
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Fetch an atom's vector, creating and remembering it on first use.
    pub fn get_or_create(&mut self, name: &str) -> Vector {
        if let Some(existing) = self.atoms.get(name) {
            return existing.clone();
        }
        let vector = self.space.atom(name);
        trace!(atom = name, "vocabulary insert");
        self.atoms.insert(name.to_string(), vector.clone());
        vector
    }

    pub fn get(&self, name: &str) -> Option<&Vector> {
        self.atoms.get(name)
    }

    /// Names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.atoms.keys().map(String::as_str)
    }

    /// Top-K most similar atoms to a target vector, scores descending,
    /// ties broken by insertion order. Internal/reserved names are the
    /// caller's concern.
    pub fn top_k_similar(&self, target: &Vector, k: usize) -> Vec<VocabHit> {
        let mut scored: Vec<(usize, VocabHit)> = self
            .atoms
            .iter()
            .enumerate()
            .map(|(order, (name, vector))| {
                (
                    order,
                    VocabHit {
                        name: name.clone(),
                        similarity: self.space.similarity(target, vector),
                    },
                )
            })
            .collect();
        scored.sort_by(|(oa, a), (ob, b)| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(oa.cmp(ob))
        });
        scored.into_iter().take(k).map(|(_, hit)| hit).collect()
    }
}

/// Reserved/internal tokens are never surfaced as query-hole candidates:
/// sigil-prefixed names and lower-case-only operator names.
pub fn is_reserved_token(token: &str) -> bool {
    token.starts_with(&['_', '?', '$', '@'][..]) || !token.chars().any(|c| c.is_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use noema_core::HdcStrategy;

    #[test]
    fn get_or_create_is_stable() {
        let mut vocab = Vocabulary::new(VectorSpace::new(HdcStrategy::DenseBinary));
        let first = vocab.get_or_create("Tweety");
        let second = vocab.get_or_create("Tweety");
        assert_eq!(first, second);
        assert_eq!(vocab.len(), 1);
    }

    #[test]
    fn top_k_finds_the_atom_itself() {
        let mut vocab = Vocabulary::new(VectorSpace::new(HdcStrategy::DenseBinary));
        for name in ["Tweety", "Penguin", "Bird", "Fly"] {
            vocab.get_or_create(name);
        }
        let target = vocab.get("Penguin").unwrap().clone();
        let hits = vocab.top_k_similar(&target, 2);
        assert_eq!(hits[0].name, "Penguin");
        assert!(hits[0].similarity > 0.99);
    }

    #[test]
    fn reserved_tokens_are_filtered() {
        assert!(is_reserved_token("_pos0"));
        assert!(is_reserved_token("?x"));
        assert!(is_reserved_token("$ref"));
        assert!(is_reserved_token("@meta"));
        assert!(is_reserved_token("can"));
        assert!(!is_reserved_token("Tweety"));
        assert!(!is_reserved_token("isA"));
    }
}
