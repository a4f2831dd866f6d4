//! Vector operations per strategy
//!
//! `bind` is invertible (`unbind` recovers one operand), `bundle` is the
//! similarity-preserving superposition, `similarity` lands in `[0, 1]`.

use crate::error::{HdcError, Result};
use crate::vector::{
    fnv1a64, Vector, DENSE_WORDS, SPARSE_BLOCKS, SPARSE_BLOCK_SIZE,
};
use noema_core::HdcStrategy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Operation set for one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorSpace {
    strategy: HdcStrategy,
}

impl VectorSpace {
    pub fn new(strategy: HdcStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> HdcStrategy {
        self.strategy
    }

    /// Deterministic atom vector for a name. The RNG is seeded from the
    /// name alone, so the same vocabulary reproduces in every session.
    pub fn atom(&self, name: &str) -> Vector {
        match self.strategy {
            HdcStrategy::Exact => Vector::Exact(name.to_string()),
            HdcStrategy::DenseBinary => {
                let mut rng = StdRng::seed_from_u64(fnv1a64(name.as_bytes()));
                Vector::Dense((0..DENSE_WORDS).map(|_| rng.gen::<u64>()).collect())
            }
            HdcStrategy::SparsePolynomial => {
                let mut rng = StdRng::seed_from_u64(fnv1a64(name.as_bytes()));
                Vector::Sparse(
                    (0..SPARSE_BLOCKS)
                        .map(|_| rng.gen_range(0..SPARSE_BLOCK_SIZE))
                        .collect(),
                )
            }
        }
    }

    /// Associative binding of two vectors.
    pub fn bind(&self, a: &Vector, b: &Vector) -> Result<Vector> {
        match (a, b) {
            (Vector::Exact(x), Vector::Exact(y)) => Ok(Vector::Exact(format!("{x}\u{229b}{y}"))),
            (Vector::Dense(x), Vector::Dense(y)) => {
                if x.len() != y.len() {
                    return Err(HdcError::DimensionMismatch {
                        left: x.len(),
                        right: y.len(),
                    });
                }
                Ok(Vector::Dense(x.iter().zip(y).map(|(a, b)| a ^ b).collect()))
            }
            (Vector::Sparse(x), Vector::Sparse(y)) => {
                if x.len() != y.len() {
                    return Err(HdcError::DimensionMismatch {
                        left: x.len(),
                        right: y.len(),
                    });
                }
                Ok(Vector::Sparse(
                    x.iter()
                        .zip(y)
                        .map(|(a, b)| (a + b) % SPARSE_BLOCK_SIZE)
                        .collect(),
                ))
            }
            _ => Err(HdcError::StrategyMismatch {
                left: a.strategy_name(),
                right: b.strategy_name(),
            }),
        }
    }

    /// Inverse of [`VectorSpace::bind`] with respect to the right operand:
    /// `unbind(bind(a, b), b) == a`.
    pub fn unbind(&self, bound: &Vector, key: &Vector) -> Result<Vector> {
        match (bound, key) {
            (Vector::Exact(x), Vector::Exact(y)) => {
                let suffix = format!("\u{229b}{y}");
                let prefix = format!("{y}\u{229b}");
                if let Some(stripped) = x.strip_suffix(&suffix) {
                    Ok(Vector::Exact(stripped.to_string()))
                } else if let Some(stripped) = x.strip_prefix(&prefix) {
                    Ok(Vector::Exact(stripped.to_string()))
                } else {
                    // Key not present; the caller's similarity check rejects it.
                    Ok(Vector::Exact(format!("{x}\u{2298}{y}")))
                }
            }
            (Vector::Dense(_), Vector::Dense(_)) => self.bind(bound, key),
            (Vector::Sparse(x), Vector::Sparse(y)) => {
                if x.len() != y.len() {
                    return Err(HdcError::DimensionMismatch {
                        left: x.len(),
                        right: y.len(),
                    });
                }
                Ok(Vector::Sparse(
                    x.iter()
                        .zip(y)
                        .map(|(a, b)| (a + SPARSE_BLOCK_SIZE - b) % SPARSE_BLOCK_SIZE)
                        .collect(),
                ))
            }
            _ => Err(HdcError::StrategyMismatch {
                left: bound.strategy_name(),
                right: key.strategy_name(),
            }),
        }
    }

    /// Superposition of any number of vectors.
    ///
    /// Dense: bitwise majority (ties resolve to set). Sparse: per-block
    /// majority, ties resolving to the smallest slot. Exact: the inputs
    /// joined in order, so equal bundles compare equal.
    pub fn bundle(&self, inputs: &[&Vector]) -> Result<Vector> {
        if inputs.is_empty() {
            return Err(HdcError::EmptyBundle);
        }
        if inputs.len() == 1 {
            return Ok(inputs[0].clone());
        }
        match self.strategy {
            HdcStrategy::Exact => {
                let mut parts = Vec::with_capacity(inputs.len());
                for input in inputs {
                    match input {
                        Vector::Exact(text) => parts.push(text.as_str()),
                        other => {
                            return Err(HdcError::StrategyMismatch {
                                left: "exact",
                                right: other.strategy_name(),
                            })
                        }
                    }
                }
                Ok(Vector::Exact(parts.join("\u{2295}")))
            }
            HdcStrategy::DenseBinary => {
                let words = match inputs[0] {
                    Vector::Dense(w) => w.len(),
                    other => {
                        return Err(HdcError::StrategyMismatch {
                            left: "dense-binary",
                            right: other.strategy_name(),
                        })
                    }
                };
                let mut counts = vec![0u32; words * 64];
                for input in inputs {
                    let Vector::Dense(w) = input else {
                        return Err(HdcError::StrategyMismatch {
                            left: "dense-binary",
                            right: input.strategy_name(),
                        });
                    };
                    if w.len() != words {
                        return Err(HdcError::DimensionMismatch {
                            left: words,
                            right: w.len(),
                        });
                    }
                    for (wi, word) in w.iter().enumerate() {
                        let mut bits = *word;
                        while bits != 0 {
                            let bit = bits.trailing_zeros() as usize;
                            counts[wi * 64 + bit] += 1;
                            bits &= bits - 1;
                        }
                    }
                }
                let total = inputs.len() as u32;
                let mut out = vec![0u64; words];
                for (i, count) in counts.iter().enumerate() {
                    if count * 2 >= total {
                        out[i / 64] |= 1u64 << (i % 64);
                    }
                }
                Ok(Vector::Dense(out))
            }
            HdcStrategy::SparsePolynomial => {
                let mut out = Vec::with_capacity(SPARSE_BLOCKS);
                for block in 0..SPARSE_BLOCKS {
                    let mut counts = [0u16; SPARSE_BLOCK_SIZE as usize];
                    for input in inputs {
                        let Vector::Sparse(blocks) = input else {
                            return Err(HdcError::StrategyMismatch {
                                left: "sparse-polynomial",
                                right: input.strategy_name(),
                            });
                        };
                        counts[blocks[block] as usize] += 1;
                    }
                    let winner = counts
                        .iter()
                        .enumerate()
                        .max_by(|(ia, ca), (ib, cb)| ca.cmp(cb).then(ib.cmp(ia)))
                        .map(|(slot, _)| slot as u32)
                        .unwrap_or(0);
                    out.push(winner);
                }
                Ok(Vector::Sparse(out))
            }
        }
    }

    /// Similarity in `[0, 1]`. Mismatched strategies score zero.
    pub fn similarity(&self, a: &Vector, b: &Vector) -> f64 {
        match (a, b) {
            (Vector::Exact(x), Vector::Exact(y)) => {
                if x == y {
                    1.0
                } else {
                    0.0
                }
            }
            (Vector::Dense(x), Vector::Dense(y)) => {
                if x.len() != y.len() || x.is_empty() {
                    return 0.0;
                }
                let hamming: u32 = x.iter().zip(y).map(|(a, b)| (a ^ b).count_ones()).sum();
                let bits = (x.len() * 64) as f64;
                (1.0 - 2.0 * hamming as f64 / bits).max(0.0)
            }
            (Vector::Sparse(x), Vector::Sparse(y)) => {
                if x.len() != y.len() || x.is_empty() {
                    return 0.0;
                }
                let matching = x.iter().zip(y).filter(|(a, b)| a == b).count();
                matching as f64 / x.len() as f64
            }
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spaces() -> Vec<VectorSpace> {
        vec![
            VectorSpace::new(HdcStrategy::Exact),
            VectorSpace::new(HdcStrategy::DenseBinary),
            VectorSpace::new(HdcStrategy::SparsePolynomial),
        ]
    }

    #[test]
    fn atoms_are_deterministic() {
        for space in spaces() {
            assert_eq!(space.atom("Tweety"), space.atom("Tweety"));
            assert_ne!(space.atom("Tweety"), space.atom("Penguin"));
        }
    }

    #[test]
    fn unbind_inverts_bind() {
        for space in spaces() {
            let a = space.atom("subject");
            let b = space.atom("object");
            let bound = space.bind(&a, &b).unwrap();
            let recovered = space.unbind(&bound, &b).unwrap();
            assert!(space.similarity(&recovered, &a) > 0.99);
        }
    }

    #[test]
    fn bound_pairs_are_dissimilar_from_operands() {
        let space = VectorSpace::new(HdcStrategy::DenseBinary);
        let a = space.atom("isA");
        let b = space.atom("Dog");
        let bound = space.bind(&a, &b).unwrap();
        assert!(space.similarity(&bound, &a) < 0.2);
        assert!(space.similarity(&bound, &b) < 0.2);
    }

    #[test]
    fn bundle_preserves_member_similarity() {
        let space = VectorSpace::new(HdcStrategy::DenseBinary);
        let members: Vec<Vector> = ["a", "b", "c"].iter().map(|n| space.atom(n)).collect();
        let refs: Vec<&Vector> = members.iter().collect();
        let bundled = space.bundle(&refs).unwrap();
        for member in &members {
            assert!(space.similarity(&bundled, member) > 0.2);
        }
        let outsider = space.atom("z");
        assert!(space.similarity(&bundled, &outsider) < 0.2);
    }

    #[test]
    fn empty_bundle_is_an_error() {
        let space = VectorSpace::new(HdcStrategy::DenseBinary);
        assert!(matches!(space.bundle(&[]), Err(HdcError::EmptyBundle)));
    }
}
