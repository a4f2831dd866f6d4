//! Vector representations
//!
//! One variant per strategy. Dense vectors are bit-packed into `u64` words;
//! sparse vectors hold one active index per block (a sparse block code).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense strategy dimensionality in bits.
pub const DENSE_BITS: usize = 8192;
/// Dense strategy word count.
pub const DENSE_WORDS: usize = DENSE_BITS / 64;
/// Sparse strategy block count.
pub const SPARSE_BLOCKS: usize = 64;
/// Sparse strategy slots per block.
pub const SPARSE_BLOCK_SIZE: u32 = 128;

/// A hyperdimensional vector under one of the three strategies.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vector {
    /// Canonical symbolic form; similarity is equality.
    Exact(String),
    /// `DENSE_BITS` bits packed into words.
    Dense(Vec<u64>),
    /// One active slot per block, each `< SPARSE_BLOCK_SIZE`.
    Sparse(Vec<u32>),
}

impl Vector {
    /// Human-readable strategy tag.
    pub fn strategy_name(&self) -> &'static str {
        match self {
            Vector::Exact(_) => "exact",
            Vector::Dense(_) => "dense-binary",
            Vector::Sparse(_) => "sparse-polynomial",
        }
    }

    /// Stable 64-bit digest used for cycle keys and visited sets.
    pub fn digest(&self) -> u64 {
        match self {
            Vector::Exact(text) => fnv1a64(text.as_bytes()),
            Vector::Dense(words) => {
                let mut acc = 0xcbf2_9ce4_8422_2325u64;
                for word in words {
                    acc = acc.wrapping_mul(0x0000_0100_0000_01b3) ^ word;
                }
                acc
            }
            Vector::Sparse(blocks) => {
                let mut acc = 0x9e37_79b9_7f4a_7c15u64;
                for (i, slot) in blocks.iter().enumerate() {
                    acc = acc
                        .rotate_left(7)
                        .wrapping_add((*slot as u64) << 8 | i as u64);
                }
                acc
            }
        }
    }
}

impl fmt::Debug for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vector::Exact(text) => write!(f, "Vector::Exact({text:?})"),
            Vector::Dense(_) => write!(f, "Vector::Dense({DENSE_BITS}b#{:016x})", self.digest()),
            Vector::Sparse(_) => {
                write!(f, "Vector::Sparse({SPARSE_BLOCKS}x{SPARSE_BLOCK_SIZE}#{:016x})", self.digest())
            }
        }
    }
}

/// FNV-1a, kept in-tree so digests are stable across toolchains.
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_distinguishes_texts() {
        let a = Vector::Exact("isA Rex Dog".into());
        let b = Vector::Exact("isA Rex Cat".into());
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn fnv_is_stable() {
        // Reference value for the empty input per FNV-1a offset basis.
        assert_eq!(fnv1a64(b""), 0xcbf2_9ce4_8422_2325);
    }
}
