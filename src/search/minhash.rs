//! MinHash signatures with containment estimation.
//!
//! A signature is the element-wise minimum of a seeded hash family over a
//! set's members. Matching positions estimate Jaccard similarity:
//! `P[min_i(A) = min_i(B)] = J(A, B)`. Signatures of unions are element-wise
//! minima of the member signatures, which is what lets the search layer
//! build document signatures by merging per-unit signatures.
//!
//! Containment `C(A, B) = |A ∩ B| / |A|` is recovered from the Jaccard
//! estimate and the set sizes: `C = J·(|A| + |B|) / (|A|·(1 + J))`.
//!
//! References: Broder (1997), "On the resemblance and containment of
//! documents".

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed used when callers do not supply one; fixed so signatures built in
/// separate runs are comparable.
const DEFAULT_SEED: u64 = 42;

/// Seeded MinHash hash family.
#[derive(Debug, Clone)]
pub struct MinHasher {
    seeds: Vec<u64>,
}

impl MinHasher {
    /// A family of `num_permutations` hash functions. More permutations give
    /// tighter estimates and longer signatures; 64-256 is typical.
    pub fn new(num_permutations: usize) -> Self {
        Self::with_seed(num_permutations, DEFAULT_SEED)
    }

    pub fn with_seed(num_permutations: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let seeds = (0..num_permutations).map(|_| rng.gen()).collect();
        Self { seeds }
    }

    pub fn num_permutations(&self) -> usize {
        self.seeds.len()
    }

    /// Signature of a set given as an iterator of members.
    pub fn signature<T: Hash, I: IntoIterator<Item = T>>(&self, members: I) -> Signature {
        let mut values = vec![u64::MAX; self.seeds.len()];
        for member in members {
            for (slot, &seed) in values.iter_mut().zip(self.seeds.iter()) {
                let h = hash_with_seed(&member, seed);
                if h < *slot {
                    *slot = h;
                }
            }
        }
        Signature { values }
    }

    /// Signature of the empty set (all slots at `u64::MAX`), the identity
    /// element of [`Signature::merge_in`].
    pub fn empty_signature(&self) -> Signature {
        Signature {
            values: vec![u64::MAX; self.seeds.len()],
        }
    }
}

fn hash_with_seed<T: Hash>(item: &T, seed: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    item.hash(&mut hasher);
    hasher.finish()
}

/// A fixed-size MinHash signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    values: Vec<u64>,
}

impl Signature {
    /// Estimated Jaccard similarity, the fraction of matching slots.
    pub fn jaccard(&self, other: &Signature) -> f64 {
        if self.values.len() != other.values.len() || self.values.is_empty() {
            return 0.0;
        }
        let matches = self
            .values
            .iter()
            .zip(other.values.iter())
            .filter(|(a, b)| a == b)
            .count();
        matches as f64 / self.values.len() as f64
    }

    /// Estimated containment of `self`'s set (of `self_size` members) in
    /// `other`'s set (of `other_size` members), clamped to `[0, 1]`.
    pub fn containment(&self, self_size: usize, other: &Signature, other_size: usize) -> f64 {
        if self_size == 0 {
            return 0.0;
        }
        let j = self.jaccard(other);
        let c = j * (self_size + other_size) as f64 / (self_size as f64 * (1.0 + j));
        c.clamp(0.0, 1.0)
    }

    /// Fold `other` into `self`: the result is the signature of the union of
    /// the underlying sets.
    pub fn merge_in(&mut self, other: &Signature) {
        debug_assert_eq!(self.values.len(), other.values.len());
        for (slot, &v) in self.values.iter_mut().zip(other.values.iter()) {
            if v < *slot {
                *slot = v;
            }
        }
    }

    pub fn merge(&self, other: &Signature) -> Signature {
        let mut merged = self.clone();
        merged.merge_in(other);
        merged
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Hash of one band of the signature, for LSH bucketing.
    pub(crate) fn band_hash(&self, band: usize, rows: usize) -> u64 {
        let start = band * rows;
        let mut hasher = DefaultHasher::new();
        for v in &self.values[start..(start + rows).min(self.values.len())] {
            v.hash(&mut hasher);
        }
        hasher.finish()
    }
}
