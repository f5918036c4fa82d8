//! Multiset containment primitive.
//!
//! The similarity notion used throughout search is *containment*, the
//! asymmetric cousin of Jaccard: how much of `a`'s mass is also in `b`.
//!
//! - `containment_index(a, b) = Σ_k min(a[k], b[k]) / Σ_k a[k]`
//! - `containment_index(a, a) = 1`, `containment_index(∅, b) = 0`
//!
//! Distances reported by the search layer are `1 - containment`.

use std::collections::HashMap;
use std::hash::Hash;

/// A count map over `K`.
pub type Multiset<K> = HashMap<K, u64>;

/// Fraction of `a`'s mass contained in `b`, in `[0, 1]`. Zero if `a` is empty.
pub fn containment_index<K: Eq + Hash>(a: &Multiset<K>, b: &Multiset<K>) -> f64 {
    let total: u64 = a.values().sum();
    if total == 0 {
        return 0.0;
    }
    let shared: u64 = a
        .iter()
        .map(|(k, &count)| count.min(b.get(k).copied().unwrap_or(0)))
        .sum();
    shared as f64 / total as f64
}

/// Elementwise sum of count maps. Commutative and associative.
pub fn merge_multisets<'a, K, I>(sets: I) -> Multiset<K>
where
    K: Eq + Hash + Clone + 'a,
    I: IntoIterator<Item = &'a Multiset<K>>,
{
    let mut merged = Multiset::new();
    for set in sets {
        for (k, &count) in set {
            *merged.entry(k.clone()).or_insert(0) += count;
        }
    }
    merged
}

/// The `topn` highest-count entries of a multiset, ties broken by key so the
/// selection is deterministic.
pub fn top_entries<K: Eq + Hash + Ord + Clone>(set: &Multiset<K>, topn: usize) -> Multiset<K> {
    let mut entries: Vec<(&K, u64)> = set.iter().map(|(k, &c)| (k, c)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries
        .into_iter()
        .take(topn)
        .map(|(k, c)| (k.clone(), c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(pairs: &[(&str, u64)]) -> Multiset<String> {
        pairs.iter().map(|(k, c)| (k.to_string(), *c)).collect()
    }

    #[test]
    fn containment_of_self_is_one() {
        let a = ms(&[("x", 2), ("y", 3)]);
        assert_eq!(containment_index(&a, &a), 1.0);
    }

    #[test]
    fn containment_of_empty_is_zero() {
        let a: Multiset<String> = Multiset::new();
        let b = ms(&[("x", 1)]);
        assert_eq!(containment_index(&a, &b), 0.0);
    }

    #[test]
    fn containment_counts_shared_mass() {
        // a has mass 4, of which min(2,1) + min(2,5) = 3 is in b
        let a = ms(&[("x", 2), ("y", 2)]);
        let b = ms(&[("x", 1), ("y", 5)]);
        assert_eq!(containment_index(&a, &b), 0.75);
    }

    #[test]
    fn containment_is_asymmetric() {
        let a = ms(&[("x", 1)]);
        let b = ms(&[("x", 1), ("y", 1)]);
        assert_eq!(containment_index(&a, &b), 1.0);
        assert_eq!(containment_index(&b, &a), 0.5);
    }

    #[test]
    fn merge_sums_counts() {
        let a = ms(&[("x", 1), ("y", 2)]);
        let b = ms(&[("y", 3), ("z", 4)]);
        let merged = merge_multisets([&a, &b]);
        assert_eq!(merged, ms(&[("x", 1), ("y", 5), ("z", 4)]));
    }

    #[test]
    fn merge_is_commutative() {
        let a = ms(&[("x", 1), ("y", 2)]);
        let b = ms(&[("y", 3), ("z", 4)]);
        assert_eq!(merge_multisets([&a, &b]), merge_multisets([&b, &a]));
    }

    #[test]
    fn top_entries_is_deterministic_under_ties() {
        let a = ms(&[("b", 2), ("a", 2), ("c", 1)]);
        let top = top_entries(&a, 2);
        assert_eq!(top, ms(&[("a", 2), ("b", 2)]));
    }
}
