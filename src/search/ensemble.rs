//! LSH ensemble for high-containment retrieval.
//!
//! Banded MinHash LSH targets a Jaccard threshold, but containment queries
//! care about asymmetric overlap, and the Jaccard value corresponding to a
//! containment threshold depends on both the query's and the indexed set's
//! size. Following the ensemble idea of Zhu et al. (2016), documents are
//! partitioned by set size and each partition keeps banded tables at several
//! band widths; at query time the partition's upper size bound and the
//! query's size give the implied Jaccard threshold, which selects the most
//! selective table that still recalls at that threshold. Bucket probing only
//! proposes candidates; every candidate is then screened by the signature
//! containment estimate against the query's set size, which is the contract
//! callers rely on. Exact scoring stays with the caller.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::minhash::Signature;

/// One indexed entry: key, signature, and underlying set size.
#[derive(Debug, Clone)]
struct Entry<K> {
    key: K,
    signature: Signature,
    set_size: usize,
}

/// One banded table: `bands * rows == num_permutations`.
#[derive(Debug)]
struct BandTable {
    bands: usize,
    rows: usize,
    /// band index -> band hash -> entry offsets
    buckets: Vec<HashMap<u64, Vec<usize>>>,
}

impl BandTable {
    fn new(bands: usize, rows: usize) -> Self {
        Self {
            bands,
            rows,
            buckets: (0..bands).map(|_| HashMap::new()).collect(),
        }
    }

    /// Approximate Jaccard threshold of this configuration.
    fn threshold(&self) -> f64 {
        (1.0 / self.bands as f64).powf(1.0 / self.rows as f64)
    }

    fn insert(&mut self, offset: usize, signature: &Signature) {
        for band in 0..self.bands {
            let h = signature.band_hash(band, self.rows);
            self.buckets[band].entry(h).or_default().push(offset);
        }
    }

    fn probe(&self, query: &Signature, found: &mut HashSet<usize>) {
        for band in 0..self.bands {
            let h = query.band_hash(band, self.rows);
            if let Some(offsets) = self.buckets[band].get(&h) {
                found.extend(offsets.iter().copied());
            }
        }
    }
}

/// A size-bounded partition with banded tables at several widths.
#[derive(Debug)]
struct Partition<K> {
    /// Largest set size indexed in this partition.
    upper_size: usize,
    /// Sorted by ascending selectivity (rows).
    tables: Vec<BandTable>,
    entries: Vec<Entry<K>>,
}

impl<K: Clone> Partition<K> {
    fn new(upper_size: usize, num_permutations: usize) -> Self {
        // One table per power-of-two row count dividing the permutation
        // count, from per-slot probing (rows=1) up to a single full band.
        let mut tables = Vec::new();
        let mut rows = 1;
        while rows <= num_permutations {
            if num_permutations % rows == 0 {
                tables.push(BandTable::new(num_permutations / rows, rows));
            }
            rows *= 2;
        }
        Partition {
            upper_size,
            tables,
            entries: Vec::new(),
        }
    }

    fn insert(&mut self, entry: Entry<K>) {
        let offset = self.entries.len();
        for table in &mut self.tables {
            table.insert(offset, &entry.signature);
        }
        self.entries.push(entry);
    }

    /// Probe the most selective table whose banding threshold still lies
    /// below the partition's implied Jaccard threshold.
    fn candidates(&self, query: &Signature, jaccard_threshold: f64) -> HashSet<usize> {
        let table = self
            .tables
            .iter()
            .rev()
            .find(|t| t.threshold() <= jaccard_threshold)
            .or(self.tables.first());
        let mut found = HashSet::new();
        if let Some(table) = table {
            table.probe(query, &mut found);
        }
        found
    }
}

/// The Jaccard value of two sets of sizes `q` and `d` whose containment
/// (of the `q`-side) is `c`: `J = c·q / (q + d − c·q)`.
fn jaccard_for_containment(c: f64, q: usize, d: usize) -> f64 {
    let q = q as f64;
    let d = d as f64;
    let denom = q + d - c * q;
    if denom <= 0.0 {
        return 1.0;
    }
    (c * q / denom).clamp(0.0, 1.0)
}

/// Approximate index over (key, signature, set size) triples answering
/// "which indexed sets contain at least `threshold` of the query set".
#[derive(Debug)]
pub struct LshEnsemble<K> {
    num_permutations: usize,
    threshold: f64,
    partitions: Vec<Partition<K>>,
}

impl<K: Clone> LshEnsemble<K> {
    /// Build the ensemble from all entries at once. There is no incremental
    /// path: partition boundaries depend on the full size distribution.
    pub fn index(
        entries: Vec<(K, Signature, usize)>,
        num_permutations: usize,
        num_partitions: usize,
        threshold: f64,
    ) -> Self {
        let mut entries: Vec<Entry<K>> = entries
            .into_iter()
            .map(|(key, signature, set_size)| Entry {
                key,
                signature,
                set_size,
            })
            .collect();
        entries.sort_by_key(|e| e.set_size);

        let mut partitions = Vec::new();
        if !entries.is_empty() {
            let per_partition = entries.len().div_ceil(num_partitions.max(1));
            for chunk in entries.chunks(per_partition) {
                let upper_size = chunk.last().map(|e| e.set_size).unwrap_or(0);
                let mut partition = Partition::new(upper_size, num_permutations);
                for entry in chunk {
                    partition.insert(entry.clone());
                }
                partitions.push(partition);
            }
        }
        debug!(
            partitions = partitions.len(),
            threshold, "built lsh ensemble"
        );
        Self {
            num_permutations,
            threshold,
            partitions,
        }
    }

    /// Keys whose estimated containment of the query set is at least the
    /// ensemble threshold. Order is unspecified; callers re-score exactly.
    pub fn query(&self, signature: &Signature, query_size: usize) -> Vec<K> {
        let mut results = Vec::new();
        if query_size == 0 {
            return results;
        }
        for partition in &self.partitions {
            let j = jaccard_for_containment(
                self.threshold,
                query_size,
                partition.upper_size.max(1),
            );
            for offset in partition.candidates(signature, j) {
                let entry = &partition.entries[offset];
                let estimate =
                    signature.containment(query_size, &entry.signature, entry.set_size);
                if estimate >= self.threshold {
                    results.push(entry.key.clone());
                }
            }
        }
        results
    }

    pub fn num_permutations(&self) -> usize {
        self.num_permutations
    }

    pub fn len(&self) -> usize {
        self.partitions.iter().map(|p| p.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.iter().all(|p| p.entries.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::super::minhash::MinHasher;
    use super::*;

    #[test]
    fn containment_to_jaccard_conversion() {
        // full containment of equal-size sets is Jaccard 1
        assert!((jaccard_for_containment(1.0, 10, 10) - 1.0).abs() < 1e-12);
        // half containment of equal-size sets: J = 5 / 15
        assert!((jaccard_for_containment(0.5, 10, 10) - 1.0 / 3.0).abs() < 1e-12);
        // a small query against a large set implies a small Jaccard
        assert!(jaccard_for_containment(0.5, 10, 1000) < 0.01);
    }

    #[test]
    fn band_tables_cover_full_signature() {
        let partition: Partition<&str> = Partition::new(10, 128);
        for table in &partition.tables {
            assert_eq!(table.bands * table.rows, 128);
        }
    }

    #[test]
    fn finds_superset_documents() {
        let mh = MinHasher::new(128);
        let query: Vec<u32> = (0..20).collect();
        let superset: Vec<u32> = (0..100).collect();
        let unrelated: Vec<u32> = (1000..1100).collect();

        let ensemble = LshEnsemble::index(
            vec![
                ("superset", mh.signature(superset.iter()), superset.len()),
                ("unrelated", mh.signature(unrelated.iter()), unrelated.len()),
            ],
            128,
            4,
            0.5,
        );
        let hits = ensemble.query(&mh.signature(query.iter()), query.len());
        assert!(hits.contains(&"superset"));
        assert!(!hits.contains(&"unrelated"));
    }

    #[test]
    fn identical_document_is_retrieved() {
        let mh = MinHasher::new(128);
        let doc: Vec<&str> = vec!["a", "b", "c", "d", "e"];
        let ensemble = LshEnsemble::index(
            vec![("twin", mh.signature(doc.iter()), doc.len())],
            128,
            8,
            1.0,
        );
        let hits = ensemble.query(&mh.signature(doc.iter()), doc.len());
        assert_eq!(hits, vec!["twin"]);
    }

    #[test]
    fn empty_query_returns_nothing() {
        let mh = MinHasher::new(64);
        let ensemble: LshEnsemble<&str> =
            LshEnsemble::index(vec![("doc", mh.signature(["a"]), 1)], 64, 2, 0.5);
        assert!(ensemble.query(&mh.empty_signature(), 0).is_empty());
    }
}
