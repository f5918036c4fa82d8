//! Approximate document similarity search.
//!
//! Built on three layers: per-unit MinHash signatures over each phrase's
//! context vector, mergeable into per-document signatures; an LSH ensemble
//! proposing high-containment candidates in sub-linear time; and exact
//! multiset containment for the final ranking. The approximate layer only
//! filters — scores reported to callers always come from the exact
//! containment index.
//!
//! All derived state (signatures, ensemble) is a pure function of the base
//! vectors and documents; there is no incremental update path. Rebuild after
//! any base-vector change.

mod ensemble;
mod minhash;

pub use ensemble::LshEnsemble;
pub use minhash::{MinHasher, Signature};

use std::collections::{BTreeMap, HashMap};

use tracing::info;

use crate::config::{ExtractionConfig, SearchConfig};
use crate::error::Result;
use crate::multiset::{containment_index, merge_multisets, top_entries, Multiset};
use crate::tokenize::{Tokenizer, WORD_PATTERN};
use crate::window::{Context, Phrase};

/// Phrase-level alignment between two texts.
///
/// `full_matches` maps a phrase of the first text to partners in the second
/// whose context vectors fully contain it (distance 0). `close_matches`
/// holds partial overlaps (distance in (0, 1)), ascending by distance, for
/// phrases not already accounted for by a full match. `score` is the
/// aggregate distance between the two texts' merged vectors.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub score: f64,
    pub full_matches: BTreeMap<String, Vec<(String, f64)>>,
    pub close_matches: BTreeMap<String, Vec<(String, f64)>>,
}

/// MinHash-LSH search over documents described by phrase multisets.
///
/// `base_vectors` gives each unit (phrase) its context vector, typically
/// obtained from [`crate::query::QueryEngine::context_vector`]. Documents
/// are multisets of units. Queries are raw text, run through the same
/// tokenize-extract-lookup pipeline the base vectors came from.
pub struct MinHashSearch {
    config: SearchConfig,
    extraction: ExtractionConfig,
    tokenizer: Box<dyn Tokenizer + Send + Sync>,
    hasher: MinHasher,
    base_vectors: HashMap<Phrase, Multiset<Context>>,
    documents: HashMap<String, Multiset<Phrase>>,
    unit_signatures: HashMap<Phrase, Signature>,
    ensemble: LshEnsemble<String>,
}

impl MinHashSearch {
    /// Build all derived state in one batch.
    pub fn index(
        documents: HashMap<String, Multiset<Phrase>>,
        base_vectors: HashMap<Phrase, Multiset<Context>>,
        config: SearchConfig,
        extraction: ExtractionConfig,
        tokenizer: Box<dyn Tokenizer + Send + Sync>,
    ) -> Result<Self> {
        config.validate()?;
        extraction.validate()?;
        let hasher = MinHasher::new(config.num_permutations);

        // Unit signatures from the top entries of each base vector.
        let unit_signatures: HashMap<Phrase, Signature> = base_vectors
            .iter()
            .map(|(phrase, vector)| {
                let top = top_entries(vector, config.topn);
                (phrase.clone(), hasher.signature(top.keys()))
            })
            .collect();

        // Document signatures are merges of their member units' signatures.
        let mut entries = Vec::with_capacity(documents.len());
        for (doc_id, units) in &documents {
            let mut signature = hasher.empty_signature();
            for unit in units.keys() {
                if let Some(sig) = unit_signatures.get(unit) {
                    signature.merge_in(sig);
                }
            }
            entries.push((doc_id.clone(), signature, units.len()));
        }
        let ensemble = LshEnsemble::index(
            entries,
            config.num_permutations,
            config.num_partitions,
            config.containment_threshold,
        );
        info!(
            documents = documents.len(),
            units = base_vectors.len(),
            "built minhash search index"
        );
        Ok(Self {
            config,
            extraction,
            tokenizer,
            hasher,
            base_vectors,
            documents,
            unit_signatures,
            ensemble,
        })
    }

    /// The phrase -> context-vector map of a text: every word-filtered
    /// n-gram up to `max_phrase_length` that has a base vector, with that
    /// vector's top entries. This is the same pipeline the base vectors
    /// themselves came through.
    pub fn document_vector(
        &self,
        text: &str,
        topn: Option<usize>,
    ) -> HashMap<Phrase, Multiset<Context>> {
        let mut vector = HashMap::new();
        for sentence in self.tokenizer.tokenize(text) {
            let tokens: Vec<&String> = sentence
                .iter()
                .filter(|t| WORD_PATTERN.is_match(t))
                .collect();
            for length in 1..=self.extraction.max_phrase_length {
                for gram in tokens.windows(length) {
                    let phrase = Phrase::new(
                        gram.iter()
                            .map(|t| t.as_str())
                            .collect::<Vec<_>>()
                            .join(" "),
                    );
                    if let Some(base) = self.base_vectors.get(&phrase) {
                        let entry = match topn {
                            Some(n) => top_entries(base, n),
                            None => base.clone(),
                        };
                        vector.insert(phrase, entry);
                    }
                }
            }
        }
        vector
    }

    /// The unit multiset of a text: occurrence counts of every known phrase.
    pub fn document_units(&self, text: &str) -> Multiset<Phrase> {
        let mut units = Multiset::new();
        for sentence in self.tokenizer.tokenize(text) {
            let tokens: Vec<&String> = sentence
                .iter()
                .filter(|t| WORD_PATTERN.is_match(t))
                .collect();
            for length in 1..=self.extraction.max_phrase_length {
                for gram in tokens.windows(length) {
                    let phrase = Phrase::new(
                        gram.iter()
                            .map(|t| t.as_str())
                            .collect::<Vec<_>>()
                            .join(" "),
                    );
                    if self.base_vectors.contains_key(&phrase) {
                        *units.entry(phrase).or_insert(0) += 1;
                    }
                }
            }
        }
        units
    }

    /// Approximate retrieval, exact ranking: documents whose merged vector
    /// contains the query's, ascending by distance (best match first).
    pub fn get_scores(&self, query: &str) -> Vec<(String, f64)> {
        let vector = self.document_vector(query, Some(self.config.topn));
        if vector.is_empty() {
            return Vec::new();
        }

        let mut signature = self.hasher.empty_signature();
        for unit in vector.keys() {
            if let Some(sig) = self.unit_signatures.get(unit) {
                signature.merge_in(sig);
            }
        }

        let query_merged = merge_multisets(vector.values());
        let mut scores: Vec<(String, f64)> = self
            .ensemble
            .query(&signature, vector.len())
            .into_iter()
            .map(|doc_id| {
                let doc_merged = self.merged_document_vector(&doc_id);
                let distance = 1.0 - containment_index(&query_merged, &doc_merged);
                (doc_id, distance)
            })
            .collect();
        scores.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scores
    }

    /// Phrase alignment between two texts plus an aggregate score.
    pub fn matches(&self, text1: &str, text2: &str, topn: usize) -> MatchResult {
        let v1 = self.document_vector(text1, Some(topn));
        let v2 = self.document_vector(text2, Some(topn));

        let mut full_matches: BTreeMap<String, Vec<(String, f64)>> = BTreeMap::new();
        for (p1, c1) in &v1 {
            let mut partners: Vec<(String, f64)> = v2
                .iter()
                .filter(|(_, c2)| 1.0 - containment_index(c2, c1) == 0.0)
                .map(|(p2, _)| (p2.text().to_string(), 0.0))
                .collect();
            if !partners.is_empty() {
                partners.sort_by(|a, b| a.0.cmp(&b.0));
                full_matches.insert(p1.text().to_string(), partners);
            }
        }

        let fully_matched_partner = |p: &str| {
            full_matches
                .values()
                .flatten()
                .any(|(partner, _)| partner == p)
        };
        let mut close_matches: BTreeMap<String, Vec<(String, f64)>> = BTreeMap::new();
        for (p1, c1) in &v1 {
            if full_matches.contains_key(p1.text()) {
                continue;
            }
            let mut partners: Vec<(String, f64)> = v2
                .iter()
                .filter_map(|(p2, c2)| {
                    let distance = 1.0 - containment_index(c2, c1);
                    (distance > 0.0 && distance < 1.0 && !fully_matched_partner(p2.text()))
                        .then(|| (p2.text().to_string(), distance))
                })
                .collect();
            if !partners.is_empty() {
                partners.sort_by(|a, b| {
                    a.1.partial_cmp(&b.1)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| a.0.cmp(&b.0))
                });
                close_matches.insert(p1.text().to_string(), partners);
            }
        }

        let merged1 = merge_multisets(v1.values());
        let merged2 = merge_multisets(v2.values());
        let score = 1.0 - containment_index(&merged1, &merged2);
        MatchResult {
            score,
            full_matches,
            close_matches,
        }
    }

    /// Merged context vector of an indexed document: the sum of its units'
    /// top base-vector entries.
    fn merged_document_vector(&self, doc_id: &str) -> Multiset<Context> {
        let Some(units) = self.documents.get(doc_id) else {
            return Multiset::new();
        };
        let tops: Vec<Multiset<Context>> = units
            .keys()
            .filter_map(|unit| self.base_vectors.get(unit))
            .map(|base| top_entries(base, self.config.topn))
            .collect();
        merge_multisets(tops.iter())
    }

    pub fn num_documents(&self) -> usize {
        self.documents.len()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize::SimpleTokenizer;

    /// Tiny hand-built base vectors: each phrase's contexts with counts.
    fn base_vectors() -> HashMap<Phrase, Multiset<Context>> {
        let mut m = HashMap::new();
        m.insert(
            Phrase::new("cat"),
            [(Context::new("the", "sat"), 3), (Context::new("a", "ran"), 1)]
                .into_iter()
                .collect(),
        );
        m.insert(
            Phrase::new("dog"),
            [(Context::new("the", "sat"), 2), (Context::new("a", "barked"), 2)]
                .into_iter()
                .collect(),
        );
        m.insert(
            Phrase::new("mat"),
            [(Context::new("the", "SENTEND"), 4)].into_iter().collect(),
        );
        m
    }

    fn search_over(texts: &[(&str, &str)]) -> MinHashSearch {
        let config = SearchConfig {
            num_permutations: 128,
            num_partitions: 4,
            containment_threshold: 0.5,
            topn: 10,
        };
        let extraction = ExtractionConfig {
            max_phrase_length: 2,
            ..Default::default()
        };
        // bootstrap: units per text computed with a throwaway instance
        let bootstrap = MinHashSearch::index(
            HashMap::new(),
            base_vectors(),
            config.clone(),
            extraction.clone(),
            Box::new(SimpleTokenizer::new()),
        )
        .unwrap();
        let documents: HashMap<String, Multiset<Phrase>> = texts
            .iter()
            .map(|(id, text)| (id.to_string(), bootstrap.document_units(text)))
            .collect();
        MinHashSearch::index(
            documents,
            base_vectors(),
            config,
            extraction,
            Box::new(SimpleTokenizer::new()),
        )
        .unwrap()
    }

    #[test]
    fn identical_document_scores_zero() {
        let search = search_over(&[("a", "the cat sat on the mat"), ("b", "the cat sat on the mat")]);
        let scores = search.get_scores("the cat sat on the mat");
        assert!(!scores.is_empty());
        assert_eq!(scores[0].1, 0.0);
        let hits: Vec<&str> = scores.iter().map(|(id, _)| id.as_str()).collect();
        assert!(hits.contains(&"a"));
        assert!(hits.contains(&"b"));
    }

    #[test]
    fn unknown_text_yields_no_scores() {
        let search = search_over(&[("a", "the cat sat on the mat")]);
        assert!(search.get_scores("völlig unbekannter text").is_empty());
    }

    #[test]
    fn matches_finds_full_self_match() {
        let search = search_over(&[("a", "the cat sat")]);
        let result = search.matches("the cat sat", "the cat sat", 10);
        assert_eq!(result.score, 0.0);
        assert!(result.full_matches.contains_key("cat"));
        let partners = &result.full_matches["cat"];
        assert!(partners.iter().any(|(p, d)| p == "cat" && *d == 0.0));
    }

    #[test]
    fn matches_close_but_not_full() {
        let search = search_over(&[("a", "irrelevant")]);
        // cat and dog share (the, sat) but neither contains the other
        let result = search.matches("the cat sat", "the dog sat", 10);
        assert!(!result.full_matches.contains_key("cat"));
        let close = result
            .close_matches
            .get("cat")
            .expect("cat should have close matches");
        assert!(close.iter().any(|(p, d)| p == "dog" && *d > 0.0 && *d < 1.0));
        assert!(result.score > 0.0 && result.score < 1.0);
    }

    #[test]
    fn document_vector_only_contains_known_phrases() {
        let search = search_over(&[("a", "x")]);
        let v = search.document_vector("the cat sat on the mat", Some(5));
        assert!(v.contains_key(&Phrase::new("cat")));
        assert!(!v.contains_key(&Phrase::new("sat")));
    }
}
