//! Corpus aggregation and pruning.
//!
//! Runs the window extractor over every sentence of every document and folds
//! the results into `phrase -> Counter<context>` tables. Extraction has no
//! shared mutable state, so sentences are processed on rayon workers with
//! per-worker accumulators merged at the end; no locking anywhere.
//!
//! Pruning is a single-threaded reduction applied in a fixed order:
//!
//! 1. drop (phrase, context) windows with count < `min_phrase_context_count`;
//! 2. recompute phrase and context aggregates over the survivors;
//! 3. drop phrases below `min_phrase_count` from the phrase table only;
//! 4. drop contexts below `min_context_count` from the context table only.
//!
//! Steps 3 and 4 do not touch the window table: a surviving window may
//! reference a phrase or context that fell below its own threshold. These
//! orphans are kept deliberately — a rare context attached to a common
//! phrase still carries signal.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{ExtractionConfig, PruneConfig};
use crate::error::Result;
use crate::multiset::Multiset;
use crate::window::{Context, Phrase, WindowExtractor};

/// Raw or pruned window table: per-phrase context counters.
pub type WindowCounts = HashMap<Phrase, Multiset<Context>>;

/// The output of aggregation + pruning.
#[derive(Debug, Clone, Default)]
pub struct PrunedIndex {
    /// Windows surviving the per-window threshold.
    pub windows: WindowCounts,
    /// Phrase aggregates over surviving windows, above `min_phrase_count`.
    pub phrase_counts: Multiset<Phrase>,
    /// Context aggregates over surviving windows, above `min_context_count`.
    pub context_counts: Multiset<Context>,
}

/// Builds a [`PrunedIndex`] from tokenized documents.
#[derive(Debug, Clone)]
pub struct Aggregator {
    extractor: WindowExtractor,
    prune: PruneConfig,
}

impl Aggregator {
    pub fn new(extraction: ExtractionConfig, prune: PruneConfig) -> Result<Self> {
        Ok(Self {
            extractor: WindowExtractor::new(extraction)?,
            prune,
        })
    }

    pub fn extractor(&self) -> &WindowExtractor {
        &self.extractor
    }

    /// Count windows across a corpus. Each document is a list of sentences,
    /// each sentence an ordered token sequence. Empty documents are skipped
    /// with a warning rather than aborting the batch.
    pub fn count_windows(&self, documents: &[Vec<Vec<String>>]) -> WindowCounts {
        for (doc_idx, doc) in documents.iter().enumerate() {
            if doc.is_empty() {
                warn!(doc_idx, "skipping document with no sentences");
            }
        }
        documents
            .par_iter()
            .flat_map(|doc| doc.par_iter())
            .fold(WindowCounts::new, |mut acc, sentence| {
                for (phrase, context, _) in self.extractor.windows(sentence) {
                    *acc.entry(phrase).or_default().entry(context).or_insert(0) += 1;
                }
                acc
            })
            .reduce(WindowCounts::new, merge_window_counts)
    }

    /// Apply the pruning thresholds to a raw window table.
    pub fn prune(&self, mut windows: WindowCounts) -> PrunedIndex {
        let before: usize = windows.values().map(Multiset::len).sum();
        for contexts in windows.values_mut() {
            contexts.retain(|_, count| *count >= self.prune.min_phrase_context_count);
        }
        windows.retain(|_, contexts| !contexts.is_empty());
        let after: usize = windows.values().map(Multiset::len).sum();
        info!(before, after, "pruned windows below min_phrase_context_count");

        let mut phrase_counts: Multiset<Phrase> = Multiset::new();
        let mut context_counts: Multiset<Context> = Multiset::new();
        for (phrase, contexts) in &windows {
            for (context, &count) in contexts {
                *phrase_counts.entry(phrase.clone()).or_insert(0) += count;
                *context_counts.entry(context.clone()).or_insert(0) += count;
            }
        }

        let phrases_before = phrase_counts.len();
        phrase_counts.retain(|_, count| *count >= self.prune.min_phrase_count);
        debug!(
            before = phrases_before,
            after = phrase_counts.len(),
            "pruned phrases below min_phrase_count"
        );

        let contexts_before = context_counts.len();
        context_counts.retain(|_, count| *count >= self.prune.min_context_count);
        debug!(
            before = contexts_before,
            after = context_counts.len(),
            "pruned contexts below min_context_count"
        );

        PrunedIndex {
            windows,
            phrase_counts,
            context_counts,
        }
    }

    /// Full pipeline: count then prune.
    pub fn aggregate(&self, documents: &[Vec<Vec<String>>]) -> PrunedIndex {
        self.prune(self.count_windows(documents))
    }
}

fn merge_window_counts(mut a: WindowCounts, b: WindowCounts) -> WindowCounts {
    for (phrase, contexts) in b {
        let entry = a.entry(phrase).or_default();
        for (context, count) in contexts {
            *entry.entry(context).or_insert(0) += count;
        }
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;
    use crate::tokenize::{SimpleTokenizer, Tokenizer};

    fn unigram_config() -> ExtractionConfig {
        ExtractionConfig {
            max_phrase_length: 1,
            min_left_length: 1,
            max_left_length: 1,
            min_right_length: 1,
            max_right_length: 1,
            token_filter: None,
        }
    }

    fn no_prune() -> PruneConfig {
        PruneConfig {
            min_phrase_context_count: 1,
            min_phrase_count: 1,
            min_context_count: 1,
        }
    }

    fn corpus(texts: &[&str]) -> Vec<Vec<Vec<String>>> {
        let tok = SimpleTokenizer::new();
        texts.iter().map(|t| tok.tokenize(t)).collect()
    }

    #[test]
    fn counts_repeated_windows() {
        let agg = Aggregator::new(unigram_config(), no_prune()).unwrap();
        let docs = corpus(&["a b c. a b c"]);
        let windows = agg.count_windows(&docs);
        let b = &windows[&Phrase::new("b")];
        assert_eq!(b[&Context::new("a", "c")], 2);
    }

    #[test]
    fn reference_corpus_contexts_of_sat() {
        let agg = Aggregator::new(unigram_config(), no_prune()).unwrap();
        let docs = corpus(&["the cat sat on the mat", "the dog sat on the rug"]);
        let index = agg.aggregate(&docs);
        let sat = &index.windows[&Phrase::new("sat")];
        assert_eq!(sat.len(), 2);
        assert_eq!(sat[&Context::new("cat", "on")], 1);
        assert_eq!(sat[&Context::new("dog", "on")], 1);
    }

    #[test]
    fn window_prune_runs_before_aggregates() {
        let agg = Aggregator::new(
            unigram_config(),
            PruneConfig {
                min_phrase_context_count: 2,
                min_phrase_count: 1,
                min_context_count: 1,
            },
        )
        .unwrap();
        // "b" occurs in context (a, c) twice and (a, d) once
        let docs = corpus(&["a b c. a b c. a b d"]);
        let index = agg.aggregate(&docs);
        let b = &index.windows[&Phrase::new("b")];
        assert_eq!(b.len(), 1);
        assert_eq!(b[&Context::new("a", "c")], 2);
        // phrase aggregate sums only surviving windows
        assert_eq!(index.phrase_counts[&Phrase::new("b")], 2);
    }

    #[test]
    fn orphaned_windows_survive_phrase_prune() {
        let agg = Aggregator::new(
            unigram_config(),
            PruneConfig {
                min_phrase_context_count: 1,
                min_phrase_count: 10,
                min_context_count: 1,
            },
        )
        .unwrap();
        let docs = corpus(&["a b c"]);
        let index = agg.aggregate(&docs);
        // every phrase falls below min_phrase_count ...
        assert!(index.phrase_counts.is_empty());
        // ... but the windows themselves are untouched
        assert!(index.windows.contains_key(&Phrase::new("b")));
    }

    #[test]
    fn raising_thresholds_never_adds_windows() {
        let docs = corpus(&["a b c. a b c. a b d. x y z"]);
        let loose = Aggregator::new(unigram_config(), no_prune()).unwrap();
        let strict = Aggregator::new(
            unigram_config(),
            PruneConfig {
                min_phrase_context_count: 2,
                min_phrase_count: 2,
                min_context_count: 2,
            },
        )
        .unwrap();
        let loose_idx = loose.aggregate(&docs);
        let strict_idx = strict.aggregate(&docs);

        let count =
            |idx: &PrunedIndex| idx.windows.values().map(Multiset::len).sum::<usize>();
        assert!(count(&strict_idx) <= count(&loose_idx));
        assert!(strict_idx.phrase_counts.len() <= loose_idx.phrase_counts.len());
        assert!(strict_idx.context_counts.len() <= loose_idx.context_counts.len());
    }

    #[test]
    fn empty_document_is_skipped() {
        let agg = Aggregator::new(unigram_config(), no_prune()).unwrap();
        let docs = vec![vec![], corpus(&["a b c"]).remove(0)];
        let windows = agg.count_windows(&docs);
        assert!(windows.contains_key(&Phrase::new("b")));
    }
}
