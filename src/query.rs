//! Query engine over a materialized index.
//!
//! Read-only. All three operations are defined on whatever [`FactStore`]
//! backs the index; querying a phrase or context the index has never seen
//! returns an empty result rather than an error.
//!
//! `most_similar` is the only query with two-hop fan-out: contexts of the
//! query phrase, then phrases of those contexts. Callers bound its cost with
//! `top_contexts` / `top_phrases` / `topn`.

use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::multiset::Multiset;
use crate::store::{FactStore, NodeKind};
use crate::window::{Context, Phrase};

/// Parameters for [`QueryEngine::most_similar`].
#[derive(Debug, Clone)]
pub struct SimilarityParams {
    /// Maximum number of similar phrases returned.
    pub topn: usize,
    /// Number of the query phrase's contexts used for the first hop.
    pub top_contexts: usize,
    /// Number of phrases taken per context in the second hop.
    pub top_phrases: usize,
    /// Restrict the second hop to this single context.
    pub context: Option<Context>,
}

impl Default for SimilarityParams {
    fn default() -> Self {
        Self {
            topn: 15,
            top_contexts: 25,
            top_phrases: 25,
            context: None,
        }
    }
}

/// Read-only query surface over a materialized index.
#[derive(Debug)]
pub struct QueryEngine<'a, S: FactStore> {
    store: &'a S,
}

impl<'a, S: FactStore> QueryEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Contexts of a phrase ranked by summed window count, optionally
    /// filtered by exact left/right text.
    pub fn phrase_contexts(
        &self,
        phrase: &str,
        left: Option<&str>,
        right: Option<&str>,
        topn: Option<usize>,
    ) -> Result<Vec<(Context, u64)>> {
        self.store
            .contexts_of_phrase(&Phrase::new(phrase), left, right, topn)
    }

    /// Phrases of a context ranked by summed window count.
    pub fn context_phrases(
        &self,
        context: &Context,
        topn: Option<usize>,
    ) -> Result<Vec<(Phrase, u64)>> {
        self.store.phrases_of_context(context, topn)
    }

    /// A phrase's context vector as a count map, for the search layer.
    pub fn context_vector(&self, phrase: &str, topn: Option<usize>) -> Result<Multiset<Context>> {
        Ok(self
            .phrase_contexts(phrase, None, None, topn)?
            .into_iter()
            .collect())
    }

    /// Most similar phrases by shared top contexts.
    ///
    /// Candidates come from the top phrases of each of the query's top
    /// contexts (or of the fixed `params.context`); each candidate scores
    /// the number of windows joining it to the top-context set. Returns
    /// `phrase -> (raw score, best raw score)` so callers can normalize.
    pub fn most_similar(
        &self,
        phrase: &str,
        params: &SimilarityParams,
    ) -> Result<HashMap<String, (u64, u64)>> {
        let top_contexts: Vec<Context> = self
            .phrase_contexts(phrase, None, None, Some(params.top_contexts))?
            .into_iter()
            .map(|(c, _)| c)
            .collect();
        if top_contexts.is_empty() {
            return Ok(HashMap::new());
        }

        let mut candidates: HashSet<Phrase> = HashSet::new();
        match &params.context {
            Some(context) => {
                for (p, _) in self.context_phrases(context, Some(params.top_phrases))? {
                    candidates.insert(p);
                }
            }
            None => {
                for context in &top_contexts {
                    for (p, _) in self.context_phrases(context, Some(params.top_phrases))? {
                        candidates.insert(p);
                    }
                }
            }
        }
        if candidates.is_empty() {
            return Ok(HashMap::new());
        }

        let scored: Vec<(Phrase, u64)> = self
            .store
            .cooccurring_phrases(&top_contexts, None)?
            .into_iter()
            .filter(|(p, _)| candidates.contains(p))
            .take(params.topn)
            .collect();

        let top_score = scored.first().map(|&(_, n)| n).unwrap_or(0);
        Ok(scored
            .into_iter()
            .map(|(p, n)| (p.text().to_string(), (n, top_score)))
            .collect())
    }

    /// All indexed phrases as (text, count), ranked by count.
    pub fn phrases(&self, topn: Option<usize>) -> Result<Vec<(String, u64)>> {
        self.store.extract_by_kind(NodeKind::Phrase, topn)
    }

    /// All indexed windows as (text, count), ranked by count.
    pub fn windows(&self, topn: Option<usize>) -> Result<Vec<(String, u64)>> {
        self.store.extract_by_kind(NodeKind::Window, topn)
    }
}
