//! Configuration value types.
//!
//! All thresholds are plain immutable values passed at construction time.
//! Validation happens once, in the constructors; anything downstream can
//! assume a well-formed configuration.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{LexivecError, Result};

/// Sentence-start marker inserted before extraction.
pub const SENT_START: &str = "SENTSTART";
/// Sentence-end marker appended before extraction.
pub const SENT_END: &str = "SENTEND";

/// Window extraction parameters.
///
/// A window is a phrase of `1..=max_phrase_length` tokens together with
/// `min_left_length..=max_left_length` tokens on the left and
/// `min_right_length..=max_right_length` tokens on the right.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub max_phrase_length: usize,
    pub min_left_length: usize,
    pub max_left_length: usize,
    pub min_right_length: usize,
    pub max_right_length: usize,
    /// Phrases containing any of these tokens (case-insensitive) are skipped.
    /// Contexts are never filtered.
    pub token_filter: Option<HashSet<String>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_phrase_length: 5,
            min_left_length: 1,
            max_left_length: 3,
            min_right_length: 1,
            max_right_length: 3,
            token_filter: None,
        }
    }
}

impl ExtractionConfig {
    /// Validate threshold combinations. Called by every component that takes
    /// an `ExtractionConfig`, so misconfiguration fails at build time.
    pub fn validate(&self) -> Result<()> {
        if self.max_phrase_length == 0 {
            return Err(LexivecError::InvalidConfig(
                "max_phrase_length must be at least 1".into(),
            ));
        }
        if self.max_left_length < self.min_left_length {
            return Err(LexivecError::InvalidConfig(format!(
                "max_left_length ({}) < min_left_length ({})",
                self.max_left_length, self.min_left_length
            )));
        }
        if self.max_right_length < self.min_right_length {
            return Err(LexivecError::InvalidConfig(format!(
                "max_right_length ({}) < min_right_length ({})",
                self.max_right_length, self.min_right_length
            )));
        }
        if self.min_left_length == 0
            && self.max_left_length == 0
            && self.min_right_length == 0
            && self.max_right_length == 0
        {
            return Err(LexivecError::InvalidConfig(
                "left and right context cannot both be fixed at length 0".into(),
            ));
        }
        Ok(())
    }

    /// Lowercased copy of the token filter, or `None`.
    pub(crate) fn normalized_filter(&self) -> Option<HashSet<String>> {
        self.token_filter
            .as_ref()
            .map(|f| f.iter().map(|w| w.to_lowercase()).collect())
    }
}

/// Pruning thresholds applied after corpus aggregation.
///
/// The order of application is fixed: window counts first, then phrase and
/// context aggregates recomputed over the survivors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruneConfig {
    /// Minimum count for a (phrase, context) window to survive.
    pub min_phrase_context_count: u64,
    /// Minimum aggregate count for a phrase to appear in the phrase table.
    pub min_phrase_count: u64,
    /// Minimum aggregate count for a context to appear in the context table.
    pub min_context_count: u64,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            min_phrase_context_count: 5,
            min_phrase_count: 5,
            min_context_count: 5,
        }
    }
}

/// MinHash search parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of permutation functions (signature length).
    pub num_permutations: usize,
    /// Number of set-size partitions in the LSH ensemble.
    pub num_partitions: usize,
    /// Minimum estimated containment for candidate retrieval.
    pub containment_threshold: f64,
    /// Number of base-vector entries contributing to each unit signature.
    pub topn: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            num_permutations: 128,
            num_partitions: 32,
            containment_threshold: 0.5,
            topn: 15,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_permutations == 0 {
            return Err(LexivecError::InvalidConfig(
                "num_permutations must be at least 1".into(),
            ));
        }
        if self.num_partitions == 0 {
            return Err(LexivecError::InvalidConfig(
                "num_partitions must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.containment_threshold) {
            return Err(LexivecError::InvalidConfig(format!(
                "containment_threshold {} outside [0, 1]",
                self.containment_threshold
            )));
        }
        Ok(())
    }
}
