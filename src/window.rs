//! Window extraction.
//!
//! A *window* is one observed pairing of a phrase (1..=`max_phrase_length`
//! tokens) with its context, the (left, right) token spans around it. For a
//! sentence of n tokens the extractor enumerates every combination of phrase
//! position, phrase length, left length and right length that fits inside the
//! sentence boundaries, lazily and in a fixed order: ascending position, then
//! ascending (phrase length, left length, right length).
//!
//! Sentences are bracketed with start/end markers before extraction so that
//! one-sided contexts at the sentence edge are still observed; the degenerate
//! context consisting of the two markers alone is never yielded. Tokens that
//! do not look word-like (see [`crate::tokenize::WORD_PATTERN`]) are removed
//! up front, shifting offsets.

use std::collections::HashSet;

use crate::config::{ExtractionConfig, SENT_END, SENT_START};
use crate::error::Result;
use crate::tokenize::WORD_PATTERN;

/// A phrase: 1..=`max_phrase_length` tokens, identified by its joined text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Phrase(pub String);

impl Phrase {
    pub fn new(text: impl Into<String>) -> Self {
        Phrase(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Phrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered (left, right) pair of joined token spans around a phrase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Context {
    pub left: String,
    pub right: String,
}

impl Context {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Context {
            left: left.into(),
            right: right.into(),
        }
    }
}

impl std::fmt::Display for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} … {}", self.left, self.right)
    }
}

/// Token span `[start, end)` of a window within the marked sentence.
pub type Span = (usize, usize);

/// Per-sentence window extractor.
///
/// Construction validates the configuration; extraction itself cannot fail.
/// The extractor is immutable and shareable across threads.
#[derive(Debug, Clone)]
pub struct WindowExtractor {
    config: ExtractionConfig,
    /// Lowercased stoplist, applied to phrase tokens only.
    filter: Option<HashSet<String>>,
    /// (phrase_len, left_len, right_len) in enumeration order.
    combos: Vec<(usize, usize, usize)>,
}

impl WindowExtractor {
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        config.validate()?;
        let mut combos = Vec::new();
        for phrase_len in 1..=config.max_phrase_length {
            for left_len in config.min_left_length..=config.max_left_length {
                for right_len in config.min_right_length..=config.max_right_length {
                    if left_len == 0 && right_len == 0 {
                        continue;
                    }
                    combos.push((phrase_len, left_len, right_len));
                }
            }
        }
        let filter = config.normalized_filter();
        Ok(Self {
            config,
            filter,
            combos,
        })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Lazily enumerate the windows of one sentence. The returned iterator
    /// borrows only the extractor, so calling this again restarts from the
    /// beginning.
    pub fn windows(&self, sentence: &[String]) -> WindowIter<'_> {
        let mut tokens = Vec::with_capacity(sentence.len() + 2);
        tokens.push(SENT_START.to_string());
        tokens.extend(
            sentence
                .iter()
                .filter(|t| WORD_PATTERN.is_match(t))
                .cloned(),
        );
        tokens.push(SENT_END.to_string());
        WindowIter {
            extractor: self,
            tokens,
            idx: 0,
            combo: 0,
        }
    }
}

/// Lazy iterator over the windows of a single sentence.
pub struct WindowIter<'a> {
    extractor: &'a WindowExtractor,
    /// Marked, word-filtered sentence.
    tokens: Vec<String>,
    idx: usize,
    combo: usize,
}

impl WindowIter<'_> {
    fn phrase_is_filtered(&self, idx: usize, phrase_len: usize) -> bool {
        match &self.extractor.filter {
            None => false,
            Some(filter) => self.tokens[idx..idx + phrase_len]
                .iter()
                .any(|t| filter.contains(&t.to_lowercase())),
        }
    }
}

impl Iterator for WindowIter<'_> {
    type Item = (Phrase, Context, Span);

    fn next(&mut self) -> Option<Self::Item> {
        let combos = &self.extractor.combos;
        let len = self.tokens.len();
        let start_bound = usize::from(self.tokens.first().map(String::as_str) == Some(SENT_START));
        let end_bound = usize::from(self.tokens.last().map(String::as_str) == Some(SENT_END));

        loop {
            if self.combo >= combos.len() {
                self.combo = 0;
                self.idx += 1;
            }
            if self.idx >= len {
                return None;
            }
            let (phrase_len, left_len, right_len) = combos[self.combo];
            self.combo += 1;

            let idx = self.idx;
            if idx < start_bound.max(left_len) {
                continue;
            }
            // len - phrase_len - max(end_bound, right_len), guarding underflow
            let tail = phrase_len + end_bound.max(right_len);
            if len < tail || idx > len - tail {
                continue;
            }

            let left = self.tokens[idx - left_len..idx].join(" ");
            let right = self.tokens[idx + phrase_len..idx + phrase_len + right_len].join(" ");
            if left == SENT_START && right == SENT_END {
                continue;
            }
            if self.phrase_is_filtered(idx, phrase_len) {
                continue;
            }
            let phrase = Phrase::new(self.tokens[idx..idx + phrase_len].join(" "));
            let span = (idx - left_len, idx + phrase_len + right_len);
            return Some((phrase, Context::new(left, right), span));
        }
    }
}
