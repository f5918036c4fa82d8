//! Tokenizer collaborator seam.
//!
//! The indexing pipeline consumes sentences as ordered token sequences; where
//! those come from is the caller's business. [`SimpleTokenizer`] is a small
//! default good enough for tests and plain prose: sentence boundaries on
//! `.`, `?`, `!` plus any configured forced-split characters, alphanumeric
//! runs as tokens, everything else as single-character tokens (which the
//! extractor's word pattern later drops).

use once_cell::sync::Lazy;
use regex::Regex;

/// Word-like token pattern. Tokens not matching this are removed from a
/// sentence before window extraction, shifting offsets.
pub static WORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[0-9]*[a-zA-Z]*$").expect("static pattern"));

/// Splits text into sentences of tokens.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Vec<Vec<String>>;
}

/// Whitespace/punctuation tokenizer with configurable sentence splitting.
#[derive(Debug, Clone, Default)]
pub struct SimpleTokenizer {
    /// Characters that force a sentence split in addition to `.`, `?`, `!`.
    pub forced_split_characters: Vec<char>,
}

impl SimpleTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_forced_splits(chars: Vec<char>) -> Self {
        Self {
            forced_split_characters: chars,
        }
    }

    fn is_sentence_end(&self, c: char) -> bool {
        matches!(c, '.' | '?' | '!') || self.forced_split_characters.contains(&c)
    }
}

impl Tokenizer for SimpleTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Vec<String>> {
        let mut sentences = Vec::new();
        let mut sentence: Vec<String> = Vec::new();
        let mut token = String::new();

        for c in text.chars() {
            if c.is_alphanumeric() {
                token.push(c);
                continue;
            }
            if !token.is_empty() {
                sentence.push(std::mem::take(&mut token));
            }
            if self.is_sentence_end(c) {
                if !sentence.is_empty() {
                    sentences.push(std::mem::take(&mut sentence));
                }
            } else if !c.is_whitespace() {
                sentence.push(c.to_string());
            }
        }
        if !token.is_empty() {
            sentence.push(token);
        }
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        sentences
    }
}
