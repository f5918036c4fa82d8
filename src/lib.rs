//! lexivec: distributional lexical profiles with approximate similarity search.
//!
//! Profiles phrases by the contexts they occur in — "you shall know a word
//! by the company it keeps" — and answers similarity queries over those
//! profiles without any trained embedding model:
//!
//! - `window`: lazy enumeration of (phrase, context) windows per sentence
//! - `aggregate`: corpus-wide counting and threshold pruning
//! - `store` / `materialize`: projection into a labeled-triple fact store
//! - `query`: contexts-of-phrase, phrases-of-context, two-hop most-similar
//! - `search`: MinHash signatures + LSH ensemble candidate retrieval with
//!   exact multiset-containment re-scoring
//!
//! # Pipeline
//!
//! ```text
//! sentences -> WindowExtractor -> Aggregator (count + prune)
//!           -> materialize -> FactStore <- QueryEngine
//!                                          |
//!                              context vectors -> MinHashSearch
//! ```
//!
//! # Why containment, not Jaccard
//!
//! A query snippet is usually much smaller than an indexed document. Jaccard
//! punishes the size difference; containment ("how much of the query is in
//! the document") does not. The LSH ensemble retrieves by estimated
//! containment and every reported score is an exact containment distance —
//! the probabilistic layer can only lose candidates, never misrank them.
//!
//! # Example
//!
//! ```
//! use lexivec::aggregate::Aggregator;
//! use lexivec::config::{ExtractionConfig, PruneConfig};
//! use lexivec::materialize::materialize;
//! use lexivec::query::QueryEngine;
//! use lexivec::store::MemStore;
//! use lexivec::tokenize::{SimpleTokenizer, Tokenizer};
//!
//! let config = ExtractionConfig {
//!     max_phrase_length: 1,
//!     min_left_length: 1,
//!     max_left_length: 1,
//!     min_right_length: 1,
//!     max_right_length: 1,
//!     token_filter: None,
//! };
//! let prune = PruneConfig {
//!     min_phrase_context_count: 1,
//!     min_phrase_count: 1,
//!     min_context_count: 1,
//! };
//! let tokenizer = SimpleTokenizer::new();
//! let corpus = vec![
//!     tokenizer.tokenize("the cat sat on the mat"),
//!     tokenizer.tokenize("the dog sat on the rug"),
//! ];
//!
//! let aggregator = Aggregator::new(config, prune).unwrap();
//! let index = aggregator.aggregate(&corpus);
//! let mut store = MemStore::new();
//! materialize(&index, &mut store).unwrap();
//!
//! let engine = QueryEngine::new(&store);
//! let contexts = engine.phrase_contexts("sat", None, None, Some(5)).unwrap();
//! assert_eq!(contexts.len(), 2);
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod materialize;
pub mod multiset;
pub mod query;
pub mod search;
pub mod store;
pub mod tokenize;
pub mod window;

pub use aggregate::{Aggregator, PrunedIndex};
pub use config::{ExtractionConfig, PruneConfig, SearchConfig};
pub use error::{LexivecError, Result};
pub use query::{QueryEngine, SimilarityParams};
pub use search::{MatchResult, MinHashSearch};
pub use store::{Fact, FactStore, MemStore};
pub use window::{Context, Phrase, WindowExtractor};
