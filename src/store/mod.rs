//! Fact-store collaborator seam.
//!
//! The index persists as labeled triples in an external store; this module
//! defines the vocabulary, deterministic identifier derivation, and the
//! query surface the engine needs from any backend. The query surface is a
//! fixed catalog of pattern operations (group-by-sum over one- and two-hop
//! joins, ordered, limited) rather than a generic query language: backends
//! implement four operations, nothing more.
//!
//! [`MemStore`] is the bundled in-memory backend, used by tests and as the
//! default when no external store is wired in.

mod memory;

pub use memory::MemStore;

use crate::error::Result;
use crate::window::{Context, Phrase};

/// Separator replacing spaces inside a token span when deriving identifiers.
const SPAN_SEP: &str = "+";
/// Separator between the parts of a context or window identifier.
const PART_SEP: &str = "_";

/// Deterministic node identifier, derived from canonical phrase/context
/// text. Re-materializing the same index always resolves to the same ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn phrase(phrase: &Phrase) -> Self {
        NodeId(format!("lexicon/{}", canonical(phrase.text())))
    }

    pub fn context(context: &Context) -> Self {
        NodeId(format!(
            "context/{}{}{}",
            canonical(&context.left),
            PART_SEP,
            canonical(&context.right)
        ))
    }

    pub fn window(phrase: &Phrase, context: &Context) -> Self {
        NodeId(format!(
            "window/{}{}{}{}{}",
            canonical(&context.left),
            PART_SEP,
            canonical(phrase.text()),
            PART_SEP,
            canonical(&context.right)
        ))
    }
}

/// Tokens are word-like (letters and digits), so `+` never collides.
fn canonical(text: &str) -> String {
    text.replace(' ', SPAN_SEP)
}

/// Node classification carried by `Predicate::Type` facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Phrase,
    Context,
    Window,
}

/// Fact predicates. The `IsPhraseOf`/`IsContextOf` edges are the inverses of
/// `HasPhrase`/`HasContext`; both directions are materialized so either hop
/// of a two-hop query is a forward lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Predicate {
    Type,
    Value,
    HasCount,
    HasLeftValue,
    HasRightValue,
    HasPhrase,
    HasContext,
    IsPhraseOf,
    IsContextOf,
}

/// Fact objects: a node reference, a text literal, or a count literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Object {
    Node(NodeId),
    Kind(NodeKind),
    Text(String),
    Count(u64),
}

/// One labeled triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fact {
    pub subject: NodeId,
    pub predicate: Predicate,
    pub object: Object,
}

impl Fact {
    pub fn new(subject: NodeId, predicate: Predicate, object: Object) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

/// The store operations the engine relies on.
///
/// Query results are ordered by descending count, ties broken by ascending
/// text so results are reproducible. Queries for unknown phrases or contexts
/// return empty rows, never an error; only genuine backend failures surface
/// as `Err`.
pub trait FactStore {
    /// Append one fact. Unbounded batching; no transaction semantics.
    fn add_fact(&mut self, fact: Fact) -> Result<()>;

    /// Contexts of a phrase with summed window counts, optionally filtered
    /// by exact left/right text.
    fn contexts_of_phrase(
        &self,
        phrase: &Phrase,
        left: Option<&str>,
        right: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<(Context, u64)>>;

    /// Phrases of a context with summed window counts.
    fn phrases_of_context(
        &self,
        context: &Context,
        limit: Option<usize>,
    ) -> Result<Vec<(Phrase, u64)>>;

    /// Two-hop join: phrases reachable from any of the given contexts,
    /// ranked by the number of joining windows.
    fn cooccurring_phrases(
        &self,
        contexts: &[Context],
        limit: Option<usize>,
    ) -> Result<Vec<(Phrase, u64)>>;

    /// All nodes of a kind as (canonical text, count), ranked by count.
    fn extract_by_kind(&self, kind: NodeKind, limit: Option<usize>) -> Result<Vec<(String, u64)>>;
}

/// Order rows descending by count, ascending by key, then truncate.
pub(crate) fn rank_rows<K: Ord>(mut rows: Vec<(K, u64)>, limit: Option<usize>) -> Vec<(K, u64)> {
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    if let Some(n) = limit {
        rows.truncate(n);
    }
    rows
}
