//! In-memory fact store.
//!
//! Keeps the raw fact log (append-only) plus adjacency maps updated on every
//! `add_fact`, so pattern queries are hash lookups instead of log scans.
//! Queries read only fully-written maps; nothing here assumes
//! read-your-writes ordering within a batch.

use std::collections::HashMap;

use crate::error::Result;
use crate::window::{Context, Phrase};

use super::{rank_rows, Fact, FactStore, NodeId, NodeKind, Object, Predicate};

/// In-memory reference implementation of [`FactStore`].
#[derive(Debug, Default)]
pub struct MemStore {
    facts: Vec<Fact>,
    kinds: HashMap<NodeId, NodeKind>,
    counts: HashMap<NodeId, u64>,
    values: HashMap<NodeId, String>,
    left_values: HashMap<NodeId, String>,
    right_values: HashMap<NodeId, String>,
    /// phrase node -> windows it participates in
    phrase_windows: HashMap<NodeId, Vec<NodeId>>,
    /// context node -> windows it participates in
    context_windows: HashMap<NodeId, Vec<NodeId>>,
    /// window node -> its phrase / context
    window_phrase: HashMap<NodeId, NodeId>,
    window_context: HashMap<NodeId, NodeId>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of facts appended so far.
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// The raw fact log, in append order.
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    fn context_of(&self, id: &NodeId) -> Option<Context> {
        let left = self.left_values.get(id)?;
        let right = self.right_values.get(id)?;
        Some(Context::new(left.clone(), right.clone()))
    }

    fn phrase_of(&self, id: &NodeId) -> Option<Phrase> {
        self.values.get(id).map(|v| Phrase::new(v.clone()))
    }

    fn is_window(&self, id: &NodeId) -> bool {
        self.kinds.get(id) == Some(&NodeKind::Window)
    }
}

impl FactStore for MemStore {
    fn add_fact(&mut self, fact: Fact) -> Result<()> {
        match (&fact.predicate, &fact.object) {
            (Predicate::Type, Object::Kind(kind)) => {
                self.kinds.insert(fact.subject.clone(), *kind);
            }
            (Predicate::HasCount, Object::Count(n)) => {
                self.counts.insert(fact.subject.clone(), *n);
            }
            (Predicate::Value, Object::Text(v)) => {
                self.values.insert(fact.subject.clone(), v.clone());
            }
            (Predicate::HasLeftValue, Object::Text(v)) => {
                self.left_values.insert(fact.subject.clone(), v.clone());
            }
            (Predicate::HasRightValue, Object::Text(v)) => {
                self.right_values.insert(fact.subject.clone(), v.clone());
            }
            (Predicate::IsPhraseOf, Object::Node(window)) => {
                self.phrase_windows
                    .entry(fact.subject.clone())
                    .or_default()
                    .push(window.clone());
            }
            (Predicate::IsContextOf, Object::Node(window)) => {
                self.context_windows
                    .entry(fact.subject.clone())
                    .or_default()
                    .push(window.clone());
            }
            (Predicate::HasPhrase, Object::Node(phrase)) => {
                self.window_phrase
                    .insert(fact.subject.clone(), phrase.clone());
            }
            (Predicate::HasContext, Object::Node(context)) => {
                self.window_context
                    .insert(fact.subject.clone(), context.clone());
            }
            // Facts outside the adjacency vocabulary are kept in the log only.
            _ => {}
        }
        self.facts.push(fact);
        Ok(())
    }

    fn contexts_of_phrase(
        &self,
        phrase: &Phrase,
        left: Option<&str>,
        right: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<(Context, u64)>> {
        let phrase_id = NodeId::phrase(phrase);
        let mut grouped: HashMap<Context, u64> = HashMap::new();
        for window in self.phrase_windows.get(&phrase_id).into_iter().flatten() {
            if !self.is_window(window) {
                continue;
            }
            let Some(context_id) = self.window_context.get(window) else {
                continue;
            };
            let Some(context) = self.context_of(context_id) else {
                continue;
            };
            if left.is_some_and(|l| l != context.left) {
                continue;
            }
            if right.is_some_and(|r| r != context.right) {
                continue;
            }
            let count = self.counts.get(window).copied().unwrap_or(0);
            *grouped.entry(context).or_insert(0) += count;
        }
        Ok(rank_rows(grouped.into_iter().collect(), limit))
    }

    fn phrases_of_context(
        &self,
        context: &Context,
        limit: Option<usize>,
    ) -> Result<Vec<(Phrase, u64)>> {
        let context_id = NodeId::context(context);
        let mut grouped: HashMap<Phrase, u64> = HashMap::new();
        for window in self.context_windows.get(&context_id).into_iter().flatten() {
            if !self.is_window(window) {
                continue;
            }
            let Some(phrase) = self
                .window_phrase
                .get(window)
                .and_then(|id| self.phrase_of(id))
            else {
                continue;
            };
            let count = self.counts.get(window).copied().unwrap_or(0);
            *grouped.entry(phrase).or_insert(0) += count;
        }
        Ok(rank_rows(grouped.into_iter().collect(), limit))
    }

    fn cooccurring_phrases(
        &self,
        contexts: &[Context],
        limit: Option<usize>,
    ) -> Result<Vec<(Phrase, u64)>> {
        let mut joined: HashMap<Phrase, u64> = HashMap::new();
        for context in contexts {
            let context_id = NodeId::context(context);
            for window in self.context_windows.get(&context_id).into_iter().flatten() {
                if !self.is_window(window) {
                    continue;
                }
                let Some(phrase) = self
                    .window_phrase
                    .get(window)
                    .and_then(|id| self.phrase_of(id))
                else {
                    continue;
                };
                // one joining window contributes one, not its count
                *joined.entry(phrase).or_insert(0) += 1;
            }
        }
        Ok(rank_rows(joined.into_iter().collect(), limit))
    }

    fn extract_by_kind(&self, kind: NodeKind, limit: Option<usize>) -> Result<Vec<(String, u64)>> {
        // distinct windows can share a value literal, so group and sum
        let mut grouped: HashMap<String, u64> = HashMap::new();
        for (id, k) in &self.kinds {
            if *k != kind {
                continue;
            }
            let Some(value) = self.values.get(id) else {
                continue;
            };
            *grouped.entry(value.clone()).or_insert(0) +=
                self.counts.get(id).copied().unwrap_or(0);
        }
        Ok(rank_rows(grouped.into_iter().collect(), limit))
    }
}
