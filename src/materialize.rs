//! Index materialization.
//!
//! Projects a [`PrunedIndex`] into a [`FactStore`] as Phrase, Context and
//! Window facts. Identifiers derive from canonical text, so re-running the
//! same index into an empty store produces the identical fact set; there is
//! no cross-fact transaction, and a failed batch is recovered by re-running
//! from empty. Store errors are never swallowed.

use tracing::info;

use crate::aggregate::PrunedIndex;
use crate::error::Result;
use crate::store::{Fact, FactStore, NodeId, NodeKind, Object, Predicate};
use crate::window::{Context, Phrase};

/// Joined textual form of a context, used as its `Value` literal.
pub fn context_value(context: &Context) -> String {
    format!("{} {}", context.left, context.right)
}

/// Joined textual form of a window, used as its `Value` literal.
pub fn window_value(phrase: &Phrase, context: &Context) -> String {
    format!("{} {} {}", context.left, phrase.text(), context.right)
}

/// Write every phrase, context and window of the index into the store.
pub fn materialize<S: FactStore>(index: &PrunedIndex, store: &mut S) -> Result<()> {
    for (phrase, &count) in &index.phrase_counts {
        let id = NodeId::phrase(phrase);
        store.add_fact(Fact::new(id.clone(), Predicate::Type, Object::Kind(NodeKind::Phrase)))?;
        store.add_fact(Fact::new(
            id.clone(),
            Predicate::Value,
            Object::Text(phrase.text().to_string()),
        ))?;
        store.add_fact(Fact::new(id, Predicate::HasCount, Object::Count(count)))?;
    }

    for (context, &count) in &index.context_counts {
        let id = NodeId::context(context);
        store.add_fact(Fact::new(id.clone(), Predicate::Type, Object::Kind(NodeKind::Context)))?;
        store.add_fact(Fact::new(
            id.clone(),
            Predicate::HasLeftValue,
            Object::Text(context.left.clone()),
        ))?;
        store.add_fact(Fact::new(
            id.clone(),
            Predicate::HasRightValue,
            Object::Text(context.right.clone()),
        ))?;
        store.add_fact(Fact::new(
            id.clone(),
            Predicate::Value,
            Object::Text(context_value(context)),
        ))?;
        store.add_fact(Fact::new(id, Predicate::HasCount, Object::Count(count)))?;
    }

    let mut windows = 0usize;
    for (phrase, contexts) in &index.windows {
        let phrase_id = NodeId::phrase(phrase);
        for (context, &count) in contexts {
            let context_id = NodeId::context(context);
            let window_id = NodeId::window(phrase, context);
            // No value facts here: a window may reference a phrase or
            // context pruned from the count tables, and those nodes get
            // their value literals only from the survivor loops above.
            // Queries join on values, so pruned nodes stay invisible.
            store.add_fact(Fact::new(
                phrase_id.clone(),
                Predicate::IsPhraseOf,
                Object::Node(window_id.clone()),
            ))?;
            store.add_fact(Fact::new(
                context_id.clone(),
                Predicate::IsContextOf,
                Object::Node(window_id.clone()),
            ))?;
            store.add_fact(Fact::new(
                window_id.clone(),
                Predicate::Type,
                Object::Kind(NodeKind::Window),
            ))?;
            store.add_fact(Fact::new(
                window_id.clone(),
                Predicate::Value,
                Object::Text(window_value(phrase, context)),
            ))?;
            store.add_fact(Fact::new(
                window_id.clone(),
                Predicate::HasContext,
                Object::Node(context_id),
            ))?;
            store.add_fact(Fact::new(
                window_id.clone(),
                Predicate::HasPhrase,
                Object::Node(phrase_id.clone()),
            ))?;
            store.add_fact(Fact::new(window_id, Predicate::HasCount, Object::Count(count)))?;
            windows += 1;
        }
    }
    info!(
        phrases = index.phrase_counts.len(),
        contexts = index.context_counts.len(),
        windows, "materialized index"
    );
    Ok(())
}
