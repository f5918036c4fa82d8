//! Error types for lexivec.

use thiserror::Error;

/// Errors that can occur during indexing, materialization, or search.
///
/// Queries for absent phrases/contexts are *not* errors: they return empty
/// results. Store-boundary failures always propagate, since a partially
/// materialized index cannot be distinguished from a complete one by readers.
#[derive(Debug, Error)]
pub enum LexivecError {
    /// Invalid configuration (e.g. max_left_length < min_left_length).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failure at the fact-store boundary.
    #[error("store error: {0}")]
    Store(String),
}

/// Result type for lexivec operations.
pub type Result<T> = std::result::Result<T, LexivecError>;
