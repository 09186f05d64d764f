//! Error types for the counting engine

use thiserror::Error;

/// Failures surfaced by the counting engine and its stores
///
/// Nothing here is fatal to the process: a failed operation leaves
/// the database usable for the next caller.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying database failed
    #[error("storage unavailable: {0}")]
    Storage(#[from] sled::Error),

    /// A stored value violated an on-disk invariant
    #[error("storage corruption: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub(crate) fn corrupt(what: impl Into<String>) -> Self {
        Self::Corrupt(what.into())
    }
}
