//! Debounced visit counting on embedded storage
//!
//! This crate provides:
//! - Visit ledger: append-only, time-bounded log of anonymized visits
//! - Counter store: durable per-page view counts (sled)
//! - Debounce engine: decides whether a visit increments a counter
//! - Retention sweeper: bounds ledger growth to a time horizon

pub mod counters;
pub mod engine;
pub mod error;
mod keys;
pub mod ledger;
pub mod record;
pub mod retention;
pub mod store;

// Re-exports
pub use counters::{CounterStore, TOP_PAGES_LIMIT};
pub use engine::{CounterEngine, EngineConfig, VisitOutcome};
pub use error::StoreError;
pub use ledger::VisitLedger;
pub use record::{PageCounter, PageViews, SiteStats, VisitRecord};
pub use retention::{RetentionPolicy, Sweeper};
pub use store::Store;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, StoreError>;
