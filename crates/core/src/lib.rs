//! Shared primitives for the Tally page-view counter
//!
//! This crate provides:
//! - Visitor identity anonymization (salted keyed BLAKE3)
//! - The unix-millisecond timestamp convention used across crates

pub mod identity;
pub mod time;

// Re-exports
pub use identity::{Anonymizer, VisitorId};
pub use time::now_unix_ms;
