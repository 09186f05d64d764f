//! Retention policy and ledger sweeping
//!
//! The visit ledger only needs to answer "was this visitor here
//! recently?", so records older than the retention horizon carry no
//! information and are purged in bulk. The horizon is deliberately
//! much longer than the debounce window; sweeping never removes a
//! record the debounce check could still consult.

use crate::error::StoreError;
use crate::ledger::VisitLedger;
use tally_core::now_unix_ms;
use tracing::info;

/// Retention policy for the visit ledger
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    /// Ledger records older than this are purged (default: 24h)
    pub horizon_ms: u64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            horizon_ms: 24 * 60 * 60 * 1000,
        }
    }
}

/// Purges expired visit records, bounding ledger growth
pub struct Sweeper {
    ledger: VisitLedger,
    policy: RetentionPolicy,
}

impl Sweeper {
    /// Create a sweeper with the given policy
    pub fn new(ledger: VisitLedger, policy: RetentionPolicy) -> Self {
        Self { ledger, policy }
    }

    /// Sweep relative to the current wall clock
    pub fn sweep(&self) -> Result<u64, StoreError> {
        self.sweep_at(now_unix_ms())
    }

    /// Delete every ledger record with `visited_at < now - horizon`
    ///
    /// Returns the number of records removed. Idempotent: a second
    /// sweep with no new records deletes zero. Safe to run while
    /// visits are being recorded — the cutoff is a static timestamp,
    /// so in-flight appends are never candidates.
    pub fn sweep_at(&self, now_ms: u64) -> Result<u64, StoreError> {
        let cutoff = now_ms.saturating_sub(self.policy.horizon_ms);
        let deleted = self.ledger.sweep_older_than(cutoff)?;
        if deleted > 0 {
            info!(deleted, "purged expired visit records");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CounterEngine, EngineConfig};
    use crate::store::Store;
    use tally_core::Anonymizer;

    const HOUR_MS: u64 = 60 * 60 * 1000;
    const T0: u64 = 1_700_000_000_000;

    fn open_engine(dir: &std::path::Path) -> CounterEngine {
        let store = Store::open(dir).unwrap();
        CounterEngine::new(
            &store,
            Anonymizer::new("retention-test-salt"),
            EngineConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_sweep_removes_only_expired_records() {
        let dir = tempfile::tempdir().unwrap();
        let engine = open_engine(dir.path());
        let sweeper = Sweeper::new(engine.visit_ledger(), RetentionPolicy::default());

        engine
            .record_visit_at("docs", "/old", "1.2.3.4", T0)
            .unwrap();
        engine
            .record_visit_at("docs", "/fresh", "1.2.3.4", T0 + 23 * HOUR_MS)
            .unwrap();

        // One hour past the horizon for the first record only
        let deleted = sweeper.sweep_at(T0 + 25 * HOUR_MS).unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(engine.visit_ledger().len(), 1);
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let engine = open_engine(dir.path());
        let sweeper = Sweeper::new(engine.visit_ledger(), RetentionPolicy::default());

        engine
            .record_visit_at("docs", "/intro", "1.2.3.4", T0)
            .unwrap();

        assert_eq!(sweeper.sweep_at(T0 + 25 * HOUR_MS).unwrap(), 1);
        assert_eq!(sweeper.sweep_at(T0 + 25 * HOUR_MS).unwrap(), 0);
    }

    #[test]
    fn test_sweep_with_nothing_expired_deletes_zero() {
        let dir = tempfile::tempdir().unwrap();
        let engine = open_engine(dir.path());
        let sweeper = Sweeper::new(engine.visit_ledger(), RetentionPolicy::default());

        engine
            .record_visit_at("docs", "/intro", "1.2.3.4", T0)
            .unwrap();

        assert_eq!(sweeper.sweep_at(T0 + HOUR_MS).unwrap(), 0);
        assert_eq!(engine.visit_ledger().len(), 1);
    }

    #[test]
    fn test_sweep_leaves_counters_intact() {
        let dir = tempfile::tempdir().unwrap();
        let engine = open_engine(dir.path());
        let sweeper = Sweeper::new(engine.visit_ledger(), RetentionPolicy::default());

        engine
            .record_visit_at("docs", "/intro", "1.2.3.4", T0)
            .unwrap();
        engine
            .record_visit_at("docs", "/intro", "5.6.7.8", T0)
            .unwrap();

        sweeper.sweep_at(T0 + 25 * HOUR_MS).unwrap();

        // Counts survive the purge; only dedup state is dropped
        assert_eq!(engine.get_count("docs", "/intro").unwrap(), 2);
        assert!(engine.visit_ledger().is_empty());

        // And a swept visitor counts again on return
        let back = engine
            .record_visit_at("docs", "/intro", "1.2.3.4", T0 + 26 * HOUR_MS)
            .unwrap();
        assert!(back.counted);
        assert_eq!(back.count, 3);
    }
}
