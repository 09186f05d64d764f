//! Database lifecycle
//!
//! One sled database holds two trees: the visit ledger and the page
//! counters. The database is opened once at startup and shared
//! through cheap tree handles; sled synchronizes concurrent access
//! internally, so there is no per-call connection management.

use crate::counters::CounterStore;
use crate::error::StoreError;
use crate::ledger::VisitLedger;
use std::path::Path;

const VISITS_TREE: &str = "visits";
const COUNTERS_TREE: &str = "counters";

/// Handle to the on-disk counter database
pub struct Store {
    db: sled::Db,
}

impl Store {
    /// Open or create the database at the given directory
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// The append-only visit ledger
    pub fn visit_ledger(&self) -> Result<VisitLedger, StoreError> {
        Ok(VisitLedger::new(self.db.open_tree(VISITS_TREE)?))
    }

    /// The per-page counter store
    pub fn counter_store(&self) -> Result<CounterStore, StoreError> {
        Ok(CounterStore::new(self.db.open_tree(COUNTERS_TREE)?))
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    pub(crate) fn db(&self) -> &sled::Db {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_both_trees() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        assert!(store.visit_ledger().unwrap().is_empty());
        assert_eq!(store.counter_store().unwrap().page_count(), 0);
    }

    #[test]
    fn test_reopen_same_directory() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = Store::open(dir.path()).unwrap();
            store.flush().unwrap();
        }
        // A dropped store releases its file lock
        Store::open(dir.path()).unwrap();
    }
}
