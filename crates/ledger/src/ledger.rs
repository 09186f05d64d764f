//! Append-only visit ledger
//!
//! Stores one record per counted visit, keyed so that records for one
//! (site, page, visitor) sort by timestamp. Appends happen only
//! inside the engine's transaction; the debounce check only ever
//! inspects the newest record of a prefix, and the retention sweeper
//! deletes in bulk by age.

use crate::error::StoreError;
use crate::keys;
use crate::record::VisitRecord;
use tally_core::VisitorId;
use tracing::trace;

/// Append-only log of anonymized visit events
#[derive(Clone)]
pub struct VisitLedger {
    tree: sled::Tree,
}

impl VisitLedger {
    pub(crate) fn new(tree: sled::Tree) -> Self {
        Self { tree }
    }

    pub(crate) fn tree(&self) -> &sled::Tree {
        &self.tree
    }

    /// Storage key for a record
    pub(crate) fn key_for(record: &VisitRecord) -> Vec<u8> {
        keys::visit_key(
            &record.site,
            &record.page_path,
            &record.visitor,
            record.visited_at_ms,
            record.id,
        )
    }

    /// Encode a record for storage
    pub(crate) fn encode(record: &VisitRecord) -> Result<Vec<u8>, StoreError> {
        bincode::serialize(record)
            .map_err(|e| StoreError::corrupt(format!("visit record encode: {e}")))
    }

    /// Has this visitor hit this page after the cutoff?
    ///
    /// Keys within the (site, page, visitor) prefix sort by timestamp,
    /// so only the newest record needs to be inspected.
    pub fn seen_since(
        &self,
        site: &str,
        page_path: &str,
        visitor: &VisitorId,
        cutoff_ms: u64,
    ) -> Result<bool, StoreError> {
        let prefix = keys::visit_prefix(site, page_path, visitor);
        match self.tree.scan_prefix(&prefix).keys().next_back() {
            Some(newest) => {
                let key = newest?;
                let ts = keys::visit_key_timestamp(&key)
                    .ok_or_else(|| StoreError::corrupt("visit key too short"))?;
                Ok(ts > cutoff_ms)
            }
            None => Ok(false),
        }
    }

    /// Delete every record older than the cutoff
    ///
    /// Returns how many records were removed. Idempotent: a second
    /// pass over an unchanged ledger deletes zero.
    pub fn sweep_older_than(&self, cutoff_ms: u64) -> Result<u64, StoreError> {
        let mut batch = sled::Batch::default();
        let mut deleted = 0u64;

        for item in self.tree.iter().keys() {
            let key = item?;
            let ts = keys::visit_key_timestamp(&key)
                .ok_or_else(|| StoreError::corrupt("visit key too short"))?;
            if ts < cutoff_ms {
                batch.remove(key);
                deleted += 1;
            }
        }

        if deleted > 0 {
            self.tree.apply_batch(batch)?;
        }
        trace!(deleted, cutoff_ms, "ledger sweep");
        Ok(deleted)
    }

    /// Number of records currently in the ledger
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// True when the ledger holds no records
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Test-only direct append, bypassing the engine's transaction
    #[cfg(test)]
    pub(crate) fn append(&self, record: &VisitRecord) -> Result<(), StoreError> {
        self.tree
            .insert(Self::key_for(record), Self::encode(record)?)?;
        Ok(())
    }
}
