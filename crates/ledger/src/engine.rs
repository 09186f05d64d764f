//! The debounce engine
//!
//! Decides, for each incoming visit, whether the page counter
//! increments: a visitor counts at most once per page per debounce
//! window. A counted visit appends a ledger record and upserts the
//! counter in one transaction across both trees.

use crate::counters::CounterStore;
use crate::error::StoreError;
use crate::keys;
use crate::ledger::VisitLedger;
use crate::record::{PageCounter, SiteStats, VisitRecord};
use crate::store::Store;
use parking_lot::Mutex;
use sled::transaction::{abort, TransactionError};
use sled::Transactional;
use std::hash::{Hash, Hasher};
use tally_core::{now_unix_ms, Anonymizer, VisitorId};
use tracing::debug;
use ulid::Ulid;

/// Default debounce window: repeat visits inside it do not count
pub const DEFAULT_DEBOUNCE_WINDOW_MS: u64 = 5 * 60 * 1000;

/// Number of mutex stripes serializing the debounce decision
const LOCK_STRIPES: usize = 128;

/// Engine tuning
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Repeat visits from one visitor inside this window are not counted
    pub debounce_window_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_window_ms: DEFAULT_DEBOUNCE_WINDOW_MS,
        }
    }
}

/// Result of recording one visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitOutcome {
    /// The page's count after the decision
    pub count: u64,
    /// Whether this visit incremented the counter
    pub counted: bool,
}

/// Debounced visit counting over the ledger and counter trees
///
/// The engine is the only writer to either tree. It is cheap to share
/// behind an `Arc` and safe to call from many threads.
pub struct CounterEngine {
    db: sled::Db,
    ledger: VisitLedger,
    counters: CounterStore,
    anonymizer: Anonymizer,
    config: EngineConfig,
    /// A visit holds the stripe for its (site, page, visitor) key
    /// across the whole check-then-act sequence; see
    /// [`record_identified_visit`](Self::record_identified_visit).
    stripes: Vec<Mutex<()>>,
}

impl CounterEngine {
    /// Build an engine over an open store
    pub fn new(
        store: &Store,
        anonymizer: Anonymizer,
        config: EngineConfig,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            db: store.db().clone(),
            ledger: store.visit_ledger()?,
            counters: store.counter_store()?,
            anonymizer,
            config,
            stripes: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        })
    }

    /// Record a visit happening now
    pub fn record_visit(
        &self,
        site: &str,
        page_path: &str,
        raw_address: &str,
    ) -> Result<VisitOutcome, StoreError> {
        self.record_visit_at(site, page_path, raw_address, now_unix_ms())
    }

    /// Record a visit with an explicit clock
    ///
    /// Split out so the debounce window can be exercised without
    /// waiting out real time.
    pub fn record_visit_at(
        &self,
        site: &str,
        page_path: &str,
        raw_address: &str,
        now_ms: u64,
    ) -> Result<VisitOutcome, StoreError> {
        let visitor = self.anonymizer.anonymize(raw_address);
        self.record_identified_visit(site, page_path, visitor, now_ms)
    }

    /// Core decision: one counted visit per (site, page, visitor) per window
    ///
    /// The existence check and the write must not interleave with
    /// another visit for the same key — two racing visits inside the
    /// window would both pass the check and double-count. The stripe
    /// lock serializes the whole sequence; the ledger append and
    /// counter upsert then land atomically in one transaction.
    pub fn record_identified_visit(
        &self,
        site: &str,
        page_path: &str,
        visitor: VisitorId,
        now_ms: u64,
    ) -> Result<VisitOutcome, StoreError> {
        let _guard = self.stripes[self.stripe_for(site, page_path, &visitor)].lock();

        let cutoff = now_ms.saturating_sub(self.config.debounce_window_ms);
        if self.ledger.seen_since(site, page_path, &visitor, cutoff)? {
            let count = self.counters.get(site, page_path)?;
            return Ok(VisitOutcome {
                count,
                counted: false,
            });
        }

        let record = VisitRecord {
            site: site.to_string(),
            page_path: page_path.to_string(),
            visitor,
            visited_at_ms: now_ms,
            id: Ulid::new(),
        };
        let count = self.append_and_increment(&record, now_ms)?;

        debug!(site, page_path, count, "visit counted");
        Ok(VisitOutcome {
            count,
            counted: true,
        })
    }

    /// Current count for a page (0 for unknown pages)
    pub fn get_count(&self, site: &str, page_path: &str) -> Result<u64, StoreError> {
        self.counters.get(site, page_path)
    }

    /// Aggregate statistics for one site
    pub fn get_stats(&self, site: &str) -> Result<SiteStats, StoreError> {
        self.counters.site_stats(site)
    }

    /// Shared handle to the engine's visit ledger
    pub fn visit_ledger(&self) -> VisitLedger {
        self.ledger.clone()
    }

    /// Ledger append + counter upsert as a single transaction: a
    /// counted visit produces both writes or neither.
    fn append_and_increment(&self, record: &VisitRecord, now_ms: u64) -> Result<u64, StoreError> {
        let visit_key = VisitLedger::key_for(record);
        let visit_value = VisitLedger::encode(record)?;
        let counter_key = keys::counter_key(&record.site, &record.page_path);

        let result = (self.ledger.tree(), self.counters.tree()).transaction(
            |(visits, counters)| {
                visits.insert(visit_key.as_slice(), visit_value.as_slice())?;

                let next = match counters.get(counter_key.as_slice())? {
                    Some(raw) => match CounterStore::decode(&raw) {
                        Ok(counter) => counter.incremented(now_ms),
                        Err(e) => return abort(e),
                    },
                    None => PageCounter::first(now_ms),
                };
                let encoded = match CounterStore::encode(&next) {
                    Ok(encoded) => encoded,
                    Err(e) => return abort(e),
                };
                counters.insert(counter_key.as_slice(), encoded)?;

                Ok(next.count)
            },
        );

        let count = result.map_err(|e| match e {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => StoreError::Storage(e),
        })?;

        // Flush so a counted visit survives a crash
        self.db.flush()?;
        Ok(count)
    }

    fn stripe_for(&self, site: &str, page_path: &str, visitor: &VisitorId) -> usize {
        let mut hasher = ahash::AHasher::default();
        site.hash(&mut hasher);
        page_path.hash(&mut hasher);
        visitor.as_bytes().hash(&mut hasher);
        (hasher.finish() as usize) % self.stripes.len()
    }
}
