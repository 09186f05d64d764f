//! Durable per-page view counts
//!
//! One entry per (site, page); counts only move up and entries are
//! never deleted. The insert-or-increment write path lives in the
//! engine's transaction so a ledger append and its increment always
//! land together — this module only reads and encodes.

use crate::error::StoreError;
use crate::keys;
use crate::record::{PageCounter, PageViews, SiteStats};

/// Maximum number of pages in a site leaderboard
pub const TOP_PAGES_LIMIT: usize = 10;

/// Read access to the per-page counters
#[derive(Clone)]
pub struct CounterStore {
    tree: sled::Tree,
}

impl CounterStore {
    pub(crate) fn new(tree: sled::Tree) -> Self {
        Self { tree }
    }

    pub(crate) fn tree(&self) -> &sled::Tree {
        &self.tree
    }

    pub(crate) fn decode(raw: &[u8]) -> Result<PageCounter, StoreError> {
        bincode::deserialize(raw)
            .map_err(|e| StoreError::corrupt(format!("page counter decode: {e}")))
    }

    pub(crate) fn encode(counter: &PageCounter) -> Result<Vec<u8>, StoreError> {
        bincode::serialize(counter)
            .map_err(|e| StoreError::corrupt(format!("page counter encode: {e}")))
    }

    /// Current count for a page; 0 when the page has never been counted
    pub fn get(&self, site: &str, page_path: &str) -> Result<u64, StoreError> {
        match self.tree.get(keys::counter_key(site, page_path))? {
            Some(raw) => Ok(Self::decode(&raw)?.count),
            None => Ok(0),
        }
    }

    /// Full stored counter, if the page has ever been counted
    pub fn get_counter(
        &self,
        site: &str,
        page_path: &str,
    ) -> Result<Option<PageCounter>, StoreError> {
        match self.tree.get(keys::counter_key(site, page_path))? {
            Some(raw) => Ok(Some(Self::decode(&raw)?)),
            None => Ok(None),
        }
    }

    /// Aggregate statistics for one site
    ///
    /// `top_pages` is ordered descending by count, ties broken by page
    /// path, and capped at [`TOP_PAGES_LIMIT`]; `total_views` sums
    /// every counter for the site, not just the leaderboard.
    pub fn site_stats(&self, site: &str) -> Result<SiteStats, StoreError> {
        let mut pages: Vec<PageViews> = Vec::new();
        let mut total_views = 0u64;

        for item in self.tree.scan_prefix(keys::site_prefix(site)) {
            let (key, raw) = item?;
            let counter = Self::decode(&raw)?;
            let page_path = keys::counter_key_page(&key)
                .ok_or_else(|| StoreError::corrupt("counter key shape"))?;
            total_views += counter.count;
            pages.push(PageViews {
                page_path,
                views: counter.count,
            });
        }

        let total_pages = pages.len() as u64;
        pages.sort_by(|a, b| {
            b.views
                .cmp(&a.views)
                .then_with(|| a.page_path.cmp(&b.page_path))
        });
        pages.truncate(TOP_PAGES_LIMIT);

        Ok(SiteStats {
            total_pages,
            total_views,
            top_pages: pages,
        })
    }

    /// Number of counted pages across all sites
    pub fn page_count(&self) -> usize {
        self.tree.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    fn seed(store: &CounterStore, site: &str, page: &str, count: u64) {
        let counter = PageCounter {
            count,
            created_at_ms: 1_000,
            updated_at_ms: 2_000,
        };
        store
            .tree()
            .insert(
                keys::counter_key(site, page),
                CounterStore::encode(&counter).unwrap(),
            )
            .unwrap();
    }

    fn open_counters(dir: &std::path::Path) -> CounterStore {
        Store::open(dir).unwrap().counter_store().unwrap()
    }

    #[test]
    fn test_get_unknown_page_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let counters = open_counters(dir.path());
        assert_eq!(counters.get("docs", "/never-visited").unwrap(), 0);
        assert!(counters.get_counter("docs", "/never-visited").unwrap().is_none());
    }

    #[test]
    fn test_stats_ordering_and_totals() {
        let dir = tempfile::tempdir().unwrap();
        let counters = open_counters(dir.path());

        for i in 1..=12u64 {
            seed(&counters, "docs", &format!("/page-{i:02}"), i);
        }
        // A second site must not leak into the aggregate
        seed(&counters, "blog", "/hello", 1_000);

        let stats = counters.site_stats("docs").unwrap();
        assert_eq!(stats.total_pages, 12);
        assert_eq!(stats.total_views, (1..=12).sum::<u64>());
        assert_eq!(stats.top_pages.len(), TOP_PAGES_LIMIT);
        assert_eq!(stats.top_pages[0].page_path, "/page-12");
        assert_eq!(stats.top_pages[0].views, 12);
        assert!(stats
            .top_pages
            .windows(2)
            .all(|w| w[0].views >= w[1].views));
    }

    #[test]
    fn test_stats_tie_order_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let counters = open_counters(dir.path());
        seed(&counters, "docs", "/b", 5);
        seed(&counters, "docs", "/a", 5);

        let stats = counters.site_stats("docs").unwrap();
        assert_eq!(stats.top_pages[0].page_path, "/a");
        assert_eq!(stats.top_pages[1].page_path, "/b");
    }

    #[test]
    fn test_stats_empty_site() {
        let dir = tempfile::tempdir().unwrap();
        let counters = open_counters(dir.path());
        let stats = counters.site_stats("ghost").unwrap();
        assert_eq!(stats.total_pages, 0);
        assert_eq!(stats.total_views, 0);
        assert!(stats.top_pages.is_empty());
    }
}
