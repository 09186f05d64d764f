//! Stored and aggregate data types

use serde::{Deserialize, Serialize};
use tally_core::VisitorId;
use ulid::Ulid;

/// One anonymized visit event, as stored in the visit ledger
///
/// Records accumulate per (site, page, visitor) until the retention
/// sweeper removes them; nothing here identifies the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitRecord {
    /// Site the page belongs to
    pub site: String,
    /// Page path within the site
    pub page_path: String,
    /// Anonymized visitor identifier
    pub visitor: VisitorId,
    /// When the visit was counted (Unix milliseconds)
    pub visited_at_ms: u64,
    /// Uniqueness suffix, shared with the ledger key
    pub id: Ulid,
}

/// Durable per-page view count
///
/// Exactly one entry exists per (site, page); the count never
/// decreases and entries are never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCounter {
    /// Total counted visits
    pub count: u64,
    /// When the page was first counted (Unix milliseconds)
    pub created_at_ms: u64,
    /// When the count last changed (Unix milliseconds)
    pub updated_at_ms: u64,
}

impl PageCounter {
    /// Counter state after a page's first counted visit
    pub fn first(now_ms: u64) -> Self {
        Self {
            count: 1,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    /// Counter state after one more counted visit
    pub fn incremented(&self, now_ms: u64) -> Self {
        Self {
            count: self.count.saturating_add(1),
            created_at_ms: self.created_at_ms,
            updated_at_ms: now_ms,
        }
    }
}

/// A page and its view count, for leaderboards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageViews {
    /// Page path within the site
    pub page_path: String,
    /// Counted visits for the page
    pub views: u64,
}

/// Aggregate statistics for one site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteStats {
    /// Number of distinct counted pages
    pub total_pages: u64,
    /// Sum of all page counts for the site
    pub total_views: u64,
    /// Most-viewed pages, descending by count, capped at
    /// [`crate::TOP_PAGES_LIMIT`]
    pub top_pages: Vec<PageViews>,
}
