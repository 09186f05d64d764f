//! Composite key encoding for the sled trees
//!
//! String parts are length-prefixed so prefix scans never match
//! across part boundaries ("doc" vs "docs"). Timestamps are stored
//! big-endian so lexicographic key order matches time order within a
//! prefix.
//!
//! Counter keys:  len(site) site len(page) page
//! Visit keys:    len(site) site len(page) page visitor(32) ts(8) ulid(16)

use tally_core::VisitorId;
use ulid::Ulid;

const TS_BYTES: usize = 8;
const ULID_BYTES: usize = 16;

fn push_part(buf: &mut Vec<u8>, part: &str) {
    let bytes = part.as_bytes();
    buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(bytes);
}

fn read_part(buf: &[u8]) -> Option<(&str, &[u8])> {
    let len_bytes: [u8; 4] = buf.get(..4)?.try_into().ok()?;
    let len = u32::from_be_bytes(len_bytes) as usize;
    let rest = buf.get(4..)?;
    let part = std::str::from_utf8(rest.get(..len)?).ok()?;
    Some((part, &rest[len..]))
}

/// Key for a page counter: (site, page_path)
pub(crate) fn counter_key(site: &str, page_path: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + site.len() + page_path.len());
    push_part(&mut key, site);
    push_part(&mut key, page_path);
    key
}

/// Recover the page path from a counter key
pub(crate) fn counter_key_page(key: &[u8]) -> Option<String> {
    let (_site, rest) = read_part(key)?;
    let (page, rest) = read_part(rest)?;
    rest.is_empty().then(|| page.to_string())
}

/// Prefix matching every counter belonging to a site
pub(crate) fn site_prefix(site: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(4 + site.len());
    push_part(&mut key, site);
    key
}

/// Prefix matching every ledger record for one visitor on one page
pub(crate) fn visit_prefix(site: &str, page_path: &str, visitor: &VisitorId) -> Vec<u8> {
    let mut key = counter_key(site, page_path);
    key.extend_from_slice(visitor.as_bytes());
    key
}

/// Full ledger key: visit prefix, then timestamp, then a ULID so two
/// records in the same millisecond stay distinct
pub(crate) fn visit_key(
    site: &str,
    page_path: &str,
    visitor: &VisitorId,
    visited_at_ms: u64,
    id: Ulid,
) -> Vec<u8> {
    let mut key = visit_prefix(site, page_path, visitor);
    key.extend_from_slice(&visited_at_ms.to_be_bytes());
    key.extend_from_slice(&id.to_bytes());
    key
}

/// Read the timestamp back out of a ledger key
pub(crate) fn visit_key_timestamp(key: &[u8]) -> Option<u64> {
    let tail = TS_BYTES + ULID_BYTES;
    let ts_start = key.len().checked_sub(tail)?;
    let bytes: [u8; TS_BYTES] = key[ts_start..ts_start + TS_BYTES].try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_key_page_roundtrip() {
        let key = counter_key("docs", "/getting-started/install");
        assert_eq!(
            counter_key_page(&key).as_deref(),
            Some("/getting-started/install")
        );
    }

    #[test]
    fn test_site_prefix_respects_boundaries() {
        // "doc" must not be a prefix of keys belonging to "docs"
        let prefix = site_prefix("doc");
        let other = counter_key("docs", "/intro");
        assert!(!other.starts_with(&prefix));

        let own = counter_key("doc", "/intro");
        assert!(own.starts_with(&prefix));
    }

    #[test]
    fn test_visit_key_timestamp_roundtrip() {
        let visitor = tally_core::VisitorId::from_bytes([3; 32]);
        let key = visit_key("docs", "/intro", &visitor, 1_700_000_123_456, Ulid::new());
        assert_eq!(visit_key_timestamp(&key), Some(1_700_000_123_456));
    }

    #[test]
    fn test_visit_keys_sort_by_time_within_prefix() {
        let visitor = tally_core::VisitorId::from_bytes([3; 32]);
        let earlier = visit_key("docs", "/intro", &visitor, 1_000, Ulid::new());
        let later = visit_key("docs", "/intro", &visitor, 2_000, Ulid::new());
        assert!(earlier < later);
    }

    #[test]
    fn test_short_key_yields_no_timestamp() {
        assert_eq!(visit_key_timestamp(b"short"), None);
    }
}
