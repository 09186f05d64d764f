//! Salted visitor-identity hashing
//!
//! Client network addresses never touch disk. Each address is mixed
//! with a deployment-secret salt and digested through keyed BLAKE3;
//! only the resulting 32-byte identifier is stored. Without the salt
//! an identifier cannot be correlated back to an address, and two
//! deployments with different salts produce unrelated identifiers for
//! the same client.

use serde::{Deserialize, Serialize};

/// Key-derivation context binding the salt to this use of BLAKE3
const IDENTITY_CONTEXT: &str = "tally 2025-06-01 visitor identity v1";

/// An anonymized visitor identifier (32 bytes)
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct VisitorId([u8; 32]);

impl VisitorId {
    /// Create a VisitorId from raw bytes
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the identifier as a byte slice
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to a 64-character lowercase hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for VisitorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VisitorId({})", self.to_hex())
    }
}

impl std::fmt::Display for VisitorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// One-way mapper from raw client addresses to visitor identifiers
pub struct Anonymizer {
    key: [u8; 32],
}

impl Anonymizer {
    /// Build an anonymizer from the deployment salt
    ///
    /// The salt is stretched into a 32-byte key with `derive_key`, so
    /// even a short salt yields a full-strength keyed hash.
    pub fn new(salt: &str) -> Self {
        Self {
            key: blake3::derive_key(IDENTITY_CONTEXT, salt.as_bytes()),
        }
    }

    /// Hash a raw client address into its opaque identifier
    ///
    /// Deterministic for a given salt. Empty or malformed addresses
    /// still hash; non-emptiness is validated upstream.
    pub fn anonymize(&self, raw_address: &str) -> VisitorId {
        VisitorId(*blake3::keyed_hash(&self.key, raw_address.as_bytes()).as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymize_deterministic() {
        let anonymizer = Anonymizer::new("salt-a");
        let id1 = anonymizer.anonymize("192.0.2.17");
        let id2 = anonymizer.anonymize("192.0.2.17");
        assert_eq!(id1, id2);
    }

    #[test]
    fn test_different_addresses_different_ids() {
        let anonymizer = Anonymizer::new("salt-a");
        let id1 = anonymizer.anonymize("192.0.2.17");
        let id2 = anonymizer.anonymize("192.0.2.18");
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_different_salts_unrelated_ids() {
        let id1 = Anonymizer::new("salt-a").anonymize("192.0.2.17");
        let id2 = Anonymizer::new("salt-b").anonymize("192.0.2.17");
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_hex_shape() {
        let id = Anonymizer::new("salt-a").anonymize("2001:db8::1");
        let hex = id.to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_empty_address_still_hashes() {
        let anonymizer = Anonymizer::new("salt-a");
        assert_eq!(anonymizer.anonymize(""), anonymizer.anonymize(""));
        assert_ne!(anonymizer.anonymize(""), anonymizer.anonymize("192.0.2.17"));
    }

    #[test]
    fn test_display_matches_hex() {
        let id = VisitorId::from_bytes([7; 32]);
        assert_eq!(format!("{id}"), id.to_hex());
    }
}
