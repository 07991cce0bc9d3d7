//! Cache entries and the on-disk document format.
//!
//! The document is one JSON object mapping identifier to entry. Older
//! documents have no `status` field; they are upgraded once, at load time,
//! by [`decode_document`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::models::CanonicalProduct;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// The vendor returned the item.
    Valid,
    /// The vendor confirmed the item is absent.
    Invalid,
}

/// One cached fetch outcome.
///
/// `data` is `Some` exactly when `status` is `Valid`; the constructors are
/// the only way to build one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    data: Option<CanonicalProduct>,
    /// Milliseconds since the Unix epoch.
    timestamp: i64,
    status: EntryStatus,
}

impl CacheEntry {
    pub fn valid(product: CanonicalProduct, timestamp: i64) -> Self {
        Self {
            data: Some(product),
            timestamp,
            status: EntryStatus::Valid,
        }
    }

    pub fn invalid(timestamp: i64) -> Self {
        Self {
            data: None,
            timestamp,
            status: EntryStatus::Invalid,
        }
    }

    pub fn data(&self) -> Option<&CanonicalProduct> {
        self.data.as_ref()
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn status(&self) -> EntryStatus {
        self.status
    }

    /// Age relative to `now`, clamped at zero for clock skew.
    pub fn age_ms(&self, now: i64) -> i64 {
        (now - self.timestamp).max(0)
    }
}

/// Entry as it may appear on disk, in any format generation.
#[derive(Debug, Deserialize)]
struct StoredEntry {
    #[serde(default)]
    data: Value,
    #[serde(default)]
    timestamp: i64,
    #[serde(default)]
    status: Option<EntryStatus>,
}

/// Outcome of decoding a cache document.
#[derive(Debug, Default)]
pub struct DecodedDocument {
    pub entries: HashMap<String, CacheEntry>,
    /// Entries written before `status` existed.
    pub upgraded: usize,
    /// Entries that could not be decoded and were dropped.
    pub dropped: usize,
}

fn upgrade(id: &str, stored: StoredEntry) -> Option<CacheEntry> {
    let status = match (stored.status, stored.data.is_null()) {
        (Some(EntryStatus::Invalid), _) | (_, true) => EntryStatus::Invalid,
        (Some(EntryStatus::Valid), false) | (None, false) => EntryStatus::Valid,
    };

    match status {
        EntryStatus::Invalid => Some(CacheEntry::invalid(stored.timestamp)),
        EntryStatus::Valid => match serde_json::from_value::<CanonicalProduct>(stored.data) {
            Ok(product) => Some(CacheEntry::valid(product, stored.timestamp)),
            Err(e) => {
                warn!("Dropping undecodable cache entry {}: {}", id, e);
                None
            }
        },
    }
}

/// Decode a cache document of any format generation.
///
/// Entries without `status` are treated as valid (or invalid when their
/// data is null). Individually malformed entries are dropped.
pub fn decode_document(text: &str) -> Result<DecodedDocument, serde_json::Error> {
    let raw: HashMap<String, Value> = serde_json::from_str(text)?;
    let mut decoded = DecodedDocument::default();

    for (id, value) in raw {
        let stored: StoredEntry = match serde_json::from_value(value) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Dropping malformed cache entry {}: {}", id, e);
                decoded.dropped += 1;
                continue;
            }
        };
        if stored.status.is_none() {
            decoded.upgraded += 1;
        }
        match upgrade(&id, stored) {
            Some(entry) => {
                decoded.entries.insert(id, entry);
            }
            None => decoded.dropped += 1,
        }
    }

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let entry = CacheEntry::invalid(1_700_000_000_000);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"data": null, "timestamp": 1_700_000_000_000i64, "status": "invalid"})
        );
    }

    #[test]
    fn test_decode_current_format() {
        let text = r#"{
            "B000000001": {"data": {"asin": "B000000001", "title": "Kettle"}, "timestamp": 10, "status": "valid"},
            "B000000002": {"data": null, "timestamp": 20, "status": "invalid"}
        }"#;
        let doc = decode_document(text).unwrap();
        assert_eq!(doc.entries.len(), 2);
        assert_eq!(doc.upgraded, 0);
        assert_eq!(doc.entries["B000000001"].status(), EntryStatus::Valid);
        assert_eq!(
            doc.entries["B000000001"].data().unwrap().title,
            "Kettle"
        );
        assert!(doc.entries["B000000002"].data().is_none());
    }

    #[test]
    fn test_decode_legacy_format() {
        let text = r#"{
            "B000000001": {"data": {"asin": "B000000001", "title": "Kettle"}, "timestamp": 10},
            "B000000002": {"data": null, "timestamp": 20}
        }"#;
        let doc = decode_document(text).unwrap();
        assert_eq!(doc.upgraded, 2);
        assert_eq!(doc.entries["B000000001"].status(), EntryStatus::Valid);
        assert_eq!(doc.entries["B000000002"].status(), EntryStatus::Invalid);
    }

    #[test]
    fn test_decode_drops_malformed_entries() {
        let text = r#"{
            "B000000001": "not an entry",
            "B000000002": {"data": {"title": 42}, "timestamp": 1, "status": "valid"},
            "B000000003": {"data": null, "timestamp": 1, "status": "invalid"}
        }"#;
        let doc = decode_document(text).unwrap();
        assert_eq!(doc.entries.len(), 1);
        assert_eq!(doc.dropped, 2);
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(decode_document("[1, 2, 3]").is_err());
    }
}
