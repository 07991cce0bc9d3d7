//! Persistent product cache.
//!
//! Dual status (found / confirmed absent), dual TTL, one JSON document on
//! disk. Valid entries live for the long TTL. Invalid entries live for the
//! short TTL only while an investigation exists for the identifier, and for
//! the long TTL otherwise.

mod entry;
mod signal;

pub use entry::{decode_document, CacheEntry, DecodedDocument, EntryStatus};
pub use signal::{FsInvestigationSignal, InvestigationSignal, NoInvestigations};

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn, Span};

use crate::models::CanonicalProduct;
use crate::utils::{sanitize_value, strip_invisible};

/// Default lifetime of valid entries (and of invalid entries with no investigation).
pub const DEFAULT_VALID_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Default lifetime of invalid entries under investigation.
pub const DEFAULT_INVALID_TTL: Duration = Duration::from_secs(60 * 60);

/// Errors from cache persistence.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to replace cache file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

impl CacheError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Entry counts for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    /// Entries whose applicable TTL has elapsed.
    pub expired: usize,
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn ttl_ms(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

/// Product cache backed by a single JSON file.
///
/// The owning process is assumed to be the only writer.
pub struct ProductCache {
    path: PathBuf,
    entries: HashMap<String, CacheEntry>,
    signal: Arc<dyn InvestigationSignal>,
    valid_ttl: Duration,
    invalid_ttl: Duration,
    span: Span,
}

impl ProductCache {
    /// Create an empty cache for `path`. Nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>, signal: Arc<dyn InvestigationSignal>) -> Self {
        Self {
            path: path.into(),
            entries: HashMap::new(),
            signal,
            valid_ttl: DEFAULT_VALID_TTL,
            invalid_ttl: DEFAULT_INVALID_TTL,
            span: tracing::info_span!("cache"),
        }
    }

    /// Create a cache and load whatever is on disk.
    pub fn open(
        path: impl Into<PathBuf>,
        signal: Arc<dyn InvestigationSignal>,
    ) -> Result<Self, CacheError> {
        let mut cache = Self::new(path, signal);
        cache.load()?;
        Ok(cache)
    }

    pub fn with_ttls(mut self, valid_ttl: Duration, invalid_ttl: Duration) -> Self {
        self.valid_ttl = valid_ttl;
        self.invalid_ttl = invalid_ttl;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, id: &str) -> Option<&CacheEntry> {
        self.entries.get(id)
    }

    /// TTL that applies to an entry right now.
    fn applicable_ttl(&self, id: &str, entry: &CacheEntry) -> Duration {
        match entry.status() {
            EntryStatus::Valid => self.valid_ttl,
            EntryStatus::Invalid if self.signal.exists(id) => self.invalid_ttl,
            EntryStatus::Invalid => self.valid_ttl,
        }
    }

    fn is_fresh(&self, id: &str, entry: &CacheEntry, now: i64) -> bool {
        entry.age_ms(now) <= ttl_ms(self.applicable_ttl(id, entry))
    }

    /// Fresh product for `id`, if one is cached.
    pub fn get(&self, id: &str) -> Option<CanonicalProduct> {
        self.get_at(id, now_ms())
    }

    fn get_at(&self, id: &str, now: i64) -> Option<CanonicalProduct> {
        let entry = self.entries.get(id)?;
        if entry.status() != EntryStatus::Valid || !self.is_fresh(id, entry, now) {
            return None;
        }
        entry.data().cloned()
    }

    /// Store a found product, replacing any prior entry.
    ///
    /// Invisible control and formatting characters are stripped from every
    /// string before the record is kept.
    pub fn set(&mut self, id: &str, product: &CanonicalProduct) -> Result<(), CacheError> {
        self.set_at(id, product, now_ms())
    }

    fn set_at(&mut self, id: &str, product: &CanonicalProduct, now: i64) -> Result<(), CacheError> {
        let mut value = serde_json::to_value(product)?;
        sanitize_value(&mut value);
        let clean: CanonicalProduct = serde_json::from_value(value)?;
        self.entries
            .insert(strip_invisible(id), CacheEntry::valid(clean, now));
        Ok(())
    }

    /// Record that the vendor confirmed `id` is absent.
    pub fn mark_invalid(&mut self, id: &str) {
        self.mark_invalid_at(id, now_ms());
    }

    fn mark_invalid_at(&mut self, id: &str, now: i64) {
        debug!("Marking {} as not found", id);
        self.entries
            .insert(strip_invisible(id), CacheEntry::invalid(now));
    }

    /// Whether `id` is a fresh confirmed-absent entry.
    pub fn is_invalid(&self, id: &str) -> bool {
        self.is_invalid_at(id, now_ms())
    }

    fn is_invalid_at(&self, id: &str, now: i64) -> bool {
        match self.entries.get(id) {
            Some(entry) => entry.status() == EntryStatus::Invalid && self.is_fresh(id, entry, now),
            None => false,
        }
    }

    /// Identifiers worth a network call: neither fresh-valid nor fresh-invalid.
    ///
    /// Order is preserved and duplicates are removed.
    pub fn get_missing<S: AsRef<str>>(&self, ids: &[S]) -> Vec<String> {
        self.get_missing_at(ids, now_ms())
    }

    fn get_missing_at<S: AsRef<str>>(&self, ids: &[S], now: i64) -> Vec<String> {
        let mut seen = HashSet::new();
        ids.iter()
            .map(|id| id.as_ref())
            .filter(|id| seen.insert(*id))
            .filter(|id| self.get_at(id, now).is_none() && !self.is_invalid_at(id, now))
            .map(str::to_string)
            .collect()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats_at(now_ms())
    }

    fn stats_at(&self, now: i64) -> CacheStats {
        let mut stats = CacheStats {
            total: self.entries.len(),
            ..Default::default()
        };
        for (id, entry) in &self.entries {
            match entry.status() {
                EntryStatus::Valid => stats.valid += 1,
                EntryStatus::Invalid => stats.invalid += 1,
            }
            if !self.is_fresh(id, entry, now) {
                stats.expired += 1;
            }
        }
        stats
    }

    /// Replace in-memory entries with the document on disk.
    ///
    /// A missing file leaves the cache empty. A corrupt document is logged
    /// and discarded. Returns the number of entries loaded.
    pub fn load(&mut self) -> Result<usize, CacheError> {
        let _guard = self.span.enter();

        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cache file at {}", self.path.display());
                self.entries.clear();
                return Ok(0);
            }
            Err(e) => return Err(CacheError::io(&self.path, e)),
        };

        match decode_document(&text) {
            Ok(doc) => {
                if doc.upgraded > 0 {
                    info!("Upgraded {} legacy cache entries", doc.upgraded);
                }
                if doc.dropped > 0 {
                    warn!("Dropped {} unreadable cache entries", doc.dropped);
                }
                self.entries = doc.entries;
            }
            Err(e) => {
                warn!(
                    "Cache file {} is unreadable, starting empty: {}",
                    self.path.display(),
                    e
                );
                self.entries.clear();
            }
        }

        debug!("Loaded {} cache entries", self.entries.len());
        Ok(self.entries.len())
    }

    /// Write the whole document atomically.
    ///
    /// Safe to call after every batch: the previous file stays intact until
    /// the new one has been fully written.
    pub fn save(&self) -> Result<(), CacheError> {
        let _guard = self.span.enter();

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;

        let sorted: std::collections::BTreeMap<&String, &CacheEntry> =
            self.entries.iter().collect();
        let json = serde_json::to_string_pretty(&sorted)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| CacheError::io(&dir, e))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| CacheError::io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| CacheError::io(tmp.path(), e))?;
        tmp.persist(&self.path)?;

        debug!("Saved {} cache entries to {}", self.entries.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryInfo;

    const HOUR_MS: i64 = 60 * 60 * 1000;
    const T0: i64 = 1_700_000_000_000;

    fn product(id: &str) -> CanonicalProduct {
        CanonicalProduct {
            asin: id.to_string(),
            title: format!("Product {}", id),
            category: CategoryInfo {
                main: "キッチン家電".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn cache_with_signal(ids: &'static [&'static str]) -> ProductCache {
        let signal = move |id: &str| ids.iter().any(|known| *known == id);
        ProductCache::new("unused.json", Arc::new(signal))
    }

    #[test]
    fn test_set_then_get_round_trip() {
        let mut cache = cache_with_signal(&[]);
        let p = product("B000000001");
        cache.set_at("B000000001", &p, T0).unwrap();
        assert_eq!(cache.get_at("B000000001", T0), Some(p));
    }

    #[test]
    fn test_valid_ttl_boundary() {
        let mut cache = cache_with_signal(&[]);
        cache.set_at("B000000001", &product("B000000001"), T0).unwrap();
        assert!(cache.get_at("B000000001", T0 + 24 * HOUR_MS).is_some());
        assert!(cache.get_at("B000000001", T0 + 24 * HOUR_MS + 1).is_none());
    }

    #[test]
    fn test_invalid_entry_is_never_returned() {
        let mut cache = cache_with_signal(&[]);
        cache.mark_invalid_at("B000000001", T0);
        assert!(cache.get_at("B000000001", T0).is_none());
        assert!(cache.is_invalid_at("B000000001", T0));
    }

    #[test]
    fn test_invalid_ttl_depends_on_investigation() {
        let mut cache = cache_with_signal(&["B000000001"]);
        cache.mark_invalid_at("B000000001", T0);
        cache.mark_invalid_at("B000000002", T0);

        assert!(cache.is_invalid_at("B000000001", T0 + HOUR_MS));
        assert!(!cache.is_invalid_at("B000000001", T0 + HOUR_MS + 1));

        assert!(cache.is_invalid_at("B000000002", T0 + HOUR_MS + 1));
        assert!(cache.is_invalid_at("B000000002", T0 + 24 * HOUR_MS));
        assert!(!cache.is_invalid_at("B000000002", T0 + 24 * HOUR_MS + 1));
    }

    #[test]
    fn test_mark_invalid_idempotent() {
        let mut once = cache_with_signal(&[]);
        once.mark_invalid_at("B000000001", T0);

        let mut twice = cache_with_signal(&[]);
        twice.mark_invalid_at("B000000001", T0);
        twice.mark_invalid_at("B000000001", T0);

        assert_eq!(once.entry("B000000001"), twice.entry("B000000001"));
        assert_eq!(once.len(), twice.len());
    }

    #[test]
    fn test_refetch_supersedes_invalid() {
        let mut cache = cache_with_signal(&[]);
        cache.mark_invalid_at("B000000001", T0);
        cache.set_at("B000000001", &product("B000000001"), T0 + 1).unwrap();
        assert!(!cache.is_invalid_at("B000000001", T0 + 1));
        assert!(cache.get_at("B000000001", T0 + 1).is_some());
    }

    #[test]
    fn test_get_missing() {
        let mut cache = cache_with_signal(&[]);
        let ids: Vec<String> = (1..=12).map(|i| format!("B0000000{:02}", i)).collect();
        for id in &ids[0..3] {
            cache.set_at(id, &product(id), T0).unwrap();
        }
        for id in &ids[3..5] {
            cache.mark_invalid_at(id, T0);
        }

        let missing = cache.get_missing_at(&ids, T0 + 1000);
        assert_eq!(missing, ids[5..].to_vec());
    }

    #[test]
    fn test_get_missing_dedupes_and_includes_stale() {
        let mut cache = cache_with_signal(&[]);
        cache.set_at("B000000001", &product("B000000001"), T0).unwrap();
        let missing = cache.get_missing_at(
            &["B000000002", "B000000001", "B000000002"],
            T0 + 25 * HOUR_MS,
        );
        assert_eq!(missing, vec!["B000000002", "B000000001"]);
    }

    #[test]
    fn test_set_strips_invisible_characters() {
        let mut cache = cache_with_signal(&[]);
        let mut p = product("B000000001");
        p.title = "\u{FEFF}電気\u{200B}ケトル\u{200E}".to_string();
        p.features = vec!["空焚き\u{2060}防止".to_string()];
        p.specifications
            .insert("color\u{200D}".to_string(), "ホワイト\u{202C}".to_string());
        cache.set_at("B000000001", &p, T0).unwrap();

        let stored = cache.get_at("B000000001", T0).unwrap();
        assert_eq!(stored.title, "電気ケトル");
        assert_eq!(stored.features, vec!["空焚き防止"]);
        assert_eq!(stored.specifications["color"], "ホワイト");
    }

    #[test]
    fn test_stats() {
        let mut cache = cache_with_signal(&[]);
        cache.set_at("B000000001", &product("B000000001"), T0).unwrap();
        cache.set_at("B000000002", &product("B000000002"), T0 - 25 * HOUR_MS).unwrap();
        cache.mark_invalid_at("B000000003", T0);

        let stats = cache.stats_at(T0);
        assert_eq!(
            stats,
            CacheStats {
                total: 3,
                valid: 2,
                invalid: 1,
                expired: 1
            }
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("product-cache.json");

        let mut cache = ProductCache::new(&path, Arc::new(NoInvestigations));
        cache.set("B000000001", &product("B000000001")).unwrap();
        cache.mark_invalid("B000000002");
        cache.save().unwrap();

        let reopened = ProductCache::open(&path, Arc::new(NoInvestigations)).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.get("B000000001"), Some(product("B000000001")));
        assert!(reopened.is_invalid("B000000002"));
    }

    #[test]
    fn test_load_legacy_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("product-cache.json");
        let now = Utc::now().timestamp_millis();
        let legacy = serde_json::json!({
            "B000000001": {"data": {"asin": "B000000001", "title": "Kettle"}, "timestamp": now}
        });
        std::fs::write(&path, legacy.to_string()).unwrap();

        let cache = ProductCache::open(&path, Arc::new(NoInvestigations)).unwrap();
        assert_eq!(cache.get("B000000001").unwrap().title, "Kettle");
    }

    #[test]
    fn test_load_missing_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("product-cache.json");

        let cache = ProductCache::open(&path, Arc::new(NoInvestigations)).unwrap();
        assert!(cache.is_empty());

        std::fs::write(&path, "{ not json").unwrap();
        let cache = ProductCache::open(&path, Arc::new(NoInvestigations)).unwrap();
        assert!(cache.is_empty());
    }
}
