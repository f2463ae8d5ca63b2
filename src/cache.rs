//! Durable ASIN cache.
//!
//! A keyed store persisted as a single JSON document. Reads come from the
//! in-memory map; every mutation rewrites the document wholesale through a
//! temp file and an atomic rename, so concurrent readers never observe a
//! torn write. A truncated or invalid document degrades to an empty cache
//! with a logged warning instead of failing the process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{LookupError, Result};
use crate::models::SourceKind;

/// One cached resolution. `asin: None` records a negative result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub asin: Option<String>,
    pub source: Option<SourceKind>,
    pub timestamp: DateTime<Utc>,
}

impl CacheEntry {
    pub fn positive(asin: String, source: SourceKind) -> Self {
        Self {
            asin: Some(asin),
            source: Some(source),
            timestamp: Utc::now(),
        }
    }

    pub fn negative() -> Self {
        Self {
            asin: None,
            source: None,
            timestamp: Utc::now(),
        }
    }

    fn is_negative(&self) -> bool {
        self.asin.is_none()
    }
}

/// Counts reported by `bookhound cache stats`.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
}

#[derive(Serialize, Deserialize, Default)]
struct PersistedCache {
    version: u32,
    entries: HashMap<String, CacheEntry>,
}

const CACHE_FORMAT_VERSION: u32 = 1;

/// Keyed ASIN store with JSON persistence.
///
/// Construct with [`AsinCache::open`]; pass `None` as the path for an
/// in-memory cache (tests, `--no-cache` style runs). Negative entries
/// expire after `negative_ttl_days`; positive entries never expire.
pub struct AsinCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    path: Option<PathBuf>,
    negative_ttl: Option<Duration>,
}

impl AsinCache {
    /// Load-or-create a cache at `path`.
    pub fn open(path: Option<PathBuf>, negative_ttl_days: Option<i64>) -> Self {
        let cache = Self {
            entries: RwLock::new(HashMap::new()),
            path,
            negative_ttl: negative_ttl_days.map(Duration::days),
        };

        if let Some(ref path) = cache.path {
            if let Err(e) = cache.load_from_file(path) {
                tracing::warn!(path = %path.display(), error = %e, "cache unreadable, starting empty");
            }
        }

        cache
    }

    /// In-memory cache with no persistence, for tests.
    pub fn in_memory() -> Self {
        Self::open(None, None)
    }

    /// Look up a key. A negative entry older than the TTL reads as a miss
    /// so the book gets re-resolved.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if entry.is_negative() {
            if let Some(ttl) = self.negative_ttl {
                if Utc::now() - entry.timestamp > ttl {
                    return None;
                }
            }
        }
        Some(entry.clone())
    }

    /// Overwrite the entry for `key` wholesale and persist.
    pub fn put(&self, key: &str, entry: CacheEntry) -> Result<()> {
        {
            let mut entries = self.entries.write();
            entries.insert(key.to_string(), entry);
        }
        self.persist()
    }

    /// Drop every entry and persist the empty document.
    pub fn clear(&self) -> Result<()> {
        {
            let mut entries = self.entries.write();
            entries.clear();
        }
        self.persist()
    }

    /// Remove expired negative entries. Returns how many were dropped.
    pub fn prune(&self) -> Result<usize> {
        let removed = {
            let mut entries = self.entries.write();
            let before = entries.len();
            if let Some(ttl) = self.negative_ttl {
                let now = Utc::now();
                entries.retain(|_, e| !(e.is_negative() && now - e.timestamp > ttl));
            }
            before - entries.len()
        };
        if removed > 0 {
            self.persist()?;
        }
        Ok(removed)
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        let negative = entries.values().filter(|e| e.is_negative()).count();
        CacheStats {
            total: entries.len(),
            positive: entries.len() - negative,
            negative,
        }
    }

    fn persist(&self) -> Result<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        self.save_to_file(path)
            .map_err(|e| LookupError::cache_io(e.to_string()))
    }

    fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        let doc = {
            let entries = self.entries.read();
            PersistedCache {
                version: CACHE_FORMAT_VERSION,
                entries: entries.clone(),
            }
        };
        let json = serde_json::to_string_pretty(&doc)?;

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        // Write-then-rename keeps concurrent readers off half-written docs.
        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        std::fs::write(tmp.path(), json)?;
        tmp.persist(path)?;
        Ok(())
    }

    fn load_from_file(&self, path: &Path) -> anyhow::Result<()> {
        if !path.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(path)?;
        let doc: PersistedCache = serde_json::from_str(&content)?;

        let mut entries = self.entries.write();
        *entries = doc.entries;
        Ok(())
    }
}
