//! Time-boxed profile cache
//!
//! One JSON file per user+date key under the data directory. Entries older
//! than the TTL are treated as absent. Writes are plain read-then-write
//! with no locking; concurrent refreshes for the same key race and the
//! last writer wins, which is acceptable for idempotent snapshots.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::{data_dir, ensure_dir};
use crate::error::Result;

/// Entries older than this are refetched
pub const CACHE_TTL: Duration = Duration::from_secs(30 * 60);

const CACHE_DIR_NAME: &str = "cache";

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    cached_at: i64,
    data: Value,
}

/// File-backed cache keyed by `{user}-{date}`
pub struct CacheStore {
    dir: PathBuf,
    ttl: Duration,
}

impl CacheStore {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: data_dir()?.join(CACHE_DIR_NAME),
            ttl: CACHE_TTL,
        })
    }

    /// Cache rooted at a custom directory (for testing)
    pub fn with_dir(dir: PathBuf) -> Self {
        Self {
            dir,
            ttl: CACHE_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn path_for(&self, user: &str, date: &str) -> PathBuf {
        // Keys become filenames; strip anything path-hostile
        let key: String = format!("{}-{}", user, date)
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", key))
    }

    /// Return the cached value for the key if present and fresh
    pub fn get(&self, user: &str, date: &str) -> Option<Value> {
        let path = self.path_for(user, date);
        let contents = std::fs::read_to_string(&path).ok()?;
        let entry: CacheEntry = serde_json::from_str(&contents).ok()?;

        let age = Utc::now().timestamp() - entry.cached_at;
        if age < 0 || age as u64 > self.ttl.as_secs() {
            debug!(user, date, age, "cache entry stale");
            return None;
        }
        debug!(user, date, age, "cache hit");
        Some(entry.data)
    }

    /// Store a value for the key, overwriting any previous entry
    pub fn put(&self, user: &str, date: &str, data: Value) -> Result<()> {
        ensure_dir(&self.dir)?;
        let entry = CacheEntry {
            cached_at: Utc::now().timestamp(),
            data,
        };
        let path = self.path_for(user, date);
        std::fs::write(&path, serde_json::to_string(&entry)?)?;
        Ok(())
    }

    /// Drop every cached entry
    pub fn clear(&self) -> Result<()> {
        if self.dir.exists() {
            std::fs::remove_dir_all(&self.dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_put_then_get() {
        let tmp = TempDir::new().unwrap();
        let cache = CacheStore::with_dir(tmp.path().to_path_buf());

        cache
            .put("abc-guid", "2025-12-04", json!({"steps": 9000}))
            .unwrap();
        let hit = cache.get("abc-guid", "2025-12-04").unwrap();
        assert_eq!(hit["steps"], 9000);
    }

    #[test]
    fn test_miss_on_unknown_key() {
        let tmp = TempDir::new().unwrap();
        let cache = CacheStore::with_dir(tmp.path().to_path_buf());
        assert!(cache.get("nobody", "2025-12-04").is_none());
    }

    #[test]
    fn test_stale_entry_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = CacheStore::with_dir(tmp.path().to_path_buf()).with_ttl(Duration::ZERO);

        cache.put("abc-guid", "2025-12-04", json!({"x": 1})).unwrap();
        // TTL zero: anything written more than a second ago is stale; force
        // the timestamp back to make the test deterministic
        let path = cache.path_for("abc-guid", "2025-12-04");
        let entry = CacheEntry {
            cached_at: Utc::now().timestamp() - 10,
            data: json!({"x": 1}),
        };
        std::fs::write(&path, serde_json::to_string(&entry).unwrap()).unwrap();
        assert!(cache.get("abc-guid", "2025-12-04").is_none());
    }

    #[test]
    fn test_last_writer_wins() {
        let tmp = TempDir::new().unwrap();
        let cache = CacheStore::with_dir(tmp.path().to_path_buf());

        cache.put("u", "2025-12-04", json!({"v": 1})).unwrap();
        cache.put("u", "2025-12-04", json!({"v": 2})).unwrap();
        assert_eq!(cache.get("u", "2025-12-04").unwrap()["v"], 2);
    }

    #[test]
    fn test_keys_are_sanitized() {
        let tmp = TempDir::new().unwrap();
        let cache = CacheStore::with_dir(tmp.path().to_path_buf());
        cache
            .put("../evil/user", "2025-12-04", json!({"ok": true}))
            .unwrap();
        assert!(cache.get("../evil/user", "2025-12-04").is_some());
        // Nothing escaped the cache directory
        for file in std::fs::read_dir(tmp.path()).unwrap() {
            let name = file.unwrap().file_name();
            assert!(!name.to_string_lossy().contains(".."));
        }
    }

    #[test]
    fn test_clear_removes_entries() {
        let tmp = TempDir::new().unwrap();
        let cache = CacheStore::with_dir(tmp.path().join("cache"));
        cache.put("u", "2025-12-04", json!({"v": 1})).unwrap();
        cache.clear().unwrap();
        assert!(cache.get("u", "2025-12-04").is_none());
    }
}
