//! Package.json parse cache.
//!
//! Resolution walks for different imports in one invocation keep reading the
//! same description files. The cache keeps parsed values keyed by path and
//! drops an entry once the file's mtime or size changes.

use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// File stamp for cache invalidation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PkgJsonStamp {
    /// Modification time in milliseconds since epoch.
    pub mtime_ms: Option<u64>,
    /// File size in bytes.
    pub size: Option<u64>,
}

impl PkgJsonStamp {
    /// Create stamp from a path by reading its metadata.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_path(path: &Path) -> Self {
        let Ok(meta) = path.metadata() else {
            return Self::default();
        };
        let mtime_ms = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64);
        Self {
            mtime_ms,
            size: Some(meta.len()),
        }
    }

    /// Check if the stamp matches the current file state.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        let current = Self::from_path(path);
        current.size.is_some() && current == *self
    }
}

/// Cached package.json entry.
#[derive(Debug, Clone)]
pub struct CachedPkgJson {
    /// The parsed package.json value.
    pub value: Value,
    /// File stamp for invalidation.
    pub stamp: PkgJsonStamp,
}

/// Trait for caching parsed package.json files.
pub trait PkgJsonCache: Send + Sync + std::fmt::Debug {
    /// Look up a cached package.json by path.
    ///
    /// Returns None if not cached or if the stamp is invalid.
    fn get(&self, path: &Path) -> Option<Value>;

    /// Store a parsed package.json in the cache.
    fn set(&self, path: &Path, value: Value);
}

/// No-op cache implementation (always misses, never stores).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPkgJsonCache;

impl PkgJsonCache for NoPkgJsonCache {
    fn get(&self, _path: &Path) -> Option<Value> {
        None
    }

    fn set(&self, _path: &Path, _value: Value) {}
}

/// In-memory cache shared by every walk of one invocation.
#[derive(Debug, Default)]
pub struct MemoryPkgJsonCache {
    entries: Mutex<HashMap<PathBuf, CachedPkgJson>>,
}

impl MemoryPkgJsonCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries (valid or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PkgJsonCache for MemoryPkgJsonCache {
    fn get(&self, path: &Path) -> Option<Value> {
        let mut entries = self.entries.lock().ok()?;
        let cached = entries.get(path)?;
        if cached.stamp.matches(path) {
            return Some(cached.value.clone());
        }
        entries.remove(path);
        None
    }

    fn set(&self, path: &Path, value: Value) {
        let stamp = PkgJsonStamp::from_path(path);
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(path.to_path_buf(), CachedPkgJson { value, stamp });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_stamp_matches() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("package.json");
        fs::write(&file, r#"{"name": "test"}"#).unwrap();

        let stamp = PkgJsonStamp::from_path(&file);
        assert!(stamp.mtime_ms.is_some());
        assert!(stamp.matches(&file));
    }

    #[test]
    fn test_stamp_nonexistent_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("nonexistent.json");

        let stamp = PkgJsonStamp::from_path(&file);
        assert!(stamp.size.is_none());
        assert!(!stamp.matches(&file));
    }

    #[test]
    fn test_no_cache_always_misses() {
        let cache = NoPkgJsonCache;
        let path = Path::new("/fake/package.json");

        cache.set(path, serde_json::json!({"name": "test"}));
        assert!(cache.get(path).is_none());
    }

    #[test]
    fn test_memory_cache_hit() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("package.json");
        fs::write(&file, r#"{"name": "a"}"#).unwrap();

        let cache = MemoryPkgJsonCache::new();
        cache.set(&file, serde_json::json!({"name": "a"}));

        assert_eq!(cache.get(&file).unwrap()["name"], "a");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_memory_cache_invalidated_by_size_change() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("package.json");
        fs::write(&file, r#"{"name": "a"}"#).unwrap();

        let cache = MemoryPkgJsonCache::new();
        cache.set(&file, serde_json::json!({"name": "a"}));

        fs::write(&file, r#"{"name": "a-much-longer-name"}"#).unwrap();
        assert!(cache.get(&file).is_none());
        assert!(cache.is_empty());
    }
}
