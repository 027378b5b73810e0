//! Time-bounded cache for controller list responses.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde_json::Value;

struct Entry {
    value: Value,
    stored_at: Instant,
}

/// Caches JSON payloads by key for a fixed TTL.
///
/// Keys are built as `"{prefix}_{site}"` by [`crate::Connection`], so
/// [`invalidate_prefix`](Self::invalidate_prefix) drops every cached view of
/// one resource family after a write.
pub struct ResponseCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry>>,
}

impl ResponseCache {
    /// Create a cache. A zero TTL disables caching.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Value> {
        if self.ttl.is_zero() {
            return None;
        }
        let entries = self.entries.read().ok()?;
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// Store `value` under `key`.
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        if self.ttl.is_zero() {
            return;
        }
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key.into(),
                Entry {
                    value,
                    stored_at: Instant::now(),
                },
            );
        }
    }

    /// Drop every key starting with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &str) {
        if let Ok(mut entries) = self.entries.write() {
            let before = entries.len();
            entries.retain(|key, _| !key.starts_with(prefix));
            tracing::debug!(prefix, removed = before - entries.len(), "cache invalidated");
        }
    }

    /// Drop everything.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Number of stored entries, fresh or stale.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_and_get() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert("devices_default", json!([{"mac": "aa"}]));
        assert_eq!(cache.get("devices_default").unwrap()[0]["mac"], "aa");
        assert!(cache.get("clients_default").is_none());
    }

    #[test]
    fn test_expired_entries_are_not_returned() {
        let cache = ResponseCache::new(Duration::from_millis(1));
        cache.insert("devices_default", json!([]));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("devices_default").is_none());
    }

    #[test]
    fn test_zero_ttl_disables() {
        let cache = ResponseCache::new(Duration::ZERO);
        cache.insert("devices_default", json!([]));
        assert!(cache.is_empty());
        assert!(cache.get("devices_default").is_none());
    }

    #[test]
    fn test_invalidate_prefix_only_removes_matching_keys() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert("devices_default", json!(1));
        cache.insert("devices_lab", json!(2));
        cache.insert("clients_default", json!(3));
        cache.invalidate_prefix("devices");
        assert!(cache.get("devices_default").is_none());
        assert!(cache.get("devices_lab").is_none());
        assert_eq!(cache.get("clients_default"), Some(json!(3)));
        cache.clear();
        assert!(cache.is_empty());
    }
}
