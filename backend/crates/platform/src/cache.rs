//! Generic TTL Cache
//!
//! In-memory key-value cache where every entry carries an absolute expiry.
//! Expiry is lazy: an expired entry is removed when it is next looked up,
//! no background sweeper is required. A manual [`TtlCache::cleanup`] sweep
//! is available as an optimization for long-lived caches.
//!
//! The cache knows nothing about what it stores; callers own key naming
//! and TTL policy.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default time-to-live for cache entries (3 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(180);

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Thread-safe key-value cache with per-entry TTL
///
/// Values are cloned out on `get`; store `Arc`s for large values if the
/// clone cost matters.
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Insert a value with the given TTL, replacing any existing entry
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        let mut entries = self.lock();
        entries.insert(
            key,
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Look up a value
    ///
    /// An entry past its expiry is treated as absent and removed on the spot.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Check whether a live (non-expired) entry exists without touching it
    pub fn contains(&self, key: &K) -> bool {
        let entries = self.lock();
        entries
            .get(key)
            .is_some_and(|entry| entry.expires_at > Instant::now())
    }

    /// Remove an entry
    pub fn remove(&self, key: &K) {
        let mut entries = self.lock();
        entries.remove(key);
    }

    /// Remove all entries
    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.clear();
    }

    /// Number of entries currently held, including not-yet-collected expired ones
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache holds no entries at all
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Sweep out every expired entry
    pub fn cleanup(&self) {
        let now = Instant::now();
        let mut entries = self.lock();
        entries.retain(|_, entry| entry.expires_at > now);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, Entry<V>>> {
        // A poisoned lock only means another thread panicked mid-operation;
        // the map itself is still structurally sound.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.set("a".to_string(), 1, Duration::from_secs(60));
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"missing".to_string()), None);
    }

    #[test]
    fn test_set_replaces_existing() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.set("a".to_string(), 1, Duration::from_secs(60));
        cache.set("a".to_string(), 2, Duration::from_secs(60));
        assert_eq!(cache.get(&"a".to_string()), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entry_is_absent_and_removed() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.set("a".to_string(), 1, Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(30));

        assert_eq!(cache.get(&"a".to_string()), None);
        // Lazy expiry removed the entry on lookup
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_contains_respects_expiry() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.set("a".to_string(), 1, Duration::from_millis(10));
        assert!(cache.contains(&"a".to_string()));

        std::thread::sleep(Duration::from_millis(30));
        assert!(!cache.contains(&"a".to_string()));
    }

    #[test]
    fn test_remove_and_clear() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.set("a".to_string(), 1, Duration::from_secs(60));
        cache.set("b".to_string(), 2, Duration::from_secs(60));

        cache.remove(&"a".to_string());
        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.get(&"b".to_string()), Some(2));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cleanup_sweeps_only_expired() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.set("old".to_string(), 1, Duration::from_millis(10));
        cache.set("fresh".to_string(), 2, Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(30));

        cache.cleanup();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"fresh".to_string()), Some(2));
    }
}
