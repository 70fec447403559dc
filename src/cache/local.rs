//! Local Store Module
//!
//! Secondary tier: a bounded in-process map with per-entry expiry and LRU
//! eviction. Every operation is synchronous and holds the lock only for the
//! duration of the map access.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::cache::pattern::glob_match;
use crate::cache::{CacheEntry, LruTracker};

#[derive(Debug)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
    evictions: u64,
}

impl Inner {
    fn remove(&mut self, key: &str) -> bool {
        self.lru.remove(key);
        self.entries.remove(key).is_some()
    }

    /// Looks up a live entry, dropping it first if it has expired.
    fn live(&mut self, key: &str) -> Option<&mut CacheEntry> {
        if self.entries.get(key).is_some_and(|e| e.is_expired()) {
            self.remove(key);
            return None;
        }
        self.entries.get_mut(key)
    }
}

// == Local Store ==
/// Bounded in-process cache tier.
#[derive(Debug)]
pub struct LocalStore {
    inner: Mutex<Inner>,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// TTL in seconds for entries written without one
    default_ttl: u64,
}

impl LocalStore {
    // == Constructor ==
    /// Creates a store holding at most `max_entries` entries.
    pub fn new(max_entries: usize, default_ttl: u64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                lru: LruTracker::new(),
                evictions: 0,
            }),
            max_entries: max_entries.max(1),
            default_ttl: default_ttl.max(1),
        }
    }

    // == Set ==
    /// Stores a serialized value, overwriting any previous entry and resetting its TTL.
    ///
    /// When full, expired entries are swept first; if that frees nothing the
    /// least recently used entry is evicted.
    pub fn set(&self, key: &str, value: String, ttl: Option<u64>) {
        let ttl = ttl.filter(|t| *t > 0).unwrap_or(self.default_ttl);
        let mut inner = self.inner.lock();

        if !inner.entries.contains_key(key) && inner.entries.len() >= self.max_entries {
            sweep_expired(&mut inner);
            while inner.entries.len() >= self.max_entries {
                let Some(oldest) = inner.lru.evict_oldest() else {
                    break;
                };
                inner.entries.remove(&oldest);
                inner.evictions += 1;
            }
        }

        inner.entries.insert(key.to_string(), CacheEntry::new(value, ttl));
        inner.lru.touch(key);
    }

    // == Get ==
    /// Returns the serialized value if present and not expired.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.inner.lock();
        let value = inner.live(key)?.value.clone();
        inner.lru.touch(key);
        Some(value)
    }

    // == Delete ==
    /// Removes an entry; true if a live entry was present.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        let live = inner.live(key).is_some();
        inner.remove(key);
        live
    }

    pub fn exists(&self, key: &str) -> bool {
        self.inner.lock().live(key).is_some()
    }

    // == TTL ==
    /// Remaining lifetime in seconds, or None if the key is absent.
    pub fn ttl(&self, key: &str) -> Option<u64> {
        self.inner.lock().live(key).map(|e| e.ttl_remaining())
    }

    /// Resets the lifetime of a live entry; false if absent.
    pub fn expire(&self, key: &str, ttl_seconds: u64) -> bool {
        match self.inner.lock().live(key) {
            Some(entry) => {
                entry.set_ttl(ttl_seconds);
                true
            }
            None => false,
        }
    }

    // == Round Trip ==
    /// Writes `value` under `key`, reads it back and restores the previous
    /// state, all under one lock. Capacity, LRU order and eviction counts
    /// are left untouched, so probing a full store displaces nothing.
    pub fn round_trip(&self, key: &str, value: String, ttl_seconds: u64) -> Option<String> {
        let mut inner = self.inner.lock();
        let previous = inner
            .entries
            .insert(key.to_string(), CacheEntry::new(value, ttl_seconds));

        let read_back = inner
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone());

        match previous {
            Some(previous) => {
                inner.entries.insert(key.to_string(), previous);
            }
            None => {
                inner.entries.remove(key);
            }
        }
        read_back
    }

    // == Delete Pattern ==
    /// Removes every live key matching the glob and returns the removed keys.
    pub fn delete_pattern(&self, pattern: &str) -> Vec<String> {
        let mut inner = self.inner.lock();
        sweep_expired(&mut inner);

        let matched: Vec<String> = inner
            .entries
            .keys()
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect();

        for key in &matched {
            inner.remove(key);
        }
        matched
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        sweep_expired(&mut self.inner.lock())
    }

    /// Drops every entry.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.lock();
        let count = inner.entries.len();
        inner.entries.clear();
        inner.lru.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Entries evicted for capacity since creation.
    pub fn evictions(&self) -> u64 {
        self.inner.lock().evictions
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

fn sweep_expired(inner: &mut Inner) -> usize {
    let now = crate::cache::entry::current_timestamp_ms();
    let expired: Vec<String> = inner
        .entries
        .iter()
        .filter(|(_, entry)| entry.is_expired_at(now))
        .map(|(key, _)| key.clone())
        .collect();

    for key in &expired {
        inner.remove(key);
    }
    expired.len()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_store_new() {
        let store = LocalStore::new(100, 300);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.max_entries(), 100);
    }

    #[test]
    fn test_set_and_get() {
        let store = LocalStore::new(100, 300);
        store.set("user:1", "\"alice\"".to_string(), None);

        assert_eq!(store.get("user:1").as_deref(), Some("\"alice\""));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let store = LocalStore::new(100, 300);
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_default_ttl_applied() {
        let store = LocalStore::new(100, 300);
        store.set("k", "v".to_string(), None);
        let ttl = store.ttl("k").unwrap();
        assert!(ttl <= 300 && ttl > 295);

        store.set("z", "v".to_string(), Some(0));
        assert!(store.ttl("z").unwrap() > 295);
    }

    #[test]
    fn test_delete() {
        let store = LocalStore::new(100, 300);
        store.set("k", "v".to_string(), None);

        assert!(store.delete("k"));
        assert!(!store.delete("k"));
        assert!(store.get("k").is_none());
    }

    #[test]
    fn test_overwrite_resets_value() {
        let store = LocalStore::new(100, 300);
        store.set("k", "v1".to_string(), Some(5));
        store.set("k", "v2".to_string(), Some(60));

        assert_eq!(store.get("k").as_deref(), Some("v2"));
        assert!(store.ttl("k").unwrap() > 50);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_ttl_expiration() {
        let store = LocalStore::new(100, 300);
        store.set("k", "v".to_string(), Some(1));
        assert!(store.exists("k"));

        sleep(Duration::from_millis(1100));

        assert!(!store.exists("k"));
        assert!(store.get("k").is_none());
        assert!(store.ttl("k").is_none());
        assert!(!store.delete("k"));
    }

    #[test]
    fn test_expire() {
        let store = LocalStore::new(100, 300);
        store.set("k", "v".to_string(), Some(1));

        assert!(store.expire("k", 60));
        sleep(Duration::from_millis(1100));
        assert!(store.exists("k"));
        assert!(!store.expire("missing", 60));
    }

    #[test]
    fn test_lru_eviction() {
        let store = LocalStore::new(3, 300);
        store.set("k1", "1".to_string(), None);
        store.set("k2", "2".to_string(), None);
        store.set("k3", "3".to_string(), None);
        store.set("k4", "4".to_string(), None);

        assert_eq!(store.len(), 3);
        assert_eq!(store.evictions(), 1);
        assert!(store.get("k1").is_none());
        assert!(store.get("k4").is_some());
    }

    #[test]
    fn test_lru_touch_on_get() {
        let store = LocalStore::new(3, 300);
        store.set("k1", "1".to_string(), None);
        store.set("k2", "2".to_string(), None);
        store.set("k3", "3".to_string(), None);

        store.get("k1");
        store.set("k4", "4".to_string(), None);

        assert!(store.get("k1").is_some());
        assert!(store.get("k2").is_none());
    }

    #[test]
    fn test_full_store_prefers_expired_over_lru() {
        let store = LocalStore::new(2, 300);
        store.set("old", "1".to_string(), Some(60));
        store.set("short", "2".to_string(), Some(1));

        sleep(Duration::from_millis(1100));
        store.set("new", "3".to_string(), None);

        assert!(store.get("old").is_some());
        assert!(store.get("new").is_some());
        assert_eq!(store.evictions(), 0);
    }

    #[test]
    fn test_delete_pattern() {
        let store = LocalStore::new(100, 300);
        store.set("user:1", "a".to_string(), None);
        store.set("user:2", "b".to_string(), None);
        store.set("user:2:profile", "c".to_string(), None);
        store.set("session:1", "d".to_string(), None);

        let mut removed = store.delete_pattern("user:*");
        removed.sort();
        assert_eq!(removed, vec!["user:1", "user:2", "user:2:profile"]);
        assert_eq!(store.len(), 1);
        assert!(store.delete_pattern("nothing:*").is_empty());
    }

    #[test]
    fn test_cleanup_expired() {
        let store = LocalStore::new(100, 300);
        store.set("k1", "v".to_string(), Some(1));
        store.set("k2", "v".to_string(), Some(10));

        sleep(Duration::from_millis(1100));

        assert_eq!(store.cleanup_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("k2").is_some());
    }

    #[test]
    fn test_clear() {
        let store = LocalStore::new(100, 300);
        store.set("k1", "v".to_string(), None);
        store.set("k2", "v".to_string(), None);
        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_round_trip_on_full_store_displaces_nothing() {
        let store = LocalStore::new(2, 300);
        store.set("user:1", "1".to_string(), None);
        store.set("user:2", "2".to_string(), None);

        let read = store.round_trip("health:probe", "ok".to_string(), 10);

        assert_eq!(read.as_deref(), Some("ok"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.evictions(), 0);
        assert!(!store.exists("health:probe"));
        assert_eq!(store.get("user:1").as_deref(), Some("1"));
        assert_eq!(store.get("user:2").as_deref(), Some("2"));
    }

    #[test]
    fn test_round_trip_restores_existing_entry() {
        let store = LocalStore::new(4, 300);
        store.set("k", "original".to_string(), None);

        assert_eq!(store.round_trip("k", "probe".to_string(), 10).as_deref(), Some("probe"));
        assert_eq!(store.get("k").as_deref(), Some("original"));
    }
}
