//! Cache Store Module
//!
//! Main cache engine combining a key index with an arena-backed recency list
//! and lazy TTL expiration. Not synchronized; see [`Cache`](crate::cache::Cache)
//! for the locked handle.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::{
    AcceptAnyKey, CacheEntry, CacheObserver, CacheStats, EntryView, KeyValidator, RecencyList,
    SlotId, TracingObserver,
};

// == Cache Store ==
/// Bounded key-value storage with LRU eviction and lazy TTL expiration.
///
/// Invariants:
/// - every indexed key maps to exactly one live node, and vice versa
/// - `len() <= capacity()`
/// - the recency list runs from most to least recently used
///
/// Expired entries stay resident, counted by `len()` and holding a slot,
/// until a `get` touches them, LRU eviction reaches them, or
/// [`purge_expired`](Self::purge_expired) is called.
pub struct CacheStore<K, V> {
    /// Key to node handle
    index: HashMap<K, SlotId>,
    /// Entries ordered by recency
    recency: RecencyList<CacheEntry<K, V>>,
    /// Activity counters
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
    validator: Box<dyn KeyValidator>,
    observer: Arc<dyn CacheObserver>,
}

impl<K, V> CacheStore<K, V>
where
    K: Hash + Eq + Clone + fmt::Display,
    V: Clone,
{
    // == Constructor ==
    /// Creates a new CacheStore holding at most `capacity` entries.
    ///
    /// Capacities below 1 are clamped to 1. Storage grows on demand, so
    /// `capacity` is only an upper bound. Every key is accepted unless a
    /// validator such as [`KeyRules`](crate::cache::KeyRules) is installed
    /// with [`with_validator`](Self::with_validator). Events go to
    /// [`TracingObserver`].
    pub fn new(capacity: usize) -> Self {
        Self {
            index: HashMap::new(),
            recency: RecencyList::new(),
            stats: CacheStats::new(),
            capacity: capacity.max(1),
            validator: Box::new(AcceptAnyKey),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replaces the key validator.
    pub fn with_validator(mut self, validator: impl KeyValidator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    /// Replaces the event observer.
    pub fn with_observer(mut self, observer: Arc<dyn CacheObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub(crate) fn observer(&self) -> &Arc<dyn CacheObserver> {
        &self.observer
    }

    // == Set ==
    /// Stores a key-value pair with optional TTL.
    ///
    /// An existing key is updated in place: value replaced, expiry recomputed
    /// (or cleared when `ttl` is None), moved to the front, nothing evicted.
    /// A new key at capacity evicts the least recently used entry first,
    /// whether or not some other entry has already expired.
    ///
    /// Returns false only when the key fails validation.
    pub fn set(&mut self, key: K, value: V, ttl: Option<Duration>) -> bool {
        if !self.accepts(&key) {
            return false;
        }

        if let Some(&id) = self.index.get(&key) {
            if let Some(entry) = self.recency.get_mut(id) {
                entry.refresh(value, ttl);
            }
            self.recency.touch(id);
            return true;
        }

        if self.recency.len() >= self.capacity {
            self.evict_lru();
        }

        let id = self
            .recency
            .push_front(CacheEntry::new(key.clone(), value, ttl));
        self.index.insert(key, id);
        true
    }

    // == Get ==
    /// Retrieves a value by key and marks it most recently used.
    ///
    /// An expired entry is removed and reported as absent.
    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        if !self.accepts(key) {
            return None;
        }

        let Some(&id) = self.index.get(key) else {
            self.stats.record_miss();
            return None;
        };

        let expired = self
            .recency
            .get(id)
            .map_or(false, |entry| entry.is_expired());
        if expired {
            self.index.remove(key);
            self.recency.remove(id);
            self.stats.record_expiration();
            self.stats.record_miss();
            self.observer.expired(&key);
            return None;
        }

        self.recency.touch(id);
        self.stats.record_hit();
        self.recency.get(id).map(|entry| entry.value.clone())
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether it was resident.
    ///
    /// A resident entry counts even if its TTL has already elapsed.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        if !self.accepts(key) {
            return false;
        }

        match self.index.remove(key) {
            Some(id) => {
                self.recency.remove(id);
                true
            }
            None => false,
        }
    }

    // == Peek ==
    /// Returns the value without touching recency or removing expired entries.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = *self.index.get(key)?;
        self.recency
            .get(id)
            .filter(|entry| !entry.is_expired())
            .map(|entry| &entry.value)
    }

    /// Whether the key is resident, expired or not.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Remaining TTL of a resident key.
    ///
    /// Outer None = not resident, inner None = no expiry.
    pub fn ttl_remaining<Q>(&self, key: &Q) -> Option<Option<Duration>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = *self.index.get(key)?;
        self.recency.get(id).map(CacheEntry::ttl_remaining)
    }

    // == Purge Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Only runs when called; nothing in the cache sweeps on its own.
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let expired: Vec<SlotId> = self
            .recency
            .iter_entries()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(id, _)| id)
            .collect();

        let count = expired.len();
        for id in expired {
            if let Some(entry) = self.recency.remove(id) {
                self.index.remove(&entry.key);
                self.stats.record_expiration();
                self.observer.expired(&entry.key);
            }
        }
        count
    }

    // == Clear ==
    /// Removes every entry, returning the keys from least to most recently used.
    pub fn clear(&mut self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.recency.len());
        while let Some(entry) = self.recency.pop_back() {
            keys.push(entry.key);
        }
        self.index.clear();
        keys
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<K> {
        self.recency.iter().map(|entry| entry.key.clone()).collect()
    }

    /// Copies of every resident entry, most recently used first.
    pub fn snapshot(&self) -> Vec<EntryView<K, V>> {
        self.recency.iter().map(EntryView::from).collect()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.index.len());
        stats
    }

    pub(crate) fn record_log_write_failure(&mut self) {
        self.stats.record_log_write_failure();
    }

    // == Length ==
    /// Returns the number of resident entries, including expired ones not yet touched.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn evict_lru(&mut self) {
        if let Some(entry) = self.recency.pop_back() {
            self.index.remove(&entry.key);
            self.stats.record_eviction();
            self.observer.evicted(&entry.key);
        }
    }

    fn accepts<Q>(&self, key: &Q) -> bool
    where
        Q: fmt::Display + ?Sized,
    {
        match self.validator.validate(&key) {
            Ok(()) => true,
            Err(error) => {
                self.observer.invalid_key(&key, &error);
                false
            }
        }
    }
}

impl<K, V> fmt::Debug for CacheStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("len", &self.index.len())
            .field("capacity", &self.capacity)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
