//! Shared Cache Module
//!
//! Thread-safe cache handle: one lock around the store and, when persistence
//! is enabled, around the log append as well.

use std::borrow::Borrow;
use std::fmt;
use std::fs::File;
use std::hash::Hash;
use std::io::BufReader;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::cache::{CacheStats, CacheStore, EntryView};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::persistence::{replay_into, AofWriter, LogRecord, ReplaySummary};

// == Cache ==
/// Bounded LRU cache with lazy TTL expiration and an optional append-only log.
///
/// Every public operation holds a single exclusive lock for its full
/// duration, log I/O included. Operations are therefore linearizable in
/// lock-acquisition order, and the log lists mutations in that same order.
///
/// Keys are written to the log in their `Display` form and read back with
/// `FromStr`; values go through `serde_json`.
pub struct Cache<K = String, V = serde_json::Value> {
    inner: Mutex<Inner<K, V>>,
}

struct Inner<K, V> {
    store: CacheStore<K, V>,
    writer: AofWriter,
    persistent: bool,
}

impl<K, V> Inner<K, V>
where
    K: Hash + Eq + Clone + fmt::Display,
    V: Clone,
{
    /// Appends a record, reporting failures instead of returning them.
    fn persist(&mut self, record: Result<LogRecord>) {
        if let Err(error) = record.and_then(|record| self.writer.append(&record)) {
            self.store.record_log_write_failure();
            self.store
                .observer()
                .log_write_failed(self.writer.path(), &error);
        }
    }
}

/// Persistence is switched off while this guard lives and restored on drop,
/// even if replay unwinds.
struct PersistenceSuspended<'a, K, V> {
    inner: &'a mut Inner<K, V>,
    previous: bool,
}

impl<'a, K, V> PersistenceSuspended<'a, K, V> {
    fn new(inner: &'a mut Inner<K, V>) -> Self {
        let previous = std::mem::replace(&mut inner.persistent, false);
        Self { inner, previous }
    }
}

impl<K, V> Deref for PersistenceSuspended<'_, K, V> {
    type Target = Inner<K, V>;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl<K, V> DerefMut for PersistenceSuspended<'_, K, V> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.inner
    }
}

impl<K, V> Drop for PersistenceSuspended<'_, K, V> {
    fn drop(&mut self) {
        self.inner.persistent = self.previous;
    }
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone + fmt::Display,
    V: Clone + Serialize,
{
    // == Constructors ==
    /// Creates a cache holding at most `capacity` entries (clamped to 1).
    ///
    /// When `persistent` is true every successful Set/Delete is appended to
    /// `log_path`; an empty path falls back to the default log location.
    pub fn new(capacity: usize, persistent: bool, log_path: impl AsRef<Path>) -> Self {
        Self::with_store(CacheStore::new(capacity), persistent, log_path)
    }

    /// Creates a cache without a log.
    pub fn in_memory(capacity: usize) -> Self {
        Self::new(capacity, false, "")
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity, config.persistent, &config.log_path)
    }

    /// Wraps a preconfigured store, e.g. one with a custom validator or observer.
    pub fn with_store(
        store: CacheStore<K, V>,
        persistent: bool,
        log_path: impl AsRef<Path>,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                store,
                writer: AofWriter::new(log_path),
                persistent,
            }),
        }
    }

    // == Set ==
    /// Stores a key-value pair with optional TTL.
    ///
    /// Returns false only when the key is rejected by validation. A failed
    /// log append does not change the result; it is counted in
    /// [`CacheStats::log_write_failures`] and reported to the observer.
    pub fn set(&self, key: K, value: V, ttl: Option<Duration>) -> bool {
        let mut inner = self.inner.lock();
        let record = inner
            .persistent
            .then(|| LogRecord::set(&key, &value, ttl));

        if !inner.store.set(key, value, ttl) {
            return false;
        }
        if let Some(record) = record {
            inner.persist(record);
        }
        true
    }

    // == Get ==
    /// Retrieves a value, marking it most recently used.
    ///
    /// Expired entries are removed here and reported as absent.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        self.inner.lock().store.get(key)
    }

    // == Delete ==
    /// Removes an entry. Returns whether it was resident.
    pub fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        let mut inner = self.inner.lock();
        if !inner.store.delete(key) {
            return false;
        }
        if inner.persistent {
            inner.persist(Ok(LogRecord::delete(key)));
        }
        true
    }

    // == Length ==
    /// Number of resident entries, including expired entries nobody has read yet.
    pub fn len(&self) -> usize {
        self.inner.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().store.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().store.capacity()
    }

    /// Reads a value without changing recency or removing expired entries.
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().store.peek(key).cloned()
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().store.contains(key)
    }

    /// Outer None = not resident, inner None = no expiry.
    pub fn ttl_remaining<Q>(&self, key: &Q) -> Option<Option<Duration>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().store.ttl_remaining(key)
    }

    /// Drops every expired entry now. Not written to the log.
    pub fn purge_expired(&self) -> usize {
        self.inner.lock().store.purge_expired()
    }

    /// Removes every entry. Returns how many were removed.
    ///
    /// With persistence on, each removed key is logged as a DELETE, least
    /// recently used first.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.lock();
        let keys = inner.store.clear();
        if inner.persistent {
            for key in &keys {
                inner.persist(Ok(LogRecord::delete(key)));
            }
        }
        keys.len()
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<K> {
        self.inner.lock().store.keys()
    }

    /// Copies of every resident entry, most recently used first.
    pub fn snapshot(&self) -> Vec<EntryView<K, V>> {
        self.inner.lock().store.snapshot()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().store.stats()
    }

    // == Persistence Flag ==
    pub fn is_persistent(&self) -> bool {
        self.inner.lock().persistent
    }

    pub fn set_persistent(&self, persistent: bool) {
        self.inner.lock().persistent = persistent;
    }

    pub fn log_path(&self) -> std::path::PathBuf {
        self.inner.lock().writer.path().to_path_buf()
    }
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone + fmt::Display + FromStr,
    V: Clone + Serialize + DeserializeOwned,
{
    // == Replay ==
    /// Rebuilds state by re-applying every record in the log at `path`.
    ///
    /// Failing to open the file is the only fatal error besides read errors;
    /// undecodable lines are skipped. Nothing is appended to the log while
    /// replaying, and the persistence flag is restored afterwards. The lock
    /// is held for the whole replay.
    ///
    /// Eviction runs against this cache's capacity, which need not match the
    /// capacity that produced the log.
    pub fn replay_log(&self, path: impl AsRef<Path>) -> Result<ReplaySummary> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CacheError::ReplayOpen {
            path: path.to_path_buf(),
            source,
        })?;

        let mut inner = self.inner.lock();
        let mut suspended = PersistenceSuspended::new(&mut inner);
        let summary = replay_into(&mut suspended.store, BufReader::new(file))?;

        info!(
            path = %path.display(),
            sets = summary.sets,
            deletes = summary.deletes,
            skipped = summary.skipped,
            "Replayed log"
        );
        Ok(summary)
    }
}

impl<K, V> fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Cache")
            .field("store", &inner.store)
            .field("log_path", &inner.writer.path())
            .field("persistent", &inner.persistent)
            .finish()
    }
}
