//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Cache Entry ==
/// Represents a single cache entry with its key, value and expiry.
///
/// The key is kept alongside the value so that evicting the back of the
/// recency list can also clear the index.
#[derive(Debug, Clone)]
pub struct CacheEntry<K, V> {
    /// The key this entry is indexed under
    pub key: K,
    /// The stored value
    pub value: V,
    /// Absolute expiry, None = no expiration
    pub expires_at: Option<Instant>,
}

impl<K, V> CacheEntry<K, V> {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL measured from now.
    pub fn new(key: K, value: V, ttl: Option<Duration>) -> Self {
        Self {
            key,
            value,
            expires_at: expiry_from_now(ttl),
        }
    }

    // == Refresh ==
    /// Replaces the value in place and recomputes the expiry.
    ///
    /// A `None` TTL clears any previous expiry.
    pub fn refresh(&mut self, value: V, ttl: Option<Duration>) {
        self.value = value;
        self.expires_at = expiry_from_now(ttl);
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is still live at its expiry instant and
    /// expired strictly after it.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Same as [`is_expired`](Self::is_expired) against a fixed clock reading.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now > expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has expired
    /// - `Some(remaining)` if the entry has TTL and hasn't expired
    /// - `None` if the entry has no TTL (never expires)
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(Instant::now()))
    }

    /// Wall-clock rendering of the expiry, for dumps and debugging.
    ///
    /// Returns None when there is no expiry or it lies beyond what
    /// `chrono` can represent.
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        let remaining = chrono::Duration::from_std(self.ttl_remaining()?).ok()?;
        Utc::now().checked_add_signed(remaining)
    }
}

/// A TTL too large to represent as an `Instant` means "never expires".
fn expiry_from_now(ttl: Option<Duration>) -> Option<Instant> {
    ttl.and_then(|ttl| Instant::now().checked_add(ttl))
}

// == Entry View ==
/// Owned, serializable copy of an entry as returned by cache dumps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryView<K, V> {
    pub key: K,
    pub value: V,
    /// Wall-clock expiry, None = no expiration
    pub expires_at: Option<DateTime<Utc>>,
}

impl<K: Clone, V: Clone> From<&CacheEntry<K, V>> for EntryView<K, V> {
    fn from(entry: &CacheEntry<K, V>) -> Self {
        Self {
            key: entry.key.clone(),
            value: entry.value.clone(),
            expires_at: entry.expires_at_utc(),
        }
    }
}
