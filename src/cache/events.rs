//! Cache Events Module
//!
//! Fire-and-forget notifications for rejected keys, evictions, lazy
//! expirations and failed log appends.

use std::fmt;
use std::path::Path;

use tracing::{debug, error};

use crate::error::CacheError;

// == Cache Observer ==
/// Receives cache events. Every method defaults to doing nothing.
///
/// Implementations must not call back into the cache: events are delivered
/// while the cache lock is held.
pub trait CacheObserver: Send + Sync {
    fn invalid_key(&self, _key: &dyn fmt::Display, _error: &CacheError) {}

    fn evicted(&self, _key: &dyn fmt::Display) {}

    fn expired(&self, _key: &dyn fmt::Display) {}

    fn log_write_failed(&self, _path: &Path, _error: &CacheError) {}
}

// == Tracing Observer ==
/// Default observer, forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CacheObserver for TracingObserver {
    fn invalid_key(&self, key: &dyn fmt::Display, error: &CacheError) {
        debug!(key = %key, %error, "Rejected cache key");
    }

    fn evicted(&self, key: &dyn fmt::Display) {
        debug!(key = %key, "Evicted least recently used entry");
    }

    fn expired(&self, key: &dyn fmt::Display) {
        debug!(key = %key, "Removed expired entry");
    }

    fn log_write_failed(&self, path: &Path, error: &CacheError) {
        error!(path = %path.display(), %error, "Failed to append to log");
    }
}

// == Noop Observer ==
/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CacheObserver for NoopObserver {}
