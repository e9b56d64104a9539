//! AOF Cache - A bounded in-memory key-value cache
//!
//! Provides LRU eviction, lazy TTL expiration and optional crash recovery
//! through an append-only log of mutations.

pub mod cache;
pub mod config;
pub mod error;
pub mod persistence;

pub use cache::{Cache, CacheStats, CacheStore};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use persistence::ReplaySummary;
