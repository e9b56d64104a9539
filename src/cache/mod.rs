//! Cache Module
//!
//! Provides in-memory caching with lazy TTL expiration and LRU eviction.

mod entry;
mod events;
mod lru;
mod shared;
mod stats;
mod store;
mod validator;


// Re-export public types
pub use entry::{CacheEntry, EntryView};
pub use events::{CacheObserver, NoopObserver, TracingObserver};
pub use lru::{RecencyList, SlotId};
pub use shared::Cache;
pub use stats::CacheStats;
pub use store::CacheStore;
pub use validator::{AcceptAnyKey, KeyRules, KeyValidator};

// == Public Constants ==
/// Default maximum key length in bytes for [`KeyRules`]
pub const MAX_KEY_LENGTH: usize = 256;
