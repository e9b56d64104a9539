//! Persistence Module
//!
//! Append-only log ("AOF") of SET/DELETE mutations and the replay engine
//! that rebuilds cache state from it.

mod record;
mod replay;
mod writer;

pub use record::{LogOp, LogRecord, Mutation};
pub use replay::{replay_into, ReplaySummary};
pub use writer::AofWriter;

/// Log location used when none is configured.
pub const DEFAULT_LOG_PATH: &str = "appendonly.aof";
