//! AOF Cache demo
//!
//! Builds a cache from environment configuration, recovers its state from the
//! append-only log when persistence is enabled, and walks through an LRU
//! eviction.

use anyhow::Context;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aof_cache::{Cache, CacheConfig};

/// Entry point for the cache demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache
/// 4. Replay the existing log, if persistence is on and the file exists
/// 5. Run the demo operations and log the resulting contents
fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aof_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting AOF cache demo");

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: capacity={}, persistent={}, log_path={}",
        config.capacity,
        config.persistent,
        config.log_path.display()
    );

    let cache: Cache = Cache::from_config(&config);

    if config.persistent && config.log_path.exists() {
        let summary = cache
            .replay_log(&config.log_path)
            .with_context(|| format!("failed to replay {}", config.log_path.display()))?;
        info!(
            "Recovered {} entries ({} sets, {} deletes, {} skipped lines)",
            cache.len(),
            summary.sets,
            summary.deletes,
            summary.skipped
        );
    }

    cache.set("a".to_string(), json!(1), None);
    cache.set("b".to_string(), json!(2), None);
    // Reading "a" leaves "b" as the least recently used entry
    cache.get("a");
    cache.set("d".to_string(), json!(3), None);

    let snapshot = serde_json::to_string_pretty(&cache.snapshot())?;
    info!("Cache contents (most recent first):\n{}", snapshot);

    let stats = cache.stats();
    info!(
        "Stats: entries={}, hits={}, misses={}, evictions={}, log_write_failures={}",
        stats.total_entries, stats.hits, stats.misses, stats.evictions, stats.log_write_failures
    );

    Ok(())
}
