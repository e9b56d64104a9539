//! Configuration Module
//!
//! Handles loading cache construction parameters from environment variables.

use std::env;
use std::path::PathBuf;

use crate::persistence::DEFAULT_LOG_PATH;

/// Cache construction parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold (clamped to at least 1)
    pub capacity: usize,
    /// Whether mutating calls are appended to the log
    pub persistent: bool,
    /// Location of the append-only log
    pub log_path: PathBuf,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `CACHE_PERSISTENT` - `1`, `true`, `yes` or `on` enables the log (default: off)
    /// - `CACHE_LOG_PATH` - Log file location (default: `appendonly.aof`)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source.
    ///
    /// Missing or unparsable values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            capacity: lookup("CACHE_CAPACITY")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.capacity),
            persistent: lookup("CACHE_PERSISTENT")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.persistent),
            log_path: lookup("CACHE_LOG_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.log_path),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            persistent: false,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.capacity, 1000);
        assert!(!config.persistent);
        assert_eq!(config.log_path, PathBuf::from("appendonly.aof"));
    }

    #[test]
    fn test_config_from_empty_source() {
        let config = CacheConfig::from_lookup(|_| None);
        assert_eq!(config.capacity, 1000);
        assert!(!config.persistent);
        assert_eq!(config.log_path, PathBuf::from(DEFAULT_LOG_PATH));
    }

    #[test]
    fn test_config_overrides() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            ("CACHE_CAPACITY", "16"),
            ("CACHE_PERSISTENT", "Yes"),
            ("CACHE_LOG_PATH", "/var/lib/cache/ops.aof"),
        ]));
        assert_eq!(config.capacity, 16);
        assert!(config.persistent);
        assert_eq!(config.log_path, PathBuf::from("/var/lib/cache/ops.aof"));
    }

    #[test]
    fn test_config_unparsable_values_fall_back() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            ("CACHE_CAPACITY", "lots"),
            ("CACHE_PERSISTENT", "maybe"),
            ("CACHE_LOG_PATH", "   "),
        ]));
        assert_eq!(config.capacity, 1000);
        assert!(!config.persistent);
        assert_eq!(config.log_path, PathBuf::from(DEFAULT_LOG_PATH));
    }
}
