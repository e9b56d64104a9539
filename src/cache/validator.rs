//! Key Validation Module
//!
//! Pluggable key checks applied before every Get/Set/Delete. A rejected key
//! turns the call into a silent no-op; the reason only reaches the
//! [`CacheObserver`](crate::cache::CacheObserver).

use std::fmt::{self, Write};

use crate::cache::MAX_KEY_LENGTH;
use crate::error::{CacheError, Result};

// == Key Validator ==
/// Decides whether a key may be used with the cache.
///
/// Validation works on the key's `Display` form, which is also the form
/// written to the append-only log.
pub trait KeyValidator: Send + Sync {
    fn validate(&self, key: &dyn fmt::Display) -> Result<()>;
}

// == Key Rules ==
/// Opt-in validator: rejects empty keys and keys longer than `max_len` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRules {
    pub max_len: usize,
}

impl Default for KeyRules {
    fn default() -> Self {
        Self {
            max_len: MAX_KEY_LENGTH,
        }
    }
}

impl KeyValidator for KeyRules {
    fn validate(&self, key: &dyn fmt::Display) -> Result<()> {
        let mut counter = ByteCount(0);
        // ByteCount never fails, so only a broken Display impl can error here
        if write!(counter, "{}", key).is_err() {
            return Err(CacheError::InvalidKey("key cannot be formatted".to_string()));
        }

        match counter.0 {
            0 => Err(CacheError::InvalidKey("key cannot be empty".to_string())),
            len if len > self.max_len => Err(CacheError::InvalidKey(format!(
                "key of {} bytes exceeds maximum length of {} bytes",
                len, self.max_len
            ))),
            _ => Ok(()),
        }
    }
}

// == Accept Any Key ==
/// Validator that accepts every key. Used by [`CacheStore::new`](crate::cache::CacheStore::new).
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAnyKey;

impl KeyValidator for AcceptAnyKey {
    fn validate(&self, _key: &dyn fmt::Display) -> Result<()> {
        Ok(())
    }
}

/// Measures formatted length without allocating.
struct ByteCount(usize);

impl Write for ByteCount {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 += s.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_accept_regular_key() {
        assert!(KeyRules::default().validate(&"session:42").is_ok());
    }

    #[test]
    fn test_rules_reject_empty_key() {
        let result = KeyRules::default().validate(&"");
        assert!(matches!(result, Err(CacheError::InvalidKey(_))));
    }

    #[test]
    fn test_rules_reject_long_key() {
        let long_key = "x".repeat(MAX_KEY_LENGTH + 1);
        let result = KeyRules::default().validate(&long_key);
        assert!(matches!(result, Err(CacheError::InvalidKey(_))));
    }

    #[test]
    fn test_rules_boundary_length() {
        let rules = KeyRules { max_len: 4 };
        assert!(rules.validate(&"abcd").is_ok());
        assert!(rules.validate(&"abcde").is_err());
    }

    #[test]
    fn test_rules_count_numeric_keys() {
        let rules = KeyRules { max_len: 3 };
        assert!(rules.validate(&123u32).is_ok());
        assert!(rules.validate(&1234u32).is_err());
    }

    #[test]
    fn test_accept_any_key() {
        assert!(AcceptAnyKey.validate(&"").is_ok());
    }
}
