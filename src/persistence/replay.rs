//! Log replay.
//!
//! Re-applies a log, record by record, to a [`CacheStore`]. Eviction is
//! recomputed with the target store's capacity, so replaying into a smaller
//! cache than the one that wrote the log ends in a different state.

use std::fmt;
use std::hash::Hash;
use std::io::BufRead;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::cache::CacheStore;
use crate::error::Result;
use crate::persistence::{LogRecord, Mutation};

/// Counts from one replay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    /// SET records applied
    pub sets: usize,
    /// DELETE records applied, whether or not the key was resident
    pub deletes: usize,
    /// Lines that failed to decode or carried a rejected key
    pub skipped: usize,
}

/// Applies every record in `reader` to `store`, in order.
///
/// Undecodable lines are skipped; blank lines are ignored. Only read errors
/// abort the replay, and records applied before the error stay applied.
pub fn replay_into<K, V, R>(store: &mut CacheStore<K, V>, reader: R) -> Result<ReplaySummary>
where
    K: Hash + Eq + Clone + fmt::Display + FromStr,
    V: Clone + DeserializeOwned,
    R: BufRead,
{
    let mut summary = ReplaySummary::default();

    for (number, line) in reader.split(b'\n').enumerate() {
        let mut line = line?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let mutation = LogRecord::parse(&line).and_then(LogRecord::into_mutation::<K, V>);
        match mutation {
            Ok(Mutation::Set { key, value, ttl }) => {
                if store.set(key, value, ttl) {
                    summary.sets += 1;
                } else {
                    summary.skipped += 1;
                }
            }
            Ok(Mutation::Delete { key }) => {
                store.delete(&key);
                summary.deletes += 1;
            }
            Err(error) => {
                debug!(line = number + 1, %error, "Skipping undecodable log line");
                summary.skipped += 1;
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::KeyRules;
    use std::io::Cursor;
    use std::time::Duration;

    fn replay(log: &str, capacity: usize) -> (CacheStore<String, serde_json::Value>, ReplaySummary) {
        let mut store = CacheStore::new(capacity);
        let summary = replay_into(&mut store, Cursor::new(log.as_bytes().to_vec())).unwrap();
        (store, summary)
    }

    #[test]
    fn test_replay_applies_in_order() {
        let log = concat!(
            r#"{"op":"SET","key":"user","value":"evan"}"#, "\n",
            r#"{"op":"SET","key":"session","value":"abc","ttl_ms":60000}"#, "\n",
            r#"{"op":"DELETE","key":"user"}"#, "\n",
        );
        let (mut store, summary) = replay(log, 10);

        assert_eq!(summary, ReplaySummary { sets: 2, deletes: 1, skipped: 0 });
        assert_eq!(store.get("user"), None);
        assert_eq!(store.get("session"), Some(serde_json::json!("abc")));
        let ttl = store.ttl_remaining("session").flatten().unwrap();
        assert!(ttl > Duration::from_secs(50));
    }

    #[test]
    fn test_replay_skips_malformed_lines() {
        let log = concat!(
            r#"{"op":"SET","key":"a","value":1}"#, "\n",
            "garbage\n",
            r#"{"op":"SET","key":"b""#, "\n",
            r#"{"op":"FLUSH","key":"a"}"#, "\n",
            "\n",
            r#"{"op":"SET","key":"c","value":3}"#, "\r\n",
        );
        let (store, summary) = replay(log, 10);

        assert_eq!(summary.sets, 2);
        assert_eq!(summary.skipped, 3);
        assert_eq!(store.keys(), vec!["c".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_replay_last_line_without_newline() {
        let (store, summary) = replay(r#"{"op":"SET","key":"tail","value":true}"#, 10);

        assert_eq!(summary.sets, 1);
        assert!(store.contains("tail"));
    }

    #[test]
    fn test_replay_invalid_utf8_is_skipped() {
        let mut bytes = b"{\"op\":\"SET\",\"key\":\"\xff\",\"value\":1}\n".to_vec();
        bytes.extend_from_slice(br#"{"op":"SET","key":"ok","value":2}"#);
        let mut store: CacheStore<String, serde_json::Value> = CacheStore::new(10);

        let summary = replay_into(&mut store, Cursor::new(bytes)).unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(store.keys(), vec!["ok".to_string()]);
    }

    #[test]
    fn test_replay_rejected_key_counts_as_skipped() {
        let mut store: CacheStore<String, serde_json::Value> =
            CacheStore::new(10).with_validator(KeyRules::default());
        let log = r#"{"op":"SET","key":"","value":1}"#;

        let summary = replay_into(&mut store, Cursor::new(log.as_bytes().to_vec())).unwrap();

        assert_eq!(summary.skipped, 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_replay_uses_target_capacity() {
        let log = concat!(
            r#"{"op":"SET","key":"a","value":1}"#, "\n",
            r#"{"op":"SET","key":"b","value":2}"#, "\n",
            r#"{"op":"SET","key":"c","value":3}"#, "\n",
        );

        let (large, _) = replay(log, 3);
        let (small, _) = replay(log, 2);

        assert_eq!(large.len(), 3);
        assert_eq!(small.len(), 2);
        assert!(!small.contains("a"));
    }
}
