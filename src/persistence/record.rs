//! Log Record Module
//!
//! One JSON object per line:
//! `{"op": "SET"|"DELETE", "key": string, "value": any, "ttl_ms": integer}`.
//! `value` is omitted for DELETE and `ttl_ms` when there is no TTL.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

// == Log Op ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogOp {
    Set,
    Delete,
}

// == Log Record ==
/// A single mutation as written to the append-only log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub op: LogOp,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// TTL in milliseconds; absent, zero or negative means no expiration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_ms: Option<i64>,
}

/// A record decoded back into typed cache arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation<K, V> {
    Set {
        key: K,
        value: V,
        ttl: Option<Duration>,
    },
    Delete {
        key: K,
    },
}

impl LogRecord {
    /// Builds the record for a Set call.
    ///
    /// A TTL shorter than a millisecond is written as 1ms so replay does not
    /// turn it into a non-expiring entry.
    pub fn set<Q, V>(key: &Q, value: &V, ttl: Option<Duration>) -> Result<Self>
    where
        Q: fmt::Display + ?Sized,
        V: Serialize,
    {
        Ok(Self {
            op: LogOp::Set,
            key: key.to_string(),
            value: Some(serde_json::to_value(value)?),
            ttl_ms: ttl.map(ttl_to_ms),
        })
    }

    /// Builds the record for a Delete call.
    pub fn delete<Q>(key: &Q) -> Self
    where
        Q: fmt::Display + ?Sized,
    {
        Self {
            op: LogOp::Delete,
            key: key.to_string(),
            value: None,
            ttl_ms: None,
        }
    }

    /// Parses one log line.
    pub fn parse(line: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(line)?)
    }

    /// Encodes the record as a single line, newline included.
    pub fn to_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    /// TTL to re-apply on replay.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_ms
            .filter(|&ms| ms > 0)
            .map(|ms| Duration::from_millis(ms as u64))
    }

    /// Converts the record into typed cache arguments.
    ///
    /// Fails when the key does not parse as `K` or the value does not
    /// deserialize as `V`; a SET without a value decodes `null`.
    pub fn into_mutation<K, V>(self) -> Result<Mutation<K, V>>
    where
        K: FromStr,
        V: DeserializeOwned,
    {
        let ttl = self.ttl();
        let key = K::from_str(&self.key)
            .map_err(|_| CacheError::MalformedRecord(format!("unparsable key {:?}", self.key)))?;

        match self.op {
            LogOp::Set => {
                let value = serde_json::from_value(self.value.unwrap_or(serde_json::Value::Null))?;
                Ok(Mutation::Set { key, value, ttl })
            }
            LogOp::Delete => Ok(Mutation::Delete { key }),
        }
    }
}

fn ttl_to_ms(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_record_format() {
        let record = LogRecord::set("session", &"abc", Some(Duration::from_secs(2))).unwrap();
        let line = record.to_line().unwrap();

        assert!(line.ends_with('\n'));
        let parsed: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(
            parsed,
            json!({"op": "SET", "key": "session", "value": "abc", "ttl_ms": 2000})
        );
    }

    #[test]
    fn test_set_record_without_ttl_omits_field() {
        let record = LogRecord::set("user", &json!({"name": "evan"}), None).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&record.to_line().unwrap()).unwrap();

        assert_eq!(parsed, json!({"op": "SET", "key": "user", "value": {"name": "evan"}}));
    }

    #[test]
    fn test_delete_record_format() {
        let line = LogRecord::delete("user").to_line().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(parsed, json!({"op": "DELETE", "key": "user"}));
    }

    #[test]
    fn test_sub_millisecond_ttl_rounds_up() {
        let record = LogRecord::set("k", &1, Some(Duration::from_micros(300))).unwrap();
        assert_eq!(record.ttl_ms, Some(1));
        assert_eq!(record.ttl(), Some(Duration::from_millis(1)));

        let zero = LogRecord::set("k", &1, Some(Duration::ZERO)).unwrap();
        assert_eq!(zero.ttl_ms, Some(1));
    }

    #[test]
    fn test_non_positive_ttl_means_none() {
        let zero = LogRecord::parse(br#"{"op":"SET","key":"k","value":1,"ttl_ms":0}"#).unwrap();
        let negative = LogRecord::parse(br#"{"op":"SET","key":"k","value":1,"ttl_ms":-5}"#).unwrap();

        assert_eq!(zero.ttl(), None);
        assert_eq!(negative.ttl(), None);
    }

    #[test]
    fn test_parse_rejects_unknown_op() {
        assert!(LogRecord::parse(br#"{"op":"INCR","key":"k"}"#).is_err());
        assert!(LogRecord::parse(b"not json").is_err());
    }

    #[test]
    fn test_into_mutation_typed() {
        let record = LogRecord::parse(br#"{"op":"SET","key":"7","value":"seven","ttl_ms":1500}"#)
            .unwrap();
        let mutation: Mutation<u32, String> = record.into_mutation().unwrap();

        assert_eq!(
            mutation,
            Mutation::Set {
                key: 7,
                value: "seven".to_string(),
                ttl: Some(Duration::from_millis(1500)),
            }
        );
    }

    #[test]
    fn test_into_mutation_bad_key() {
        let record = LogRecord::delete("not-a-number");
        let result: Result<Mutation<u32, String>> = record.into_mutation();
        assert!(matches!(result, Err(CacheError::MalformedRecord(_))));
    }

    #[test]
    fn test_into_mutation_value_type_mismatch() {
        let record = LogRecord::set("k", &"text", None).unwrap();
        let result: Result<Mutation<String, u32>> = record.into_mutation();
        assert!(matches!(result, Err(CacheError::Serialization(_))));
    }
}
