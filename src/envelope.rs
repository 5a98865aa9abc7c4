//! # Job envelope: the record pushed onto a queue list.
//!
//! Wire format (JSON):
//! ```text
//! { "byPid": 4242, "byTitle": "worker", "queueName": "emails",
//!   "date": 1700000000000, "data": <any>, "retryCount": 0 }
//! ```
//!
//! `retryCount` is always written as `0` and nothing reads it back.
//!
//! Decoding is lenient about the fields a producer may omit: a missing
//! `data` reads as `null` (a JavaScript producer drops `data: undefined`),
//! and the diagnostic fields fall back to their defaults.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wrapped job record carrying the payload plus producer metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Producing process id (diagnostic only).
    #[serde(default)]
    pub by_pid: u32,
    /// Producing process title (diagnostic only).
    #[serde(default)]
    pub by_title: String,
    /// Bare queue name (list key minus prefix).
    pub queue_name: String,
    /// Enqueue time, epoch milliseconds.
    pub date: i64,
    /// Caller payload.
    #[serde(default)]
    pub data: Value,
    /// Wire-compatibility field; never incremented.
    #[serde(default)]
    pub retry_count: u32,
}

impl Envelope {
    /// Builds a fresh envelope for `queue_name` stamped with the current process and time.
    pub fn new(queue_name: impl Into<String>, data: Value) -> Self {
        Self {
            by_pid: std::process::id(),
            by_title: process_title(),
            queue_name: queue_name.into(),
            date: now_millis(),
            data,
            retry_count: 0,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().min(i64::MAX as u128) as i64)
        .unwrap_or(0)
}

/// Executable file name, the closest analogue of a process title.
fn process_title() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .map(std::path::Path::new)
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cumin".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_field_names() {
        let env = Envelope::new("test.list", json!({"some": "task"}));
        let v: Value = serde_json::from_str(&env.to_json().unwrap()).unwrap();

        assert!(v["byPid"].is_u64());
        assert!(v["byTitle"].is_string());
        assert!(v["date"].is_i64());
        assert_eq!(v["queueName"], "test.list");
        assert_eq!(v["data"], json!({"some": "task"}));
        assert_eq!(v["retryCount"], 0);
    }

    #[test]
    fn decodes_envelopes_written_elsewhere() {
        let raw = r#"{"byPid":12,"byTitle":"node","queueName":"q","date":1700000000000,"data":[1,"two",{"three":3}],"retryCount":0}"#;
        let env = Envelope::from_json(raw).unwrap();
        assert_eq!(env.by_pid, 12);
        assert_eq!(env.by_title, "node");
        assert_eq!(env.queue_name, "q");
        assert_eq!(env.date, 1_700_000_000_000);
        assert_eq!(env.data, json!([1, "two", {"three": 3}]));
        assert_eq!(env.retry_count, 0);
    }

    #[test]
    fn missing_data_decodes_as_null() {
        let raw = r#"{"byPid":1,"byTitle":"node","queueName":"q","date":1,"retryCount":0}"#;
        let env = Envelope::from_json(raw).unwrap();
        assert_eq!(env.data, Value::Null);
        assert_eq!(env.queue_name, "q");
    }

    #[test]
    fn diagnostic_fields_are_optional() {
        let env = Envelope::from_json(r#"{"queueName":"q","date":5,"data":"x"}"#).unwrap();
        assert_eq!(env.by_pid, 0);
        assert_eq!(env.by_title, "");
        assert_eq!(env.retry_count, 0);
        assert_eq!(env.data, json!("x"));
    }

    #[test]
    fn queue_name_and_date_are_required() {
        assert!(Envelope::from_json(r#"{"date":5,"data":1}"#).is_err());
        assert!(Envelope::from_json(r#"{"queueName":"q","data":1}"#).is_err());
    }

    #[test]
    fn date_is_close_to_now() {
        let before = now_millis();
        let env = Envelope::new("q", Value::Null);
        let after = now_millis();
        assert!(env.date >= before && env.date <= after);
    }
}
