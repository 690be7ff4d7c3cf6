//! The uniform `{code, msg, time, data}` response wrapper.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Message used when a failure envelope carries no message of its own.
pub const DEFAULT_FAILURE_MESSAGE: &str = "unknown remote error";

/// Response envelope returned by every remote endpoint.
///
/// `code == 1` is success with `data` populated, `code == 0` is a failure
/// described by `msg`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, deserialize_with = "lenient_code")]
    pub code: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub msg: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub time: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn is_success(&self) -> bool {
        self.code == 1
    }

    /// The server's message, or a generic one when it sent none.
    pub fn failure_message(&self) -> &str {
        if self.msg.trim().is_empty() {
            DEFAULT_FAILURE_MESSAGE
        } else {
            &self.msg
        }
    }
}

/// Coerce a remote identifier to its canonical decimal string.
///
/// Accepts a non-empty string as-is, a positive integer, or a float whose
/// truncation is positive. Anything else (including zero) is not an id.
pub fn coerce_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                (i > 0).then(|| i.to_string())
            } else if let Some(u) = n.as_u64() {
                (u > 0).then(|| u.to_string())
            } else {
                let truncated = n.as_f64()?.trunc();
                (truncated >= 1.0 && truncated < i64::MAX as f64)
                    .then(|| (truncated as i64).to_string())
            }
        }
        _ => None,
    }
}

fn lenient_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        Value::Bool(b) => i64::from(b),
        _ => 0,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}
