//! Sample decoder
//!
//! Parses one newline-delimited JSON record into a [`VibrationSample`].
//! Producers send objects such as:
//!
//! ```text
//! {"x": 0.012, "y": -0.004, "z": 0.981, "timestamp": 1705564800.25}
//! ```
//!
//! `x`, `y` and `z` are required and must be JSON numbers. `timestamp` is
//! optional; any other field is ignored.

use serde::Deserialize;
use thiserror::Error;

use crate::types::{SampleTimestamp, VibrationSample};

/// Longest slice of a rejected message kept in the error, in characters.
const MAX_ECHOED_MESSAGE_CHARS: usize = 256;

/// A single inbound message could not be turned into a sample.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid sample message ({reason}): {message}")]
pub struct DecodeError {
    /// The offending message (truncated for very long inputs)
    pub message: String,
    /// Diagnostic from the JSON parser
    pub reason: String,
}

impl DecodeError {
    fn new(message: &str, reason: impl Into<String>) -> Self {
        let message = if message.chars().count() > MAX_ECHOED_MESSAGE_CHARS {
            let mut truncated: String = message.chars().take(MAX_ECHOED_MESSAGE_CHARS).collect();
            truncated.push('…');
            truncated
        } else {
            message.to_string()
        };
        Self {
            message,
            reason: reason.into(),
        }
    }
}

/// Wire shape of a sample record.
#[derive(Debug, Deserialize)]
struct JsonSample {
    x: f64,
    y: f64,
    z: f64,
    #[serde(default)]
    timestamp: Option<serde_json::Value>,
}

/// Decode one message into a sample.
pub fn decode(message: &str) -> Result<VibrationSample, DecodeError> {
    let value: serde_json::Value = serde_json::from_str(message.trim())
        .map_err(|e| DecodeError::new(message, e.to_string()))?;

    // serde accepts `[x, y, z]` for structs; only objects are records here.
    if !value.is_object() {
        return Err(DecodeError::new(message, "expected a JSON object"));
    }

    let raw: JsonSample =
        serde_json::from_value(value).map_err(|e| DecodeError::new(message, e.to_string()))?;

    let timestamp = match raw.timestamp {
        Some(serde_json::Value::Number(n)) => n.as_f64().map(SampleTimestamp::Unix),
        Some(serde_json::Value::String(s)) => Some(SampleTimestamp::Text(s)),
        Some(other) => {
            tracing::debug!(timestamp = %other, "Ignoring unsupported timestamp type");
            None
        }
        None => None,
    };

    Ok(VibrationSample {
        x: raw.x,
        y: raw.y,
        z: raw.z,
        timestamp,
    })
}

/// Encode a sample as one JSON record (no trailing newline).
pub fn encode(sample: &VibrationSample) -> String {
    // Non-finite axes serialize as null and are rejected on decode.
    serde_json::to_string(sample).unwrap_or_else(|_| String::from("{}"))
}
