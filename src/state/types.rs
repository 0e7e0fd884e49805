//! Processing log type definitions
//!
//! Defines the durable outcome record kept for every audio file the operator
//! has decided on.

use serde::{Deserialize, Serialize};

/// Outcome of an operator decision on a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    /// Annotation was delivered to the sink
    Processed,
    /// File was passed over without an annotation
    Skipped,
}

impl LogStatus {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Processed => "processed",
            LogStatus::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for LogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Durable outcome marker for one file, keyed by `file`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// File path (unique key)
    pub file: String,
    /// Decision taken
    pub status: LogStatus,
    /// Timestamp (milliseconds since epoch)
    pub created_at: i64,
}

impl LogRecord {
    /// Create a record stamped with the current wall-clock time
    pub fn now(file: impl Into<String>, status: LogStatus) -> Self {
        Self {
            file: file.into(),
            status,
            created_at: now_ms(),
        }
    }
}

/// Current time in milliseconds since epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Ordering key for the `createdAt` index.
///
/// Big-endian `createdAt` with the sign bit flipped (so negative timestamps
/// still sort before positive ones) followed by a big-endian insertion
/// sequence number that breaks ties in physical write order.
pub fn created_at_key(created_at: i64, seq: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    let ordered = (created_at as u64) ^ (1u64 << 63);
    key[..8].copy_from_slice(&ordered.to_be_bytes());
    key[8..].copy_from_slice(&seq.to_be_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_camel_case() {
        let record = LogRecord {
            file: "/music/a.mp3".to_string(),
            status: LogStatus::Skipped,
            created_at: 42,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"file":"/music/a.mp3","status":"skipped","createdAt":42}"#
        );
    }

    #[test]
    fn test_created_at_key_orders_by_time_then_sequence() {
        assert!(created_at_key(-5, 9) < created_at_key(3, 0));
        assert!(created_at_key(3, 0) < created_at_key(3, 1));
        assert!(created_at_key(3, u64::MAX) < created_at_key(4, 0));
    }
}
