//! Core data model shared by the load generator and the adversarial runner.
//!
//! Per Iron Lotus Framework: explicit variants instead of ad hoc shapes, so
//! aggregation and classification consume every outcome the same way.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Result of one transaction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The gateway reported commit.
    Success {
        /// Wall-clock latency of the submit in milliseconds.
        latency_ms: u64,
        /// Payload the transaction carried (the content hash).
        payload: Option<String>,
    },
    /// The attempt failed locally or was rejected remotely.
    Failure {
        /// Verbatim failure reason.
        reason: String,
    },
}

impl Outcome {
    /// Returns true for [`Outcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the latency of a successful outcome.
    #[must_use]
    pub const fn latency_ms(&self) -> Option<u64> {
        match self {
            Self::Success { latency_ms, .. } => Some(*latency_ms),
            Self::Failure { .. } => None,
        }
    }
}

/// One entry of the append-only result log.
///
/// Serialized in the flat shape the scale-test reports have always used:
/// `{success, latency, timestamp, clientId, modelHash?, error?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "TransactionRecord", from = "TransactionRecord")]
pub struct TransactionResult {
    /// What happened.
    pub outcome: Outcome,
    /// Start of the attempt, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    /// Worker that issued the transaction.
    pub client_id: u32,
}

impl TransactionResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(client_id: u32, timestamp_ms: u64, latency_ms: u64, payload: Option<String>) -> Self {
        Self {
            outcome: Outcome::Success {
                latency_ms,
                payload,
            },
            timestamp_ms,
            client_id,
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failure(client_id: u32, timestamp_ms: u64, reason: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Failure {
                reason: reason.into(),
            },
            timestamp_ms,
            client_id,
        }
    }

    /// Returns true if the transaction committed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionRecord {
    success: bool,
    latency: u64,
    timestamp: u64,
    client_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<TransactionResult> for TransactionRecord {
    fn from(result: TransactionResult) -> Self {
        let (success, latency, model_hash, error) = match result.outcome {
            Outcome::Success {
                latency_ms,
                payload,
            } => (true, latency_ms, payload, None),
            Outcome::Failure { reason } => (false, 0, None, Some(reason)),
        };
        Self {
            success,
            latency,
            timestamp: result.timestamp_ms,
            client_id: result.client_id,
            model_hash,
            error,
        }
    }
}

impl From<TransactionRecord> for TransactionResult {
    fn from(record: TransactionRecord) -> Self {
        let outcome = if record.success {
            Outcome::Success {
                latency_ms: record.latency,
                payload: record.model_hash,
            }
        } else {
            Outcome::Failure {
                reason: record.error.unwrap_or_default(),
            }
        };
        Self {
            outcome,
            timestamp_ms: record.timestamp,
            client_id: record.client_id,
        }
    }
}

/// Snapshot taken by the resource sampler on each tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSample {
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "timestamp")]
    pub timestamp_ms: u64,
    /// Approximate CPU usage percentage.
    #[serde(rename = "cpuUsage")]
    pub cpu_percent: f64,
    /// Host memory in use, in bytes.
    #[serde(rename = "memoryUsage")]
    pub mem_used_bytes: u64,
    /// Host memory total, in bytes.
    #[serde(rename = "memoryTotal")]
    pub mem_total_bytes: u64,
    /// Cumulative bytes sent by the workers.
    #[serde(rename = "networkBytesSent")]
    pub cumulative_bytes_sent: u64,
    /// Cumulative bytes received by the workers.
    #[serde(rename = "networkBytesReceived")]
    pub cumulative_bytes_received: u64,
}

/// Cumulative byte counter fed by workers and read by the sampler.
///
/// Cheap to clone; all clones share one atomic.
#[derive(Debug, Clone, Default)]
pub struct TransferCounter {
    bytes: Arc<AtomicU64>,
}

impl TransferCounter {
    /// Creates a zeroed counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds transferred bytes.
    pub fn add(&self, bytes: u64) {
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Returns the cumulative byte count.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}

/// Milliseconds since the Unix epoch.
#[must_use]
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Current time as an RFC 3339 timestamp with millisecond precision.
#[must_use]
pub fn rfc3339_now() -> String {
    humantime::format_rfc3339_millis(SystemTime::now()).to_string()
}
