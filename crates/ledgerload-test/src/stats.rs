//! Statistics aggregation over a finished load run.
//!
//! # Toyota Way: Genchi Genbutsu (現地現物)
//! Every figure is derived from the raw result and sample logs.
//!
//! Degenerate inputs (no results, no successes, no samples, zero duration,
//! no bytes) resolve to 0, never NaN.

use std::fmt;
use std::time::Duration;

use ledgerload_core::{Outcome, ResourceSample, TransactionResult};
use serde::{Deserialize, Serialize};

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Figures derived once after all workers finish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedStatistics {
    /// Measured transactions.
    pub total_transactions: u64,
    /// Percentage of committed transactions, in `[0, 100]`.
    pub success_rate: f64,
    /// Transactions per second over the run.
    pub throughput: f64,
    /// Mean latency of committed transactions.
    pub average_latency_ms: f64,
    /// 95th percentile latency of committed transactions.
    pub p95_latency_ms: u64,
    /// 99th percentile latency of committed transactions.
    pub p99_latency_ms: u64,
    /// Highest sampled CPU percentage.
    pub cpu_usage_peak: f64,
    /// Highest sampled host memory in use, in bytes.
    pub memory_usage_peak: u64,
    /// Host memory total at aggregation time, in bytes.
    pub memory_total: u64,
    /// Assumed payload per transaction, in KiB.
    pub storage_per_transaction_kb: f64,
    /// Transactions per KiB transferred.
    pub network_efficiency: f64,
    /// Total bytes transferred, in MiB.
    #[serde(rename = "totalDataTransferMB")]
    pub total_data_transfer_mb: f64,
}

/// Raw inputs of one aggregation.
#[derive(Debug, Clone, Copy)]
pub struct RunTotals {
    /// Wall-clock duration of the measured run.
    pub duration: Duration,
    /// Cumulative bytes counted by the workers.
    pub total_bytes: u64,
    /// Assumed bytes per successful transaction.
    pub bytes_per_transaction: u64,
    /// Host memory total.
    pub memory_total: u64,
}

/// Element at `floor(len * percent / 100)` of an ascending slice, or 0 when
/// that index is out of range.
#[must_use]
pub fn percentile(sorted: &[u64], percent: usize) -> u64 {
    sorted.get(sorted.len() * percent / 100).copied().unwrap_or(0)
}

/// Aggregates a finished run.
#[must_use]
pub fn aggregate(
    results: &[TransactionResult],
    samples: &[ResourceSample],
    totals: RunTotals,
) -> AggregatedStatistics {
    let total = results.len() as u64;

    let mut latencies: Vec<u64> = results
        .iter()
        .filter_map(|r| match r.outcome {
            Outcome::Success { latency_ms, .. } => Some(latency_ms),
            Outcome::Failure { .. } => None,
        })
        .collect();
    latencies.sort_unstable();
    let successful = latencies.len() as u64;

    let success_rate = if total > 0 {
        100.0 * successful as f64 / total as f64
    } else {
        0.0
    };

    let seconds = totals.duration.as_secs_f64();
    let throughput = if seconds > 0.0 {
        total as f64 / seconds
    } else {
        0.0
    };

    let average_latency_ms = if latencies.is_empty() {
        0.0
    } else {
        latencies.iter().sum::<u64>() as f64 / latencies.len() as f64
    };

    let cpu_usage_peak = samples
        .iter()
        .map(|s| s.cpu_percent)
        .fold(0.0_f64, f64::max);
    let memory_usage_peak = samples.iter().map(|s| s.mem_used_bytes).max().unwrap_or(0);

    let network_efficiency = if totals.total_bytes > 0 {
        total as f64 / (totals.total_bytes as f64 / KIB)
    } else {
        0.0
    };

    AggregatedStatistics {
        total_transactions: total,
        success_rate,
        throughput,
        average_latency_ms,
        p95_latency_ms: percentile(&latencies, 95),
        p99_latency_ms: percentile(&latencies, 99),
        cpu_usage_peak,
        memory_usage_peak,
        memory_total: totals.memory_total,
        storage_per_transaction_kb: totals.bytes_per_transaction as f64 / KIB,
        network_efficiency,
        total_data_transfer_mb: totals.total_bytes as f64 / MIB,
    }
}

impl AggregatedStatistics {
    /// Peak memory as a percentage of host memory, 0 when the total is unknown.
    #[must_use]
    pub fn memory_usage_percent(&self) -> f64 {
        if self.memory_total > 0 {
            100.0 * self.memory_usage_peak as f64 / self.memory_total as f64
        } else {
            0.0
        }
    }
}

impl fmt::Display for AggregatedStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "LEDGER PERFORMANCE RESULTS")?;
        writeln!(f)?;
        writeln!(f, "Transaction Performance:")?;
        writeln!(f, "   Total Transactions: {}", self.total_transactions)?;
        writeln!(f, "   Success Rate: {:.1}%", self.success_rate)?;
        writeln!(f, "   Throughput: {:.2} TPS", self.throughput)?;
        writeln!(f, "   Average Latency: {:.0}ms", self.average_latency_ms)?;
        writeln!(f, "   P95 Latency: {}ms", self.p95_latency_ms)?;
        writeln!(f, "   P99 Latency: {}ms", self.p99_latency_ms)?;
        writeln!(f)?;
        writeln!(f, "Resource Utilization:")?;
        writeln!(f, "   CPU Usage (peak): {:.1}%", self.cpu_usage_peak)?;
        writeln!(
            f,
            "   Memory Usage: {:.2} GB ({:.0}%)",
            self.memory_usage_peak as f64 / GIB,
            self.memory_usage_percent()
        )?;
        writeln!(f, "   Storage per Transaction: {} KB", self.storage_per_transaction_kb)?;
        writeln!(f, "   Network Efficiency: {:.2} txns/KB", self.network_efficiency)?;
        write!(f, "   Total Data Transfer: {:.2} MB", self.total_data_transfer_mb)
    }
}
