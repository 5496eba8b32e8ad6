//! Report persistence.
//!
//! Reports are written once, at run end, as one pretty-printed JSON document.
//! Callers display statistics before writing, so a failed write never hides
//! the measurement.

use std::path::{Path, PathBuf};

use ledgerload_core::{LoadConfig, ResourceSample, TransactionResult};
use serde::{Deserialize, Serialize};

use crate::adversarial::AdversarialReport;
use crate::error::{Result, TestError};
use crate::load::LoadRun;
use crate::stats::AggregatedStatistics;

/// Test type tag of load reports.
pub const LOAD_TEST_TYPE: &str = "RESOURCE_SCALE_TEST";

/// File name of adversarial reports.
pub const SYBIL_RESULTS_FILE: &str = "sybil-results.json";

/// Run configuration echoed into the load report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    /// `N`.
    pub total_transactions: u32,
    /// `C`.
    pub concurrent_clients: u32,
    /// Sampler period.
    pub measurement_interval_ms: u64,
    /// Unmeasured warm-up transactions.
    pub warmup_transactions: u32,
}

impl From<&LoadConfig> for ReportConfig {
    fn from(config: &LoadConfig) -> Self {
        Self {
            total_transactions: config.total_transactions,
            concurrent_clients: config.concurrent_clients,
            measurement_interval_ms: config.measurement_interval_ms,
            warmup_transactions: config.warmup_transactions,
        }
    }
}

/// Persisted load report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadTestReport {
    /// Always [`LOAD_TEST_TYPE`].
    pub test_type: String,
    /// RFC 3339 start of the run.
    pub timestamp: String,
    /// Run configuration.
    pub config: ReportConfig,
    /// Duration in seconds.
    pub duration: f64,
    /// Measured transactions.
    pub total_transactions: u64,
    /// Committed transactions.
    pub successful_transactions: u64,
    /// Transactions per second.
    pub throughput: f64,
    /// Mean latency of committed transactions, in milliseconds.
    pub average_latency: f64,
    /// Assumed payload per transaction.
    pub bytes_per_transaction: u64,
    /// Full aggregate.
    pub statistics: AggregatedStatistics,
    /// Sampler log.
    pub resource_metrics: Vec<ResourceSample>,
    /// Per-transaction log.
    pub results: Vec<TransactionResult>,
}

impl LoadTestReport {
    /// Assembles a report from a finished run.
    #[must_use]
    pub fn new(run: &LoadRun, config: &LoadConfig, statistics: AggregatedStatistics) -> Self {
        Self {
            test_type: LOAD_TEST_TYPE.to_string(),
            timestamp: run.started_at.clone(),
            config: ReportConfig::from(config),
            duration: run.duration.as_secs_f64(),
            total_transactions: statistics.total_transactions,
            successful_transactions: run.successful() as u64,
            throughput: statistics.throughput,
            average_latency: statistics.average_latency_ms,
            bytes_per_transaction: config.bytes_per_transaction,
            statistics,
            resource_metrics: run.samples.clone(),
            results: run.results.clone(),
        }
    }

    /// `scale_test_summary_<timestamp>.json`, with `:` and `.` replaced by `-`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("scale_test_summary_{}.json", self.timestamp.replace([':', '.'], "-"))
    }
}

/// Writes reports into one directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    /// Creates a writer for a destination directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Destination directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Serializes `report` to `<dir>/<file_name>`, creating the directory if
    /// needed, and returns the path.
    ///
    /// # Errors
    /// Returns an error if the directory or file cannot be written.
    pub async fn write<T: Serialize + Sync>(&self, file_name: &str, report: &T) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(report)?;

        if !self.dir.as_os_str().is_empty() {
            tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
                TestError::report(format!("cannot create {}: {e}", self.dir.display()))
            })?;
        }

        let path = self.dir.join(file_name);
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| TestError::report(format!("cannot write {}: {e}", path.display())))?;

        tracing::info!(path = %path.display(), "results saved");
        Ok(path)
    }

    /// Writes a load report under its timestamped name.
    ///
    /// # Errors
    /// Returns an error if the report cannot be written.
    pub async fn write_load(&self, report: &LoadTestReport) -> Result<PathBuf> {
        self.write(&report.file_name(), report).await
    }

    /// Writes an adversarial report to [`SYBIL_RESULTS_FILE`].
    ///
    /// # Errors
    /// Returns an error if the report cannot be written.
    pub async fn write_adversarial(&self, report: &AdversarialReport) -> Result<PathBuf> {
        self.write(SYBIL_RESULTS_FILE, report).await
    }
}
