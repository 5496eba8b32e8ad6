// Iron Lotus: Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # ledgerload-test
//!
//! Load orchestration, adversarial runs, statistics and reports for ledgerload.
//!
//! This crate provides:
//! - **Load testing**: `C` concurrent workers submitting model updates
//! - **Adversarial testing**: identity multiplication, credential cloning and collusion
//! - **Statistics**: throughput, latency percentiles and resource peaks
//! - **Chaos injection**: latency and errors in front of any gateway backend
//! - **Reports**: pretty-printed JSON artifacts
//!
//! ## Iron Lotus Framework
//!
//! - **Built-in Quality** (品質の作り込み): Quality cannot be inspected in
//! - **Popperian Falsification**: Tests designed to refute claims
//! - **Jidoka**: A failed transaction is a recorded result, never a crash
//!
//! ## Example
//!
//! ```rust,ignore
//! use ledgerload_test::{LoadOrchestrator, LoadTestReport, ReportWriter};
//!
//! let run = LoadOrchestrator::new(config.load.clone(), provider).run().await?;
//! let stats = run.statistics(config.load.bytes_per_transaction, host_memory_total());
//! println!("{stats}");
//! ReportWriter::new(&config.load.results_dir)
//!     .write_load(&LoadTestReport::new(&run, &config.load, stats))
//!     .await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod adversarial;
pub mod chaos;
pub mod error;
pub mod load;
pub mod report;
pub mod stats;

pub use adversarial::{
    AdversarialReport, AdversarialRunner, AttackCategory, AttackRecord, Attacks, LogEntry,
    Performance, Summary,
};
pub use chaos::{ChaosBackend, ChaosConfig, ChaosInjector};
pub use error::{Result, TestError};
pub use load::{LoadOrchestrator, LoadRun, RunContext};
pub use report::{
    LOAD_TEST_TYPE, LoadTestReport, ReportConfig, ReportWriter, SYBIL_RESULTS_FILE,
};
pub use stats::{AggregatedStatistics, RunTotals, aggregate, percentile};
