//! ledgerload: Load and Sybil-Resistance Harness for Permissioned Ledgers
//!
//! Drives a ledger gateway with concurrent load, replays scripted Sybil
//! attack sequences against its enrollment and model-update contracts, and
//! writes JSON reports of what it measured.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ledgerload::prelude::*;
//!
//! # async fn demo() -> ledgerload_test::Result<()> {
//! let config = HarnessConfig::discover()?;
//! let (ledger, backend) = ledgerload::runtime::open_backend(&config)?;
//! let provider = Arc::new(GatewayConnector::from_config(backend, &config, config.load.chaincode.clone()));
//! let run = LoadOrchestrator::new(config.load.clone(), provider).run().await?;
//! println!("{}", run.statistics(config.load.bytes_per_transaction, host_memory_total()));
//! ledger.persist()?;
//! # Ok(())
//! # }
//! ```

// Iron Lotus: Allow unwrap/expect in tests (Toyota Way: tests should fail fast)
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub use ledgerload_core as core;
pub use ledgerload_observe as observe;
pub use ledgerload_test as harness;

pub mod runtime;

/// Prelude module for common imports.
pub mod prelude {
    pub use std::sync::Arc;

    pub use ledgerload_core::{
        ConnectionProvider, GatewayBackend, GatewayConnector, HarnessConfig, InMemoryLedger,
        ModelHashEntry, TransactionClient,
    };
    pub use ledgerload_observe::host_memory_total;
    pub use ledgerload_test::{
        AdversarialReport, AdversarialRunner, ChaosBackend, LoadOrchestrator, LoadTestReport,
        ReportWriter,
    };
}
