//! Resource scale test.
//!
//! Runs `N` `CreateModelUpdate` transactions across `C` workers, samples host
//! resources while they run, prints the aggregate and writes a
//! `scale_test_summary_<timestamp>.json` report.
//!
//! # Usage
//!
//! ```bash
//! LEDGERLOAD_CONFIG=ledgerload.toml cargo run --bin load-test
//! ```

use std::process::ExitCode;

use ledgerload::prelude::*;
use ledgerload::runtime::{exit_code, init_tracing, open_backend};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    exit_code(run().await)
}

async fn run() -> ledgerload_test::Result<()> {
    let config = HarnessConfig::discover()?;
    config.validate()?;

    let load = &config.load;
    println!("=== Resource Scale Test ===");
    println!(
        "Transactions: {}, clients: {}, warm-up: {}",
        load.total_transactions, load.concurrent_clients, load.warmup_transactions
    );

    let (ledger, backend) = open_backend(&config)?;
    let provider = Arc::new(GatewayConnector::from_config(backend, &config, load.chaincode.clone()));

    let run = LoadOrchestrator::new(load.clone(), provider).run().await?;
    let statistics = run.statistics(load.bytes_per_transaction, host_memory_total());

    println!();
    println!("{statistics}");
    println!();

    let report = LoadTestReport::new(&run, load, statistics);
    let path = ReportWriter::new(&load.results_dir).write_load(&report).await?;
    println!("Results saved to: {}", path.display());

    ledger.persist()?;
    Ok(())
}
