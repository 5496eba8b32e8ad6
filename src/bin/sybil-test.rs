//! Sybil resistance test.
//!
//! Replays identity multiplication, credential cloning and collusion
//! attempts through one client and writes `sybil-results.json`.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin sybil-test
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

    let adversarial = &config.adversarial;
    let (ledger, backend) = open_backend(&config)?;
    let client = GatewayConnector::from_config(backend, &config, adversarial.chaincode.clone())
        .connect()
        .await?;

    println!("=== Sybil Resistance Test ===");
    let report = AdversarialRunner::new(client.as_ref(), adversarial.clone()).run().await;

    println!();
    println!("{report}");
    println!();

    let path = ReportWriter::new(&adversarial.results_dir)
        .write_adversarial(&report)
        .await?;
    println!("Results saved to: {}", path.display());

    ledger.persist()?;
    Ok(())
}
