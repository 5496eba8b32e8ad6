//! Reads one model update back from the ledger.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin query-model-hash -- <MODEL_HASH>
//! ```

use std::process::ExitCode;

use clap::Parser;
use ledgerload::prelude::*;
use ledgerload::runtime::{exit_code, init_tracing, open_backend};
use ledgerload_core::ModelUpdate;

#[derive(Parser)]
#[command(name = "query-model-hash")]
#[command(about = "Query a model update by its hash")]
struct Cli {
    /// Model hash to look up
    #[arg(value_name = "MODEL_HASH")]
    model_hash: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();
    exit_code(run(cli).await)
}

async fn run(cli: Cli) -> ledgerload_test::Result<()> {
    let config = HarnessConfig::discover()?;
    config.validate()?;

    let (_ledger, backend) = open_backend(&config)?;
    let client = GatewayConnector::from_config(backend, &config, config.publish.chaincode.clone())
        .connect()
        .await?;

    println!("Querying model hash: {}", cli.model_hash);
    let bytes = client
        .evaluate("ReadModelUpdate", &[cli.model_hash])
        .await
        .map_err(ledgerload_core::LedgerError::from)?;
    let update: ModelUpdate = serde_json::from_slice(&bytes)?;
    println!("Query result:\n{}", serde_json::to_string_pretty(&update)?);
    Ok(())
}
