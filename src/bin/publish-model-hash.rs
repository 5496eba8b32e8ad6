//! Publishes the latest trained model hash.
//!
//! Reads the last `nodeId,timestamp,modelHash` line of the hash log, submits
//! it with `CreateModelUpdate` and reads it back to verify.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin publish-model-hash
//! ```

use std::process::ExitCode;

use ledgerload::prelude::*;
use ledgerload::runtime::{exit_code, init_tracing, open_backend};
use ledgerload_core::{LedgerError, ModelUpdate};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    exit_code(run().await)
}

async fn run() -> ledgerload_test::Result<()> {
    let config = HarnessConfig::discover()?;
    config.validate()?;

    let entry = ModelHashEntry::read_last(&config.publish.hash_log).await?;
    tracing::info!(node_id = %entry.node_id, model_hash = %entry.model_hash, "latest model hash");

    let (ledger, backend) = open_backend(&config)?;
    let client = GatewayConnector::from_config(backend, &config, config.publish.chaincode.clone())
        .connect()
        .await?;

    println!("Submitting CreateModelUpdate transaction...");
    client
        .submit(
            "CreateModelUpdate",
            &[entry.model_hash.clone(), entry.timestamp.clone(), entry.node_id.clone()],
        )
        .await
        .map_err(LedgerError::from)?;
    println!("CreateModelUpdate transaction submitted.");
    ledger.persist()?;

    println!("Querying model update to verify...");
    let bytes = client
        .evaluate("ReadModelUpdate", &[entry.model_hash])
        .await
        .map_err(LedgerError::from)?;
    let update: ModelUpdate = serde_json::from_slice(&bytes)?;
    println!("Query result:\n{}", serde_json::to_string_pretty(&update)?);
    Ok(())
}
