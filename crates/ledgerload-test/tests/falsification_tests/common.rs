//! Shared fixtures: an in-process ledger behind a real gateway connector.

use std::path::Path;
use std::sync::Arc;

use ledgerload_core::{
    CredentialStore, GatewayBackend, GatewayConnector, InMemoryLedger, LedgerConfig, LoadConfig,
};

/// Writes a minimal MSP layout (one certificate, one key).
pub fn write_msp(dir: &Path) {
    std::fs::create_dir_all(dir.join("signcerts")).unwrap();
    std::fs::create_dir_all(dir.join("keystore")).unwrap();
    std::fs::write(dir.join("signcerts/User1@org1.example.com-cert.pem"), b"cert").unwrap();
    std::fs::write(dir.join("keystore/priv_sk"), b"key").unwrap();
}

/// Connector over a backend using the MSP under `dir`.
pub fn connector(backend: Arc<dyn GatewayBackend>, dir: &Path, chaincode: &str) -> Arc<GatewayConnector> {
    Arc::new(GatewayConnector::new(
        backend,
        CredentialStore::from_msp_dir("Org1MSP", dir),
        chaincode,
    ))
}

/// Ledger with enrollment limits out of the way.
pub fn open_ledger() -> Arc<InMemoryLedger> {
    Arc::new(InMemoryLedger::new(LedgerConfig {
        enroll_rate_limit: 1000,
        ..Default::default()
    }))
}

/// Load config with no pacing and no warm-up.
pub fn fast_load(total: u32, clients: u32) -> LoadConfig {
    LoadConfig {
        total_transactions: total,
        concurrent_clients: clients,
        think_time_ms: 0,
        measurement_interval_ms: 5,
        warmup_transactions: 0,
        ..Default::default()
    }
}
