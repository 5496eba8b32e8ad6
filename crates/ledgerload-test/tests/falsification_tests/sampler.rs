//! Falsification Tests: Category E - Resource Sampling (F036-F040)
//!
//! # Toyota Way: Genchi Genbutsu (現地現物)
//! Samples describe the measured run and nothing after it.

use std::sync::Arc;

use ledgerload_core::{InMemoryLedger, LedgerConfig, epoch_millis};
use ledgerload_test::{LoadOrchestrator, LoadRun};
use tempfile::TempDir;

use super::common::{connector, fast_load, write_msp};

async fn sampled_run() -> LoadRun {
    let tmp = TempDir::new().unwrap();
    write_msp(tmp.path());
    let ledger = Arc::new(InMemoryLedger::new(LedgerConfig {
        commit_latency_ms: 2,
        ..Default::default()
    }));

    LoadOrchestrator::new(fast_load(60, 3), connector(ledger, tmp.path(), "model"))
        .run()
        .await
        .unwrap()
}

/// F036: No sample is taken after the workers have been joined
#[tokio::test]
async fn f036_no_sample_after_join() {
    let run = sampled_run().await;
    let joined = epoch_millis();

    assert!(
        run.samples.iter().all(|s| s.timestamp_ms <= joined),
        "F036 FALSIFIED: sample after join"
    );
}

/// F037: The sampler runs during the measured window
#[tokio::test]
async fn f037_samples_collected() {
    let run = sampled_run().await;
    assert!(!run.samples.is_empty(), "F037 FALSIFIED: sampler never ticked");
}

/// F038: Sample timestamps and byte counters never go backwards
#[tokio::test]
async fn f038_samples_monotonic() {
    let run = sampled_run().await;

    for pair in run.samples.windows(2) {
        assert!(
            pair[0].timestamp_ms <= pair[1].timestamp_ms,
            "F038 FALSIFIED: timestamps out of order"
        );
        assert!(
            pair[0].cumulative_bytes_sent <= pair[1].cumulative_bytes_sent,
            "F038 FALSIFIED: byte counter decreased"
        );
    }
    assert!(
        run.samples.iter().all(|s| s.cumulative_bytes_sent <= run.total_bytes),
        "F038 FALSIFIED: sample counted bytes never sent"
    );
}
