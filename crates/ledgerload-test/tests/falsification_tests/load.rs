//! Falsification Tests: Category A - Load Orchestration (F001-F010)
//!
//! # Toyota Way: Heijunka (平準化)
//! Verify load is levelled across workers and every attempt is accounted for.

use std::collections::HashMap;
use std::sync::Arc;

use ledgerload_core::{
    CredentialStore, Deadlines, GatewayConnector, InMemoryLedger, LedgerConfig, Outcome,
};
use ledgerload_test::LoadOrchestrator;
use tempfile::TempDir;

use super::common::{connector, fast_load, open_ledger, write_msp};

// =============================================================================
// F001-F003: Work Partitioning
// =============================================================================

/// F001: N=1000, C=10 assigns exactly 100 per worker
#[test]
fn f001_even_partition() {
    let config = fast_load(1000, 10);
    for client_id in 0..10 {
        assert_eq!(
            config.assigned_to(client_id),
            100,
            "F001 FALSIFIED: worker {client_id} not assigned 100"
        );
    }
}

/// F002: Trailing workers get fewer, total never exceeds N
///
/// # Falsification Attempt
/// Try shapes where N is not a multiple of C, and where C > N.
#[test]
fn f002_uneven_partition_never_exceeds_total() {
    for (total, clients) in [(95, 10), (5, 10), (1001, 10), (7, 3), (0, 4)] {
        let config = fast_load(total, clients);
        let assigned: u32 = (0..clients).map(|id| config.assigned_to(id)).sum();
        assert_eq!(
            assigned, total,
            "F002 FALSIFIED: N={total} C={clients} assigned {assigned}"
        );
        assert!(
            (0..clients).all(|id| config.assigned_to(id) <= config.transactions_per_client()),
            "F002 FALSIFIED: a worker exceeds ceil(N/C)"
        );
    }
    assert_eq!(fast_load(95, 10).assigned_to(9), 5, "F002 FALSIFIED: last worker share");
}

/// F003: 1000 results after join
#[tokio::test]
async fn f003_every_transaction_recorded() {
    let tmp = TempDir::new().unwrap();
    write_msp(tmp.path());
    let ledger = open_ledger();

    let run = LoadOrchestrator::new(fast_load(1000, 10), connector(ledger.clone(), tmp.path(), "model"))
        .run()
        .await
        .unwrap();

    assert_eq!(run.results.len(), 1000, "F003 FALSIFIED: results lost or duplicated");
    assert_eq!(run.successful(), 1000, "F003 FALSIFIED: unexpected rejections");
    assert_eq!(
        ledger.model_update_count(),
        1000,
        "F003 FALSIFIED: payload hashes collided"
    );
}

// =============================================================================
// F004-F006: Result Attribution
// =============================================================================

/// F004: Each worker records exactly its assignment under its own id
#[tokio::test]
async fn f004_results_attributed_to_workers() {
    let tmp = TempDir::new().unwrap();
    write_msp(tmp.path());
    let config = fast_load(95, 10);

    let run = LoadOrchestrator::new(config.clone(), connector(open_ledger(), tmp.path(), "model"))
        .run()
        .await
        .unwrap();

    let mut per_client: HashMap<u32, u32> = HashMap::new();
    for result in &run.results {
        *per_client.entry(result.client_id).or_default() += 1;
    }
    for client_id in 0..10 {
        assert_eq!(
            per_client.get(&client_id).copied().unwrap_or(0),
            config.assigned_to(client_id),
            "F004 FALSIFIED: worker {client_id} count mismatch"
        );
    }
}

/// F005: Successful results carry the submitted hash and a latency
#[tokio::test]
async fn f005_success_carries_payload() {
    let tmp = TempDir::new().unwrap();
    write_msp(tmp.path());
    let ledger = open_ledger();

    let run = LoadOrchestrator::new(fast_load(20, 2), connector(ledger.clone(), tmp.path(), "model"))
        .run()
        .await
        .unwrap();

    for result in &run.results {
        let Outcome::Success { payload: Some(hash), .. } = &result.outcome else {
            panic!("F005 FALSIFIED: success without payload");
        };
        let update = ledger.model_update(hash).expect("F005 FALSIFIED: hash not on ledger");
        assert_eq!(
            update.node_id,
            format!("client_{}", result.client_id),
            "F005 FALSIFIED: node id does not name the worker"
        );
    }
}

// =============================================================================
// F006-F008: Failure Recording (Jidoka)
// =============================================================================

/// F006: Missing credentials fail each attempt without aborting the run
#[tokio::test]
async fn f006_missing_credentials_recorded() {
    let tmp = TempDir::new().unwrap();

    let run = LoadOrchestrator::new(fast_load(12, 3), connector(open_ledger(), tmp.path(), "model"))
        .run()
        .await
        .unwrap();

    assert_eq!(run.results.len(), 12, "F006 FALSIFIED: attempts dropped");
    assert!(
        run.results.iter().all(|r| matches!(
            &r.outcome,
            Outcome::Failure { reason } if reason.contains("credential not found")
        )),
        "F006 FALSIFIED: failure reason lost"
    );
    assert_eq!(run.total_bytes, 0, "F006 FALSIFIED: bytes counted for failures");
}

/// F007: Deadline expiry is a failed result, never a crash
#[tokio::test]
async fn f007_deadline_expiry_recorded() {
    let tmp = TempDir::new().unwrap();
    write_msp(tmp.path());
    let slow = Arc::new(InMemoryLedger::new(LedgerConfig {
        endorse_latency_ms: 200,
        ..Default::default()
    }));
    let provider = Arc::new(
        GatewayConnector::new(slow, CredentialStore::from_msp_dir("Org1MSP", tmp.path()), "model")
            .with_deadlines(Deadlines::uniform(20)),
    );

    let run = LoadOrchestrator::new(fast_load(4, 2), provider).run().await.unwrap();

    assert_eq!(run.results.len(), 4, "F007 FALSIFIED: attempts dropped");
    assert!(
        run.results.iter().all(|r| matches!(
            &r.outcome,
            Outcome::Failure { reason } if reason.starts_with("deadline exceeded during endorse")
        )),
        "F007 FALSIFIED: expiry not recorded as endorse deadline"
    );
}

/// F008: Bytes are counted once per committed transaction
#[tokio::test]
async fn f008_bytes_follow_successes() {
    let tmp = TempDir::new().unwrap();
    write_msp(tmp.path());
    let mut config = fast_load(30, 3);
    config.bytes_per_transaction = 1000;

    let run = LoadOrchestrator::new(config, connector(open_ledger(), tmp.path(), "model"))
        .run()
        .await
        .unwrap();

    assert_eq!(
        run.total_bytes,
        run.successful() as u64 * 1000,
        "F008 FALSIFIED: byte counter diverges from successes"
    );
}
