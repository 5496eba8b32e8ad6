//! Falsification Tests: Category C - Sybil Resistance (F021-F030)
//!
//! # Toyota Way: Jidoka (自働化)
//! Every rejection is counted as blocked, and the tallies can never claim
//! more blocks than attempts.

use std::sync::Arc;

use ledgerload_core::{
    AdversarialConfig, ConnectionProvider, InMemoryLedger, RejectionKind, TransactionClient,
};
use ledgerload_test::{AdversarialRunner, AttackCategory, AttackRecord, ChaosBackend, ChaosConfig};
use tempfile::TempDir;

use super::common::{connector, open_ledger, write_msp};

async fn client(ledger: Arc<InMemoryLedger>, dir: &TempDir) -> Arc<dyn TransactionClient> {
    write_msp(dir.path());
    connector(ledger, dir.path(), "sybil").connect().await.unwrap()
}

// =============================================================================
// F021-F023: Scripted Categories
// =============================================================================

/// F021: Every cloned key is rejected
///
/// # Falsification Attempt
/// With rate limiting out of the way, only key reuse can stop the clones.
#[tokio::test]
async fn f021_clones_rejected_by_key_reuse() {
    let tmp = TempDir::new().unwrap();
    let client = client(open_ledger(), &tmp).await;

    let report = AdversarialRunner::new(client.as_ref(), AdversarialConfig::default())
        .run()
        .await;

    let type_b = &report.attacks.type_b;
    assert_eq!(type_b.attempted(), 3, "F021 FALSIFIED: clone attempts");
    assert_eq!(type_b.blocked(), 3, "F021 FALSIFIED: clone accepted");
    assert!(
        report
            .logs
            .iter()
            .filter(|l| l.kind == "TypeB")
            .all(|l| RejectionKind::classify(&l.message) == RejectionKind::DuplicateKey),
        "F021 FALSIFIED: clone blocked for another reason"
    );
}

/// F022: The first submission of a hash lands, the repeat is rejected
#[tokio::test]
async fn f022_duplicate_hash_rejected_once() {
    let tmp = TempDir::new().unwrap();
    let client = client(open_ledger(), &tmp).await;

    let report = AdversarialRunner::new(client.as_ref(), AdversarialConfig::default())
        .run()
        .await;

    let type_c = &report.attacks.type_c;
    assert_eq!(type_c.attempted(), 2, "F022 FALSIFIED: submissions");
    assert_eq!(type_c.blocked(), 1, "F022 FALSIFIED: duplicate handling");
    assert_eq!(report.performance.model_updates.len(), 2, "F022 FALSIFIED: latencies");
}

/// F023: Stock enrollment policy admits five of the burst of eight
#[tokio::test]
async fn f023_burst_rate_limited() {
    let tmp = TempDir::new().unwrap();
    let client = client(Arc::new(InMemoryLedger::default()), &tmp).await;

    let report = AdversarialRunner::new(client.as_ref(), AdversarialConfig::default())
        .run()
        .await;

    let type_a = &report.attacks.type_a;
    assert_eq!(type_a.attempted(), 8, "F023 FALSIFIED: burst size");
    assert_eq!(type_a.blocked(), 3, "F023 FALSIFIED: rate limit not applied");
    assert!(
        report
            .logs
            .iter()
            .filter(|l| l.kind == "TypeA")
            .all(|l| RejectionKind::classify(&l.message) == AttackCategory::IdentityMultiplication.expected_rejection()),
        "F023 FALSIFIED: burst blocked for another reason"
    );
}

// =============================================================================
// F024-F027: Tally Invariants
// =============================================================================

/// F024: blocked <= attempted and prevention rate in [0, 1]
#[tokio::test]
async fn f024_tally_bounds() {
    let tmp = TempDir::new().unwrap();
    let client = client(Arc::new(InMemoryLedger::default()), &tmp).await;

    let report = AdversarialRunner::new(client.as_ref(), AdversarialConfig::default())
        .run()
        .await;

    for category in AttackCategory::ALL {
        let record = report.attacks.get(category);
        assert!(
            record.blocked() <= record.attempted(),
            "F024 FALSIFIED: {} blocked exceeds attempted",
            category.name()
        );
    }
    assert!(
        (0.0..=1.0).contains(&report.summary.prevention_rate),
        "F024 FALSIFIED: prevention rate {}",
        report.summary.prevention_rate
    );
    assert_eq!(report.summary.total_attacks, 13, "F024 FALSIFIED: total attacks");
}

/// F025: A record claiming more blocks than attempts cannot be loaded
#[test]
fn f025_inconsistent_record_rejected() {
    let result: Result<AttackRecord, _> =
        serde_json::from_str(r#"{"name":"Collusion","attempted":1,"blocked":2}"#);
    assert!(result.is_err(), "F025 FALSIFIED: blocked > attempted accepted");
}

/// F026: No attempts gives a prevention rate of 0, not NaN
#[tokio::test]
async fn f026_empty_run_prevention_rate() {
    let tmp = TempDir::new().unwrap();
    let client = client(open_ledger(), &tmp).await;
    let config = AdversarialConfig {
        burst_size: 0,
        clone_attempts: 0,
        duplicate_submissions: 0,
        ..Default::default()
    };

    let report = AdversarialRunner::new(client.as_ref(), config).run().await;

    assert_eq!(report.summary.total_attacks, 0, "F026 FALSIFIED: attempts");
    assert_eq!(report.summary.prevention_rate, 0.0, "F026 FALSIFIED: rate");
    assert_eq!(report.summary.avg_enrollment_time, 0.0, "F026 FALSIFIED: mean");
}

/// F027: An unexpected rejection still counts as blocked, reason kept
#[tokio::test]
async fn f027_unexpected_rejection_counted() {
    let tmp = TempDir::new().unwrap();
    let failing = Arc::new(ChaosBackend::new(open_ledger(), ChaosConfig::errors(1.0)));
    write_msp(tmp.path());
    let client = connector(failing, tmp.path(), "sybil").connect().await.unwrap();

    let report = AdversarialRunner::new(client.as_ref(), AdversarialConfig::default())
        .run()
        .await;

    assert_eq!(report.summary.total_blocked, 13, "F027 FALSIFIED: rejection not blocked");
    assert_eq!(report.logs.len(), 13, "F027 FALSIFIED: reasons dropped");
    assert!(
        report
            .logs
            .iter()
            .all(|l| l.message.starts_with("chaos: injected failure")
                && RejectionKind::classify(&l.message) == RejectionKind::Other),
        "F027 FALSIFIED: reason rewritten"
    );
}
