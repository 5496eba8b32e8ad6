//! Falsification Tests: Category D - Report Persistence (F031-F035)
//!
//! # Toyota Way: Standardized Work
//! A persisted report reads back exactly as it was written.

use ledgerload_core::{AdversarialConfig, ConnectionProvider};
use ledgerload_test::{
    AdversarialReport, AdversarialRunner, LoadOrchestrator, LoadTestReport, ReportWriter,
    SYBIL_RESULTS_FILE, TestError,
};
use tempfile::TempDir;

use super::common::{connector, fast_load, open_ledger, write_msp};

/// F031: A load report round-trips with numbers and order intact
#[tokio::test]
async fn f031_load_report_round_trip() {
    let tmp = TempDir::new().unwrap();
    write_msp(tmp.path());
    let config = fast_load(40, 4);

    let run = LoadOrchestrator::new(config.clone(), connector(open_ledger(), tmp.path(), "model"))
        .run()
        .await
        .unwrap();
    let stats = run.statistics(config.bytes_per_transaction, 8 << 30);
    let report = LoadTestReport::new(&run, &config, stats);

    let path = ReportWriter::new(tmp.path().join("scale_test_results"))
        .write_load(&report)
        .await
        .unwrap();
    let back: LoadTestReport =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

    assert_eq!(back, report, "F031 FALSIFIED: report changed on disk");
    assert_eq!(back.results.len(), 40, "F031 FALSIFIED: results truncated");
    assert!(
        back.results
            .iter()
            .zip(&report.results)
            .all(|(a, b)| a.timestamp_ms == b.timestamp_ms && a.client_id == b.client_id),
        "F031 FALSIFIED: result order changed"
    );
}

/// F032: An adversarial report lands under its fixed name and reads back
#[tokio::test]
async fn f032_adversarial_report_round_trip() {
    let tmp = TempDir::new().unwrap();
    write_msp(tmp.path());
    let client = connector(open_ledger(), tmp.path(), "sybil").connect().await.unwrap();
    let report = AdversarialRunner::new(client.as_ref(), AdversarialConfig::default())
        .with_test_id(7)
        .run()
        .await;

    let path = ReportWriter::new(tmp.path().join("results"))
        .write_adversarial(&report)
        .await
        .unwrap();
    assert!(path.ends_with(SYBIL_RESULTS_FILE), "F032 FALSIFIED: file name");

    let back: AdversarialReport =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(back, report, "F032 FALSIFIED: report changed on disk");
}

/// F033: File names carry no `:` or `.` before the extension
#[test]
fn f033_load_report_file_name() {
    let run = ledgerload_test::LoadRun {
        started_at: "2025-01-02T03:04:05.678Z".to_string(),
        duration: std::time::Duration::from_secs(1),
        results: Vec::new(),
        samples: Vec::new(),
        total_bytes: 0,
    };
    let config = fast_load(0, 1);
    let report = LoadTestReport::new(&run, &config, run.statistics(512, 0));

    let name = report.file_name();
    assert_eq!(
        name, "scale_test_summary_2025-01-02T03-04-05-678Z.json",
        "F033 FALSIFIED: file name {name}"
    );
    assert_eq!(report.timestamp, run.started_at, "F033 FALSIFIED: timestamp rewritten");
}

/// F034: A write failure is an error, not a panic
#[test]
fn f034_unwritable_destination() {
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("not-a-dir");
    std::fs::write(&blocker, b"x").unwrap();

    let result = tokio_test::block_on(
        ReportWriter::new(&blocker).write("r.json", &serde_json::json!({"ok": true})),
    );
    assert!(
        matches!(result, Err(TestError::Report(_))),
        "F034 FALSIFIED: write into a file path succeeded"
    );
}
