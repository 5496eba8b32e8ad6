//! Falsification Tests: Category B - Statistics (F011-F020)
//!
//! # Toyota Way: Genchi Genbutsu (現地現物)
//! Figures must follow from the raw logs, including the degenerate ones.

use std::time::Duration;

use ledgerload_core::TransactionResult;
use ledgerload_test::{RunTotals, aggregate, percentile};
use proptest::prelude::*;

fn totals(duration: Duration, total_bytes: u64) -> RunTotals {
    RunTotals {
        duration,
        total_bytes,
        bytes_per_transaction: 512,
        memory_total: 0,
    }
}

fn successes(latencies: impl IntoIterator<Item = u64>) -> Vec<TransactionResult> {
    latencies
        .into_iter()
        .map(|l| TransactionResult::success(0, 0, l, None))
        .collect()
}

/// F011: p95 over [10..1000 step 10] is sorted index 95
#[test]
fn f011_p95_index() {
    let latencies: Vec<u64> = (1..=100).map(|i| i * 10).collect();
    assert_eq!(percentile(&latencies, 95), 960, "F011 FALSIFIED: wrong p95 index");

    let stats = aggregate(&successes(latencies.iter().rev().copied()), &[], totals(Duration::from_secs(1), 0));
    assert_eq!(stats.p95_latency_ms, 960, "F011 FALSIFIED: latencies not sorted first");
    assert_eq!(stats.p99_latency_ms, 1000, "F011 FALSIFIED: wrong p99 index");
}

/// F012: An out-of-range percentile resolves to 0
#[test]
fn f012_out_of_range_percentile_is_zero() {
    assert_eq!(percentile(&[], 99), 0, "F012 FALSIFIED: empty p99 not 0");
    assert_eq!(percentile(&[7], 100), 0, "F012 FALSIFIED: out-of-range clamped");
}

/// F013: Success rate is 100 with no failures and 0 with no successes
#[test]
fn f013_success_rate_extremes() {
    let all_ok = aggregate(&successes([5, 6, 7]), &[], totals(Duration::from_secs(1), 0));
    assert_eq!(all_ok.success_rate, 100.0, "F013 FALSIFIED: all-success rate");

    let all_failed: Vec<_> = (0..3).map(|_| TransactionResult::failure(0, 0, "no")).collect();
    let stats = aggregate(&all_failed, &[], totals(Duration::from_secs(1), 0));
    assert_eq!(stats.success_rate, 0.0, "F013 FALSIFIED: all-failure rate");
    assert_eq!(stats.average_latency_ms, 0.0, "F013 FALSIFIED: latency without successes");
}

/// F014: Nothing is NaN on an empty, instantaneous run
#[test]
fn f014_degenerate_run_has_no_nan() {
    let stats = aggregate(&[], &[], totals(Duration::ZERO, 0));
    for (name, value) in [
        ("successRate", stats.success_rate),
        ("throughput", stats.throughput),
        ("averageLatency", stats.average_latency_ms),
        ("cpuUsagePeak", stats.cpu_usage_peak),
        ("networkEfficiency", stats.network_efficiency),
        ("totalDataTransferMB", stats.total_data_transfer_mb),
    ] {
        assert_eq!(value, 0.0, "F014 FALSIFIED: {name} is {value}");
    }
}

/// F015: Network figures follow the byte counter
#[test]
fn f015_network_figures() {
    let stats = aggregate(&successes([1; 4]), &[], totals(Duration::from_secs(2), 2048));
    assert_eq!(stats.network_efficiency, 2.0, "F015 FALSIFIED: tx per KB");
    assert_eq!(stats.total_data_transfer_mb, 2048.0 / (1024.0 * 1024.0), "F015 FALSIFIED: MB");
    assert_eq!(stats.throughput, 2.0, "F015 FALSIFIED: throughput");
}

proptest! {
    /// F016: Success rate stays within [0, 100] for any outcome mix
    #[test]
    fn f016_success_rate_bounded(successes_n in 0usize..300, failures_n in 0usize..300) {
        let mut results = successes((0..successes_n as u64).map(|i| i % 97));
        results.extend((0..failures_n).map(|_| TransactionResult::failure(0, 0, "x")));

        let stats = aggregate(&results, &[], totals(Duration::from_millis(1500), 0));
        prop_assert!(
            (0.0..=100.0).contains(&stats.success_rate),
            "F016 FALSIFIED: success rate {}", stats.success_rate
        );
        prop_assert_eq!(stats.total_transactions, (successes_n + failures_n) as u64);
    }

    /// F017: p95 and p99 are drawn from the successful latencies
    #[test]
    fn f017_percentiles_are_observed_values(latencies in prop::collection::vec(0u64..5000, 1..200)) {
        let stats = aggregate(&successes(latencies.clone()), &[], totals(Duration::from_secs(1), 0));
        prop_assert!(latencies.contains(&stats.p95_latency_ms), "F017 FALSIFIED: p95 not observed");
        prop_assert!(latencies.contains(&stats.p99_latency_ms), "F017 FALSIFIED: p99 not observed");
    }
}
