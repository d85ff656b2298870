//! Stress Tests
//!
//! Heavy-workload runs. All marked #[ignore] for opt-in execution.
//! Run with: cargo test --test concurrency stress -- --ignored

use crate::common::*;
use contend::run;

/// Many workers, writers only, small table: constant collisions
#[test]
#[ignore]
fn stress_fair_mode_small_table() {
    let config = fast_config()
        .with_rows(200)
        .with_tasks(300)
        .with_workers(16)
        .with_mix(WorkloadMix::range_writes_only());
    let report = run(&config).unwrap();
    assert!(report.all_finished());
    assert_no_double_commit(&report);
}

/// Point writers over a handful of rows
#[test]
#[ignore]
fn stress_point_writers_hot_rows() {
    let config = fast_config()
        .with_rows(20)
        .with_tasks(500)
        .with_workers(8)
        .with_queries_per_task(4)
        .with_mix(WorkloadMix::mixed_point_writes());
    let report = run(&config).unwrap();
    assert!(report.all_finished());
    assert_no_double_commit(&report);
}
