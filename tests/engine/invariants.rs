//! Run-level invariants under real contention
//!
//! Writers over overlapping value ranges collide on row locks; the
//! reference store breaks every blocked wait with a lock timeout.

use crate::common::*;
use contend::{generate_tasks, CounterSnapshot};
use std::time::Duration;

fn contended() -> RunConfig {
    fast_config()
        .with_rows(400)
        .with_tasks(24)
        .with_mix(WorkloadMix::range_writes_only())
}

fn contended_run(mode: OperatingMode) -> RunReport {
    let config = contended().with_mode(mode);
    let tasks = generate_tasks(&config).unwrap();
    Coordinator::new(table(400), config).unwrap().run(&tasks).unwrap()
}

#[test]
fn test_no_double_commit_fair() {
    let report = contended_run(OperatingMode::RetryWithFairness);
    assert!(report.all_finished());
    assert_no_double_commit(&report);
}

#[test]
fn test_no_double_commit_retry() {
    let report = contended_run(OperatingMode::Retry);
    assert!(report.all_finished());
    assert_no_double_commit(&report);
}

#[test]
fn test_completeness_in_abort_mode() {
    let report = contended_run(OperatingMode::AbortOnConflict);
    assert!(report.is_complete());
    assert_eq!(report.tasks_aborted, report.deadlock_count);
    assert!(report.max_retry_count <= 1);
    assert_no_double_commit(&report);
}

#[test]
fn test_max_retry_matches_records() {
    let report = contended_run(OperatingMode::RetryWithFairness);
    let max_tally = report
        .records
        .iter()
        .map(|r| r.retry.retry_count)
        .max()
        .unwrap_or(0);
    assert_eq!(report.max_retry_count, max_tally);

    let total: u64 = report.records.iter().map(|r| u64::from(r.retry.retry_count)).sum();
    assert_eq!(report.deadlock_count, total);
}

#[test]
fn test_counters_never_decrease() {
    let (store, plan) = faulty_table(100);
    plan.inject(FaultPoint::Commit, FaultTarget::Writers, 20, deadlock());
    let tasks: Vec<Task> = (1..=10).map(|i| point_write(i, &[i])).collect();
    let coordinator = Coordinator::new(store, fast_config().with_backoff_ms(2, 3)).unwrap();

    let handle = coordinator.spawn(&tasks).unwrap();
    let mut samples: Vec<CounterSnapshot> = Vec::new();
    while !handle.is_finished() {
        samples.push(handle.counters());
        std::thread::sleep(Duration::from_millis(1));
    }
    let report = handle.join().unwrap();

    for pair in samples.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        assert!(a.tasks_finished <= b.tasks_finished);
        assert!(a.deadlock_count <= b.deadlock_count);
        assert!(a.max_retry_count <= b.max_retry_count);
        assert!(a.tasks_aborted <= b.tasks_aborted);
    }
    assert!(report.all_finished());
    assert_eq!(report.deadlock_count, 20);
}
