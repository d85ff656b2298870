//! Operating modes compared on a store that rejects a known number of
//! commits

use crate::common::*;

fn writers(n: u32) -> Vec<Task> {
    (1..=n).map(|i| point_write(i, &[i])).collect()
}

fn run_with(mode: OperatingMode, rejections: u32, tasks: &[Task]) -> RunReport {
    let (store, plan) = faulty_table(100);
    plan.inject(FaultPoint::Commit, FaultTarget::Writers, rejections, deadlock());
    let coordinator = Coordinator::new(store, fast_config().with_mode(mode).with_workers(2)).unwrap();
    coordinator.run(tasks).unwrap()
}

#[test]
fn test_abort_mode_aborts_on_first_conflict() {
    let report = run_with(OperatingMode::AbortOnConflict, 3, &writers(5));

    assert_eq!(report.deadlock_count, 3);
    assert_eq!(report.tasks_aborted, 3);
    assert_eq!(report.tasks_finished, 2);
    assert_eq!(report.max_retry_count, 1);
    assert!(report.is_complete());
    for record in &report.records {
        assert!(record.retry.retry_count <= 1);
        // No backoff wait was drawn
        assert_eq!(record.retry.last_delay, std::time::Duration::ZERO);
        if !record.is_finished() {
            assert_eq!(record.fate, TaskFate::Aborted(contend::AbortReason::Conflict));
        }
    }
    assert_no_double_commit(&report);
}

#[test]
fn test_retry_mode_finishes_everything() {
    let report = run_with(OperatingMode::Retry, 6, &writers(5));
    assert!(report.all_finished());
    assert_eq!(report.deadlock_count, 6);
    assert_eq!(report.mode, "retry");
    assert_no_double_commit(&report);
}

#[test]
fn test_fair_mode_finishes_everything() {
    let report = run_with(OperatingMode::RetryWithFairness, 6, &writers(5));
    assert!(report.all_finished());
    assert_eq!(report.deadlock_count, 6);
    let max_tally = report.records.iter().map(|r| r.retry.retry_count).max();
    assert_eq!(Some(report.max_retry_count), max_tally);
}

#[test]
fn test_retry_cap() {
    let (store, plan) = faulty_table(100);
    plan.inject(FaultPoint::Commit, FaultTarget::Modifier(1), 10, deadlock());
    let config = fast_config().with_max_retries(2).with_workers(1);
    let report = Coordinator::new(store, config).unwrap().run(&writers(2)).unwrap();

    assert_eq!(report.tasks_finished, 1);
    assert_eq!(report.records[0].fate, TaskFate::Aborted(contend::AbortReason::RetryCapReached));
    assert_eq!(report.records[0].retry.retry_count, 3);
    assert!(report.records[1].is_finished());
}

#[test]
fn test_fatal_failure_not_retried_and_not_a_deadlock() {
    let (store, plan) = faulty_table(100);
    plan.inject(
        FaultPoint::Execute,
        FaultTarget::Modifier(2),
        1,
        StoreError::fatal("connection reset"),
    );
    let report = Coordinator::new(store, fast_config())
        .unwrap()
        .run(&writers(4))
        .unwrap();

    assert_eq!(report.tasks_finished, 3);
    assert_eq!(report.tasks_aborted, 1);
    assert_eq!(report.fatal_failures, 1);
    assert_eq!(report.deadlock_count, 0);
    assert_eq!(report.records[1].fate, TaskFate::Aborted(contend::AbortReason::Fatal));
}
