//! Run control: interrupting backoff waits and stopping a run

use crate::common::*;
use contend::AbortReason;
use std::time::{Duration, Instant};

/// Backoff long enough that only an interrupt or stop ends it in time
fn sleepy() -> RunConfig {
    fast_config().with_backoff_ms(60_000, 0).with_workers(2)
}

#[test]
fn test_interrupted_backoff_retries_immediately() {
    let (store, plan) = faulty_table(100);
    plan.inject(FaultPoint::Commit, FaultTarget::Modifier(1), 1, deadlock());
    let coordinator = Coordinator::new(store, sleepy()).unwrap();

    let started = Instant::now();
    let handle = coordinator.spawn(&[point_write(1, &[1])]).unwrap();
    assert!(wait_until(Duration::from_secs(10), || handle.counters().deadlock_count == 1));
    handle.interrupt_workers();
    let report = handle.join().unwrap();

    assert!(started.elapsed() < Duration::from_secs(30));
    assert!(report.all_finished());
    assert_eq!(report.interrupted_waits, 1);
    assert_eq!(report.records[0].retry.retry_count, 1);
}

#[test]
fn test_interrupt_status_sticks_for_the_task() {
    let (store, plan) = faulty_table(100);
    plan.inject(FaultPoint::Commit, FaultTarget::Modifier(1), 3, deadlock());
    let coordinator = Coordinator::new(store, sleepy()).unwrap();

    let handle = coordinator.spawn(&[point_write(1, &[1])]).unwrap();
    assert!(wait_until(Duration::from_secs(10), || handle.counters().deadlock_count == 1));
    handle.interrupt_workers();
    let report = handle.join().unwrap();

    // One interrupt cuts short every later wait of the same task
    assert!(report.all_finished());
    assert_eq!(report.interrupted_waits, 3);
}

#[test]
fn test_stop_aborts_retrying_and_queued_tasks() {
    let (store, plan) = faulty_table(100);
    plan.inject(FaultPoint::Commit, FaultTarget::Writers, u32::MAX, deadlock());
    let tasks: Vec<Task> = (1..=8).map(|i| point_write(i, &[i])).collect();
    let coordinator = Coordinator::new(store, sleepy()).unwrap();

    let started = Instant::now();
    let handle = coordinator.spawn(&tasks).unwrap();
    assert!(wait_until(Duration::from_secs(10), || handle.counters().deadlock_count >= 2));
    handle.stop();
    let report = handle.join().unwrap();

    assert!(started.elapsed() < Duration::from_secs(30));
    assert_eq!(report.tasks_finished, 0);
    assert_eq!(report.tasks_aborted, 8);
    assert!(report.is_complete());
    assert!(report
        .records
        .iter()
        .all(|r| r.fate == TaskFate::Aborted(AbortReason::Stopped)));
}
