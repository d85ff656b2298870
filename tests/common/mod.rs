//! Shared test utilities for all integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::time::{Duration, Instant};

pub use contend::testing::{FaultInjectingStore, FaultPlan, FaultPoint, FaultTarget};
pub use contend::{
    BehaviorClass, ConflictKind, Coordinator, OperatingMode, Row, RowId, RunConfig, RunReport,
    Selection, StoreError, TableStore, Task, TaskFate, TaskId, ValueRange, WorkloadMix,
};

// ============================================================================
// Configs
// ============================================================================

/// Small, fast config: short backoff, short lock waits
pub fn fast_config() -> RunConfig {
    RunConfig::new()
        .with_rows(1_000)
        .with_backoff_ms(1, 2)
        .with_lock_wait_timeout_ms(5)
}

// ============================================================================
// Stores
// ============================================================================

/// Table with `rows` rows, values cycling through `0..50`
pub fn table(rows: u32) -> TableStore {
    let store = TableStore::new(Duration::from_millis(5));
    store.replace_all((0..rows).map(|i| Row::new(RowId(i), f64::from(i % 50))));
    store
}

/// Table wrapped in a fault injector with an empty plan
pub fn faulty_table(rows: u32) -> (FaultInjectingStore<TableStore>, std::sync::Arc<FaultPlan>) {
    let plan = FaultPlan::new();
    (FaultInjectingStore::new(table(rows), std::sync::Arc::clone(&plan)), plan)
}

pub fn deadlock() -> StoreError {
    StoreError::conflict(ConflictKind::Deadlock, "chosen as deadlock victim")
}

// ============================================================================
// Tasks
// ============================================================================

pub fn point_write(id: u32, rows: &[u32]) -> Task {
    Task {
        id: TaskId(id),
        behavior: BehaviorClass::PointWrite,
        selection: Selection::Keys(rows.iter().copied().map(RowId).collect()),
        new_values: vec![f64::from(id); rows.len()],
    }
}

pub fn range_write(id: u32, low: f64, high: f64, statements: usize) -> Task {
    Task {
        id: TaskId(id),
        behavior: BehaviorClass::RangeWrite,
        selection: Selection::Ranges(vec![ValueRange::new(low, high); statements]),
        new_values: vec![100.0 + f64::from(id); statements],
    }
}

pub fn point_read(id: u32, rows: &[u32]) -> Task {
    Task {
        id: TaskId(id),
        behavior: BehaviorClass::PointRead,
        selection: Selection::Keys(rows.iter().copied().map(RowId).collect()),
        new_values: vec![],
    }
}

pub fn scan(id: u32) -> Task {
    Task {
        id: TaskId(id),
        behavior: BehaviorClass::RangeScan,
        selection: Selection::FullTable,
        new_values: vec![],
    }
}

// ============================================================================
// Report checks
// ============================================================================

/// Every task appears exactly once, and finisher numbers are 1..=finished
pub fn assert_no_double_commit(report: &RunReport) {
    assert_eq!(report.records.len() as u64, report.tasks_total);

    let mut ids: Vec<TaskId> = report.records.iter().map(|r| r.task).collect();
    ids.dedup();
    assert_eq!(ids.len() as u64, report.tasks_total, "a task was recorded twice");

    let mut finishers: Vec<u64> = report
        .records
        .iter()
        .filter_map(|r| match r.fate {
            TaskFate::Finished { finisher } => Some(finisher),
            TaskFate::Aborted(_) => None,
        })
        .collect();
    finishers.sort_unstable();
    let expected: Vec<u64> = (1..=report.tasks_finished).collect();
    assert_eq!(finishers, expected);
}

/// Poll `cond` until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}
