//! Outcome counters shared by all workers of a run
//!
//! Created when the coordinator starts, read once all workers are done,
//! never reset mid-run. Every counter only ever grows.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Process-wide run counters
///
/// # Memory Ordering
///
/// `tasks_finished` uses AcqRel because its post-increment value is the
/// finisher number handed back to the worker, and finisher numbers must be
/// unique. The remaining counters are observational and use Relaxed
/// ordering; the final read happens after every worker thread was joined,
/// which orders it after all increments.
#[derive(Debug, Default)]
pub struct OutcomeCounters {
    tasks_finished: AtomicU64,
    tasks_aborted: AtomicU64,
    deadlock_count: AtomicU64,
    max_retry_count: AtomicU32,
    fatal_failures: AtomicU64,
    interrupted_waits: AtomicU64,
}

impl OutcomeCounters {
    /// Fresh counters, all zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a committed task, returning its finisher number (1-based)
    pub fn record_finish(&self) -> u64 {
        self.tasks_finished.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Record a task that gave up without committing
    pub fn record_abort(&self) {
        self.tasks_aborted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one conflict occurrence for a task whose tally is now
    /// `retry_count`
    pub fn record_conflict(&self, retry_count: u32) {
        self.deadlock_count.fetch_add(1, Ordering::Relaxed);
        self.max_retry_count.fetch_max(retry_count, Ordering::Relaxed);
    }

    /// Record a non-conflict store failure
    pub fn record_fatal(&self) {
        self.fatal_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a backoff wait cut short by an interrupt
    pub fn record_interrupted_wait(&self) {
        self.interrupted_waits.fetch_add(1, Ordering::Relaxed);
    }

    /// Tasks committed so far
    pub fn tasks_finished(&self) -> u64 {
        self.tasks_finished.load(Ordering::Acquire)
    }

    /// Conflicts observed so far
    pub fn deadlock_count(&self) -> u64 {
        self.deadlock_count.load(Ordering::Relaxed)
    }

    /// Highest per-task retry tally so far
    pub fn max_retry_count(&self) -> u32 {
        self.max_retry_count.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            tasks_finished: self.tasks_finished.load(Ordering::Acquire),
            tasks_aborted: self.tasks_aborted.load(Ordering::Relaxed),
            deadlock_count: self.deadlock_count.load(Ordering::Relaxed),
            max_retry_count: self.max_retry_count.load(Ordering::Relaxed),
            fatal_failures: self.fatal_failures.load(Ordering::Relaxed),
            interrupted_waits: self.interrupted_waits.load(Ordering::Relaxed),
        }
    }
}

/// Copy of [`OutcomeCounters`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CounterSnapshot {
    /// Tasks committed
    pub tasks_finished: u64,
    /// Tasks that gave up (abort mode, fatal failure, retry cap, stop)
    pub tasks_aborted: u64,
    /// Conflict occurrences across all tasks
    pub deadlock_count: u64,
    /// Highest per-task conflict tally
    pub max_retry_count: u32,
    /// Non-conflict store failures
    pub fatal_failures: u64,
    /// Backoff waits cut short by an interrupt
    pub interrupted_waits: u64,
}
