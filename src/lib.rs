//! contend - deadlock and livelock study harness
//!
//! contend runs a population of short transactional tasks against a shared
//! table from a fixed pool of workers, and reports how conflicts resolved:
//! tasks finished, conflicts observed, the worst per-task retry tally.
//! Three reactions to a conflict can be compared:
//!
//! - abort on the first conflict
//! - back off for a randomized delay and retry
//! - back off, then retry through a FIFO fairness gate (the default)
//!
//! # Quick Start
//!
//! ```ignore
//! use contend::{run, OperatingMode, RunConfig};
//!
//! let config = RunConfig::new().with_mode(OperatingMode::RetryWithFairness);
//! let report = run(&config)?;
//! assert_eq!(report.tasks_finished, report.tasks_total);
//! ```
//!
//! # Architecture
//!
//! - `contend-core`: data model, errors, configuration, the store contract
//! - `contend-storage`: in-memory reference store, population, fault injection
//! - `contend-concurrency`: transactional unit, classifier, backoff, arbiter
//! - `contend-engine`: task generation, counters, worker pool, coordinator
//!
//! Any store implementing [`Store`] can be driven by a [`Coordinator`].

pub use contend_concurrency::{
    AbortReason, ArbiterGuard, AttemptOutcome, BackoffPolicy, Classification,
    ConflictClassifier, FairnessArbiter, Interrupt, RetryDecision, TaskOutput,
    TransactionalUnit, WaitOutcome,
};
pub use contend_core::*;
pub use contend_engine::{
    generate_tasks, run, run_serial, Coordinator, CounterSnapshot, Experiment, OutcomeCounters,
    RetryState, RunHandle, RunReport, TaskFate, TaskGenerator, TaskRecord, SERIAL_MODE,
};
pub use contend_storage::{populate, StoreStats, TableStore, DEFAULT_LOCK_WAIT_TIMEOUT};

/// Test utilities: fault injection for any store
pub mod testing {
    pub use contend_storage::testing::*;
}
