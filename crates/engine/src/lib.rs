//! Run engine for contend
//!
//! This crate turns a configuration into a measured run:
//! - TaskGenerator: deterministic task population
//! - OutcomeCounters: run-wide finish/abort/conflict counters
//! - Worker pool: named threads, per-task retry loop
//! - Coordinator / RunHandle: pooled runs, the serial baseline, run control
//! - Experiment: populate + generate + run in one call
//!
//! The retry building blocks themselves live in `contend-concurrency`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coordinator;
pub mod counters;
pub mod experiment;
pub mod generator;
pub mod pool;

pub use coordinator::{Coordinator, RunHandle, RunReport, SERIAL_MODE};
pub use counters::{CounterSnapshot, OutcomeCounters};
pub use experiment::{run, run_serial, Experiment};
pub use generator::{generate_tasks, TaskGenerator};
pub use pool::{RetryState, TaskFate, TaskRecord};
