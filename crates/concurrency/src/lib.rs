//! Retry machinery for contend
//!
//! This crate holds the per-attempt pieces the worker loop is built from:
//! - TransactionalUnit: one all-or-nothing attempt of a task
//! - ConflictClassifier: retry or abort after a failure
//! - BackoffPolicy / Interrupt: randomized, interruptible wait before a retry
//! - FairnessArbiter: FIFO admission gate for retry attempts
//!
//! None of these own threads. The engine crate wires them into a worker pool.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod arbiter;
pub mod backoff;
pub mod classifier;
pub mod unit;

pub use arbiter::{ArbiterGuard, FairnessArbiter};
pub use backoff::{BackoffPolicy, Interrupt, WaitOutcome};
pub use classifier::{AbortReason, Classification, ConflictClassifier, RetryDecision};
pub use unit::{AttemptOutcome, TaskOutput, TransactionalUnit};
