//! Transactional unit: one all-or-nothing attempt of one task
//!
//! An attempt opens a single transaction, issues the task's statements in
//! order, and commits. Any failure rolls the transaction back before the
//! outcome is returned, so no partial effect is ever committed and the
//! transactional context never outlives the attempt. There are no retries
//! in here; the worker loop owns the retry policy.

use contend_core::{
    BehaviorClass, IsolationLevel, StatementResult, Store, StoreError, StoreResult,
    StoreTransaction, Task,
};
use tracing::{debug, warn};

/// What a successful attempt produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaskOutput {
    /// Sum of the values read (point read) or of the whole table (scan)
    Sum(f64),
    /// Rows updated across all statements
    Affected(usize),
}

/// Result of one attempt
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// The transaction committed
    Success(TaskOutput),
    /// The store reported a synchronization conflict; rolled back
    Conflict(StoreError),
    /// Any other failure; rolled back
    Fatal(StoreError),
}

impl AttemptOutcome {
    fn from_error(error: StoreError) -> Self {
        if error.is_conflict() {
            AttemptOutcome::Conflict(error)
        } else {
            AttemptOutcome::Fatal(error)
        }
    }

    /// Whether the attempt committed
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Success(_))
    }
}

/// Runs task attempts against a store
#[derive(Debug)]
pub struct TransactionalUnit<S> {
    store: S,
    isolation: IsolationLevel,
}

impl<S: Store> TransactionalUnit<S> {
    /// Unit issuing read-committed transactions against `store`
    pub fn new(store: S) -> Self {
        Self {
            store,
            isolation: IsolationLevel::ReadCommitted,
        }
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Attempt `task` once
    pub fn attempt(&self, task: &Task) -> AttemptOutcome {
        let mut txn = match self.store.begin(self.isolation) {
            Ok(txn) => txn,
            Err(e) => {
                warn!(target: "contend::txn", task = %task.id, error = %e, "Could not open transaction");
                return AttemptOutcome::from_error(e);
            }
        };

        let result = run_statements(&mut txn, task).and_then(|output| {
            txn.commit()?;
            Ok(output)
        });

        match result {
            Ok(output) => AttemptOutcome::Success(output),
            Err(e) => {
                debug!(target: "contend::txn", task = %task.id, error = %e, "Attempt failed, rolling back");
                if let Err(rollback_err) = txn.rollback() {
                    warn!(target: "contend::txn", task = %task.id, error = %rollback_err, "Rollback failed");
                }
                AttemptOutcome::from_error(e)
            }
        }
    }
}

fn run_statements<T: StoreTransaction>(txn: &mut T, task: &Task) -> StoreResult<TaskOutput> {
    let mut sum = 0.0;
    let mut affected = 0;

    for statement in task.statements() {
        match txn.execute(&statement)? {
            StatementResult::Value(value) => sum += value.unwrap_or_default(),
            StatementResult::Aggregate(total) => sum += total,
            StatementResult::Affected(n) => affected += n,
        }
    }

    Ok(match task.behavior {
        BehaviorClass::PointRead | BehaviorClass::RangeScan => TaskOutput::Sum(sum),
        BehaviorClass::RangeWrite | BehaviorClass::PointWrite => TaskOutput::Affected(affected),
    })
}
