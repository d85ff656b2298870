//! Core traits for the transactional store contract
//!
//! This module defines the `Store` and `StoreTransaction` traits: the only
//! surface the retry engine consumes from the store. Any backend that can
//! begin a transaction, execute the four statement shapes, and report
//! conflicts as failures (instead of blocking forever) can be plugged in.

use std::sync::Arc;

use crate::error::StoreResult;
use crate::types::{IsolationLevel, Statement, StatementResult};

/// A transactional table
///
/// Thread safety: `begin` is called concurrently from every worker, so
/// implementations must be `Send + Sync`. Transactions themselves stay on
/// the thread that opened them.
pub trait Store: Send + Sync {
    /// Transaction handle produced by [`Store::begin`]
    type Txn: StoreTransaction;

    /// Open a transaction at the given isolation level
    ///
    /// # Errors
    ///
    /// Returns `Fatal` if the store cannot open a transaction.
    fn begin(&self, isolation: IsolationLevel) -> StoreResult<Self::Txn>;
}

/// One open transaction
///
/// A transaction that is dropped while still active must be rolled back
/// by the implementation, so a transactional context is never leaked.
pub trait StoreTransaction {
    /// Execute one statement inside the transaction
    ///
    /// # Errors
    ///
    /// - `Conflict` if a concurrent transaction prevents the statement
    ///   (lock-wait timeout, deadlock victim, serialization failure)
    /// - `RowNotFound` for a point statement on a missing row
    /// - `TransactionClosed` after commit or rollback
    /// - `Fatal` for anything else
    fn execute(&mut self, statement: &Statement) -> StoreResult<StatementResult>;

    /// Make the transaction's writes visible atomically
    ///
    /// # Errors
    ///
    /// `Conflict` or `Fatal`; the transaction must be rolled back by the
    /// caller (or dropped) after a failed commit.
    fn commit(&mut self) -> StoreResult<()>;

    /// Discard the transaction's writes and release its locks
    ///
    /// Rolling back a transaction that is no longer active is a no-op.
    fn rollback(&mut self) -> StoreResult<()>;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    type Txn = S::Txn;

    fn begin(&self, isolation: IsolationLevel) -> StoreResult<Self::Txn> {
        (**self).begin(isolation)
    }
}
