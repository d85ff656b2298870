//! Row-level write locks for the reference table store
//!
//! Each row has at most one owning transaction. A transaction that finds a
//! row owned by someone else waits on a condition variable until the row is
//! released or its lock-wait timeout expires. Expiry is reported as a
//! `LockTimeout` conflict, which is how circular waits between transactions
//! get broken: one side gives up, rolls back, and releases what it holds.
//! There is no wait-for graph.

use std::time::{Duration, Instant};

use contend_core::{ConflictKind, RowId, StoreError, StoreResult};
use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;

/// Transaction identifier allocated by the store
pub type TxnId = u64;

/// Exclusive row locks keyed by row id
#[derive(Debug, Default)]
pub struct RowLockTable {
    owners: Mutex<FxHashMap<RowId, TxnId>>,
    released: Condvar,
}

impl RowLockTable {
    /// Create an empty lock table
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock on `row` for `txn`, waiting at most `timeout`
    ///
    /// Returns `Ok(true)` if the lock was newly acquired and `Ok(false)` if
    /// `txn` already held it.
    ///
    /// # Errors
    ///
    /// `Conflict { kind: LockTimeout }` if another transaction still holds
    /// the row when the timeout expires.
    pub fn acquire(&self, row: RowId, txn: TxnId, timeout: Duration) -> StoreResult<bool> {
        let deadline = Instant::now() + timeout;
        let mut owners = self.owners.lock();

        loop {
            match owners.get(&row).copied() {
                None => {
                    owners.insert(row, txn);
                    return Ok(true);
                }
                Some(holder) if holder == txn => return Ok(false),
                Some(holder) => {
                    if Instant::now() >= deadline {
                        return Err(StoreError::conflict(
                            ConflictKind::LockTimeout,
                            format!(
                                "txn {} gave up waiting for row {} held by txn {}",
                                txn, row, holder
                            ),
                        ));
                    }
                    self.released.wait_until(&mut owners, deadline);
                }
            }
        }
    }

    /// Release every lock `txn` holds among `rows` and wake all waiters
    pub fn release_all(&self, txn: TxnId, rows: &[RowId]) {
        if rows.is_empty() {
            return;
        }
        {
            let mut owners = self.owners.lock();
            for row in rows {
                if owners.get(row) == Some(&txn) {
                    owners.remove(row);
                }
            }
        }
        self.released.notify_all();
    }

    /// Current holder of `row`
    pub fn holder(&self, row: RowId) -> Option<TxnId> {
        self.owners.lock().get(&row).copied()
    }

    /// Number of rows currently locked
    pub fn locked_rows(&self) -> usize {
        self.owners.lock().len()
    }
}
