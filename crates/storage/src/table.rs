//! TableStore: in-memory reference implementation of the store contract
//!
//! This module implements `Store` using:
//! - `BTreeMap<RowId, Row>` behind a `parking_lot::RwLock` for committed rows
//! - `RowLockTable` for exclusive row locks held until commit or rollback
//! - A per-transaction write buffer that becomes visible atomically on commit
//!
//! # Read Committed
//!
//! - Reads take no locks and see the latest committed row, overlaid with the
//!   transaction's own uncommitted writes.
//! - Updates lock each target row. A blocked lock wait fails with a
//!   `LockTimeout` conflict after the configured timeout.
//! - A range update re-checks its predicate after locking a row, so a row
//!   moved out of the range by a concurrent commit is skipped.
//!
//! After any statement failure the transaction is poisoned: it accepts no
//! further statements and can only be rolled back.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contend_core::{
    IsolationLevel, Row, RowId, Statement, StatementResult, Store, StoreError, StoreResult,
    StoreTransaction, ValueRange,
};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::locks::{RowLockTable, TxnId};

/// Default time a blocked row-lock wait lasts before failing
pub const DEFAULT_LOCK_WAIT_TIMEOUT: Duration = Duration::from_millis(50);

/// Store counters
///
/// Purely observational; all counters use Relaxed ordering.
#[derive(Debug, Default)]
struct StoreCounters {
    begun: AtomicU64,
    committed: AtomicU64,
    rolled_back: AtomicU64,
    lock_timeouts: AtomicU64,
}

/// Snapshot of store counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    /// Transactions opened
    pub begun: u64,
    /// Transactions committed
    pub committed: u64,
    /// Transactions rolled back (explicitly or on drop)
    pub rolled_back: u64,
    /// Statements that failed on a row-lock timeout
    pub lock_timeouts: u64,
}

#[derive(Debug)]
struct TableInner {
    data: RwLock<BTreeMap<RowId, Row>>,
    locks: RowLockTable,
    next_txn_id: AtomicU64,
    lock_wait_timeout: Duration,
    counters: StoreCounters,
}

/// In-memory transactional table
///
/// Cloning is cheap and yields a handle to the same table.
#[derive(Debug, Clone)]
pub struct TableStore {
    inner: Arc<TableInner>,
}

impl Default for TableStore {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_WAIT_TIMEOUT)
    }
}

impl TableStore {
    /// Create an empty table
    pub fn new(lock_wait_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(TableInner {
                data: RwLock::new(BTreeMap::new()),
                locks: RowLockTable::new(),
                next_txn_id: AtomicU64::new(1),
                lock_wait_timeout,
                counters: StoreCounters::default(),
            }),
        }
    }

    /// Replace the whole table content, outside of any transaction
    ///
    /// Returns the number of rows inserted.
    pub fn replace_all(&self, rows: impl IntoIterator<Item = Row>) -> usize {
        let mut data = self.inner.data.write();
        data.clear();
        for row in rows {
            data.insert(row.id, row);
        }
        data.len()
    }

    /// Latest committed version of a row
    pub fn get(&self, id: RowId) -> Option<Row> {
        self.inner.data.read().get(&id).copied()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.inner.data.read().len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of all committed values
    pub fn sum(&self) -> f64 {
        self.inner.data.read().values().map(|row| row.value).sum()
    }

    /// Copy of all committed rows in id order
    pub fn rows(&self) -> Vec<Row> {
        self.inner.data.read().values().copied().collect()
    }

    /// Configured lock-wait timeout
    pub fn lock_wait_timeout(&self) -> Duration {
        self.inner.lock_wait_timeout
    }

    /// Rows currently locked by open transactions
    pub fn locked_rows(&self) -> usize {
        self.inner.locks.locked_rows()
    }

    /// Snapshot of the store counters
    pub fn stats(&self) -> StoreStats {
        let c = &self.inner.counters;
        StoreStats {
            begun: c.begun.load(Ordering::Relaxed),
            committed: c.committed.load(Ordering::Relaxed),
            rolled_back: c.rolled_back.load(Ordering::Relaxed),
            lock_timeouts: c.lock_timeouts.load(Ordering::Relaxed),
        }
    }
}

impl Store for TableStore {
    type Txn = TableTransaction;

    fn begin(&self, isolation: IsolationLevel) -> StoreResult<TableTransaction> {
        let id = self.inner.next_txn_id.fetch_add(1, Ordering::SeqCst);
        self.inner.counters.begun.fetch_add(1, Ordering::Relaxed);
        trace!(target: "contend::store", txn = id, ?isolation, "Transaction started");

        Ok(TableTransaction {
            inner: Arc::clone(&self.inner),
            id,
            writes: FxHashMap::default(),
            locked: Vec::new(),
            state: TxnState::Active,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxnState {
    Active,
    /// A statement failed; only rollback is accepted
    Poisoned,
    Committed,
    RolledBack,
}

/// Open transaction on a [`TableStore`]
///
/// Dropping an active or poisoned transaction rolls it back.
#[derive(Debug)]
pub struct TableTransaction {
    inner: Arc<TableInner>,
    id: TxnId,
    writes: FxHashMap<RowId, Row>,
    locked: Vec<RowId>,
    state: TxnState,
}

impl TableTransaction {
    /// Store-assigned transaction id
    pub fn id(&self) -> TxnId {
        self.id
    }

    fn visible(&self, data: &BTreeMap<RowId, Row>, id: RowId) -> Option<Row> {
        self.writes
            .get(&id)
            .copied()
            .or_else(|| data.get(&id).copied())
    }

    fn lock_row(&mut self, id: RowId) -> StoreResult<()> {
        match self
            .inner
            .locks
            .acquire(id, self.id, self.inner.lock_wait_timeout)
        {
            Ok(true) => {
                self.locked.push(id);
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(e) => {
                self.inner
                    .counters
                    .lock_timeouts
                    .fetch_add(1, Ordering::Relaxed);
                debug!(target: "contend::store", txn = self.id, row = %id, "Row lock wait timed out");
                Err(e)
            }
        }
    }

    fn point_lookup(&self, id: RowId) -> StatementResult {
        let data = self.inner.data.read();
        StatementResult::Value(self.visible(&data, id).map(|row| row.value))
    }

    fn point_update(&mut self, id: RowId, value: f64, modified_by: i64) -> StoreResult<StatementResult> {
        if !self.inner.data.read().contains_key(&id) && !self.writes.contains_key(&id) {
            return Err(StoreError::RowNotFound(id));
        }
        self.lock_row(id)?;
        self.writes.insert(
            id,
            Row {
                id,
                value,
                modified_by,
            },
        );
        Ok(StatementResult::Affected(1))
    }

    fn range_update(
        &mut self,
        range: ValueRange,
        value: f64,
        modified_by: i64,
    ) -> StoreResult<StatementResult> {
        // Collect candidates without holding the table lock while blocking
        // on row locks; commit needs the write side of it.
        let candidates: Vec<RowId> = {
            let data = self.inner.data.read();
            data.keys()
                .copied()
                .filter(|&id| {
                    self.visible(&data, id)
                        .is_some_and(|row| range.contains(row.value))
                })
                .collect()
        };

        let mut affected = 0;
        for id in candidates {
            self.lock_row(id)?;
            let current = {
                let data = self.inner.data.read();
                self.visible(&data, id)
            };
            if current.is_some_and(|row| range.contains(row.value)) {
                self.writes.insert(
                    id,
                    Row {
                        id,
                        value,
                        modified_by,
                    },
                );
                affected += 1;
            }
        }
        Ok(StatementResult::Affected(affected))
    }

    fn sum_all(&self) -> StatementResult {
        let data = self.inner.data.read();
        let committed: f64 = data
            .iter()
            .map(|(id, row)| self.writes.get(id).map_or(row.value, |w| w.value))
            .sum();
        StatementResult::Aggregate(committed)
    }

    fn release(&mut self) {
        let locked = std::mem::take(&mut self.locked);
        self.inner.locks.release_all(self.id, &locked);
        self.writes.clear();
    }
}

impl StoreTransaction for TableTransaction {
    fn execute(&mut self, statement: &Statement) -> StoreResult<StatementResult> {
        if self.state != TxnState::Active {
            return Err(StoreError::TransactionClosed);
        }

        let result = match *statement {
            Statement::PointLookup { id } => Ok(self.point_lookup(id)),
            Statement::PointUpdate {
                id,
                value,
                modified_by,
            } => self.point_update(id, value, modified_by),
            Statement::RangeUpdate {
                range,
                value,
                modified_by,
            } => self.range_update(range, value, modified_by),
            Statement::SumAll => Ok(self.sum_all()),
        };

        if result.is_err() {
            self.state = TxnState::Poisoned;
        }
        result
    }

    fn commit(&mut self) -> StoreResult<()> {
        if self.state != TxnState::Active {
            return Err(StoreError::TransactionClosed);
        }

        {
            let mut data = self.inner.data.write();
            for (id, row) in self.writes.drain() {
                data.insert(id, row);
            }
        }
        self.release();
        self.state = TxnState::Committed;
        self.inner.counters.committed.fetch_add(1, Ordering::Relaxed);
        trace!(target: "contend::store", txn = self.id, "Transaction committed");
        Ok(())
    }

    fn rollback(&mut self) -> StoreResult<()> {
        if matches!(self.state, TxnState::Active | TxnState::Poisoned) {
            self.release();
            self.state = TxnState::RolledBack;
            self.inner
                .counters
                .rolled_back
                .fetch_add(1, Ordering::Relaxed);
            trace!(target: "contend::store", txn = self.id, "Transaction rolled back");
        }
        Ok(())
    }
}

impl Drop for TableTransaction {
    fn drop(&mut self) {
        let _ = self.rollback();
    }
}
