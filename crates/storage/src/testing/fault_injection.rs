//! Fault injection wrapper for any `Store`
//!
//! Wraps a store and fails selected statements or commits with a chosen
//! `StoreError`, a bounded number of times. Used to drive the retry engine
//! through conflict and fatal paths deterministically, and to model a store
//! that rejects a transaction for a while and then stops.
//!
//! # Example
//!
//! ```ignore
//! use contend_storage::testing::{FaultInjectingStore, FaultPlan, FaultPoint, FaultTarget};
//!
//! let plan = FaultPlan::new();
//! plan.inject(FaultPoint::Commit, FaultTarget::Modifier(3), 2, StoreError::conflict(...));
//! let store = FaultInjectingStore::new(table, plan.clone());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use contend_core::{
    IsolationLevel, Statement, StatementResult, Store, StoreError, StoreResult, StoreTransaction,
};
use parking_lot::Mutex;

/// Where a fault fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    /// When a matching statement is executed
    Execute,
    /// When a matching transaction commits
    Commit,
}

/// Which transactions or statements a fault applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultTarget {
    /// Everything
    Any,
    /// Writes issued by the given `modified_by` value
    Modifier(i64),
    /// Any write
    Writers,
    /// Reads only (transactions that wrote nothing, at commit)
    Readers,
}

#[derive(Debug)]
struct FaultRule {
    point: FaultPoint,
    target: FaultTarget,
    remaining: u32,
    error: StoreError,
}

/// Shared set of fault rules
#[derive(Debug, Default)]
pub struct FaultPlan {
    rules: Mutex<Vec<FaultRule>>,
    injected: AtomicU64,
}

impl FaultPlan {
    /// Create an empty plan
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail the next `times` matching operations with `error`
    pub fn inject(&self, point: FaultPoint, target: FaultTarget, times: u32, error: StoreError) {
        self.rules.lock().push(FaultRule {
            point,
            target,
            remaining: times,
            error,
        });
    }

    /// Drop all pending rules; the store behaves normally from now on
    pub fn clear(&self) {
        self.rules.lock().clear();
    }

    /// Total faults injected so far
    pub fn injected(&self) -> u64 {
        self.injected.load(Ordering::Relaxed)
    }

    /// Rules with remaining budget
    pub fn pending(&self) -> usize {
        self.rules.lock().iter().filter(|r| r.remaining > 0).count()
    }

    fn take(&self, point: FaultPoint, matches: impl Fn(FaultTarget) -> bool) -> Option<StoreError> {
        let mut rules = self.rules.lock();
        let rule = rules
            .iter_mut()
            .find(|r| r.point == point && r.remaining > 0 && matches(r.target))?;
        rule.remaining -= 1;
        self.injected.fetch_add(1, Ordering::Relaxed);
        Some(rule.error.clone())
    }
}

fn statement_modifier(statement: &Statement) -> Option<i64> {
    match *statement {
        Statement::PointUpdate { modified_by, .. } | Statement::RangeUpdate { modified_by, .. } => {
            Some(modified_by)
        }
        Statement::PointLookup { .. } | Statement::SumAll => None,
    }
}

/// A store that fails operations according to a [`FaultPlan`]
#[derive(Debug, Clone)]
pub struct FaultInjectingStore<S> {
    inner: S,
    plan: Arc<FaultPlan>,
}

impl<S: Store> FaultInjectingStore<S> {
    /// Wrap `inner`, failing operations per `plan`
    pub fn new(inner: S, plan: Arc<FaultPlan>) -> Self {
        Self { inner, plan }
    }

    /// The wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// The shared plan
    pub fn plan(&self) -> &Arc<FaultPlan> {
        &self.plan
    }
}

impl<S: Store> Store for FaultInjectingStore<S> {
    type Txn = FaultInjectingTransaction<S::Txn>;

    fn begin(&self, isolation: IsolationLevel) -> StoreResult<Self::Txn> {
        Ok(FaultInjectingTransaction {
            inner: self.inner.begin(isolation)?,
            plan: Arc::clone(&self.plan),
            modifiers: Vec::new(),
        })
    }
}

/// Transaction wrapper produced by [`FaultInjectingStore`]
#[derive(Debug)]
pub struct FaultInjectingTransaction<T> {
    inner: T,
    plan: Arc<FaultPlan>,
    modifiers: Vec<i64>,
}

impl<T: StoreTransaction> StoreTransaction for FaultInjectingTransaction<T> {
    fn execute(&mut self, statement: &Statement) -> StoreResult<StatementResult> {
        let modifier = statement_modifier(statement);
        let injected = self.plan.take(FaultPoint::Execute, |target| match target {
            FaultTarget::Any => true,
            FaultTarget::Modifier(m) => modifier == Some(m),
            FaultTarget::Writers => modifier.is_some(),
            FaultTarget::Readers => modifier.is_none(),
        });
        if let Some(err) = injected {
            return Err(err);
        }

        let result = self.inner.execute(statement)?;
        if let Some(m) = modifier {
            self.modifiers.push(m);
        }
        Ok(result)
    }

    fn commit(&mut self) -> StoreResult<()> {
        let modifiers = &self.modifiers;
        let injected = self.plan.take(FaultPoint::Commit, |target| match target {
            FaultTarget::Any => true,
            FaultTarget::Modifier(m) => modifiers.contains(&m),
            FaultTarget::Writers => !modifiers.is_empty(),
            FaultTarget::Readers => modifiers.is_empty(),
        });
        if let Some(err) = injected {
            self.inner.rollback()?;
            return Err(err);
        }
        self.inner.commit()
    }

    fn rollback(&mut self) -> StoreResult<()> {
        self.inner.rollback()
    }
}
