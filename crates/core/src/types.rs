//! Core types for contend
//!
//! This module defines the foundational types:
//! - RowId / TaskId: identifiers for table rows and workload tasks
//! - Row: one tuple of the shared table
//! - ValueRange: inclusive bounds over row values
//! - BehaviorClass / Selection / Task: the immutable description of one task
//! - Statement / StatementResult: the statement shapes issued against the store
//! - IsolationLevel: transaction isolation requested at `begin`

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel stored in `Row::modified_by` for rows no task has written yet.
pub const UNMODIFIED: i64 = 0;

/// Identifier of a row in the shared table
///
/// Rows are numbered densely from zero at population time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(pub u32);

impl RowId {
    /// Raw numeric id
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a workload task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub u32);

impl TaskId {
    /// Raw numeric id
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Value written to `Row::modified_by` by this task
    pub fn as_modifier(&self) -> i64 {
        i64::from(self.0)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One tuple of the shared table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Primary key
    pub id: RowId,
    /// Payload value, drawn uniformly from `[0, max_value)` at population
    pub value: f64,
    /// Id of the last task that wrote this row, or [`UNMODIFIED`]
    pub modified_by: i64,
}

impl Row {
    /// Create a row that no task has modified
    pub fn new(id: RowId, value: f64) -> Self {
        Self {
            id,
            value,
            modified_by: UNMODIFIED,
        }
    }
}

/// Inclusive `[low, high]` bounds over row values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    /// Lower bound (inclusive)
    pub low: f64,
    /// Upper bound (inclusive)
    pub high: f64,
}

impl ValueRange {
    /// Create a range; bounds are swapped if given in reverse
    pub fn new(low: f64, high: f64) -> Self {
        if low <= high {
            Self { low, high }
        } else {
            Self {
                low: high,
                high: low,
            }
        }
    }

    /// Whether `value` lies within the range
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    /// Whether two ranges share at least one value
    pub fn overlaps(&self, other: &ValueRange) -> bool {
        self.low <= other.high && other.low <= self.high
    }
}

/// Operation profile of a task, fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorClass {
    /// Read K rows by id and sum their values
    PointRead,
    /// Aggregate the whole table (`SUM(value)`)
    RangeScan,
    /// Update every row whose value falls in each of K value ranges
    RangeWrite,
    /// Update K rows by id
    PointWrite,
}

impl BehaviorClass {
    /// Whether the class mutates the table
    pub fn is_write(&self) -> bool {
        matches!(self, BehaviorClass::RangeWrite | BehaviorClass::PointWrite)
    }

    /// Short label used in logs and reports
    pub fn label(&self) -> &'static str {
        match self {
            BehaviorClass::PointRead => "read multi-point query",
            BehaviorClass::RangeScan => "full table scan",
            BehaviorClass::RangeWrite => "range write",
            BehaviorClass::PointWrite => "point write",
        }
    }
}

impl fmt::Display for BehaviorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Selection criteria of a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Selection {
    /// Distinct row ids
    Keys(Vec<RowId>),
    /// Value ranges, one per statement
    Ranges(Vec<ValueRange>),
    /// The whole table
    FullTable,
}

/// An immutable workload task
///
/// Write tasks carry the value each statement writes, so every attempt of a
/// retried task issues the same mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier, also written as `modified_by`
    pub id: TaskId,
    /// Operation profile
    pub behavior: BehaviorClass,
    /// Rows or ranges the task touches
    pub selection: Selection,
    /// New value per write statement (empty for readers)
    pub new_values: Vec<f64>,
}

impl Task {
    /// Number of statements one attempt issues
    pub fn statement_count(&self) -> usize {
        match &self.selection {
            Selection::Keys(keys) => keys.len(),
            Selection::Ranges(ranges) => ranges.len(),
            Selection::FullTable => 1,
        }
    }

    /// Build the statement sequence of one attempt
    pub fn statements(&self) -> Vec<Statement> {
        let modified_by = self.id.as_modifier();
        let value_at = |i: usize| self.new_values.get(i).copied().unwrap_or_default();

        match (&self.behavior, &self.selection) {
            (BehaviorClass::RangeScan, _) | (_, Selection::FullTable) => vec![Statement::SumAll],
            (BehaviorClass::PointRead, Selection::Keys(keys)) => keys
                .iter()
                .map(|&id| Statement::PointLookup { id })
                .collect(),
            (BehaviorClass::PointWrite, Selection::Keys(keys)) => keys
                .iter()
                .enumerate()
                .map(|(i, &id)| Statement::PointUpdate {
                    id,
                    value: value_at(i),
                    modified_by,
                })
                .collect(),
            (BehaviorClass::RangeWrite, Selection::Ranges(ranges)) => ranges
                .iter()
                .enumerate()
                .map(|(i, &range)| Statement::RangeUpdate {
                    range,
                    value: value_at(i),
                    modified_by,
                })
                .collect(),
            // A range selection on a reader or a key selection on a range
            // writer cannot be produced by the generator; issue nothing.
            _ => Vec::new(),
        }
    }
}

/// Statement shapes the engine issues against the store
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `SELECT value FROM rows WHERE id = ?`
    PointLookup {
        /// Row to read
        id: RowId,
    },
    /// `UPDATE rows SET value = ?, modified_by = ? WHERE id = ?`
    PointUpdate {
        /// Row to update
        id: RowId,
        /// New value
        value: f64,
        /// Writer id
        modified_by: i64,
    },
    /// `UPDATE rows SET value = ?, modified_by = ? WHERE value BETWEEN ? AND ?`
    RangeUpdate {
        /// Predicate bounds
        range: ValueRange,
        /// New value
        value: f64,
        /// Writer id
        modified_by: i64,
    },
    /// `SELECT SUM(value) FROM rows`
    SumAll,
}

impl Statement {
    /// Whether the statement mutates the table
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Statement::PointUpdate { .. } | Statement::RangeUpdate { .. }
        )
    }
}

/// Result of executing one statement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StatementResult {
    /// Value of a point lookup, `None` if the row does not exist
    Value(Option<f64>),
    /// Number of rows an update touched
    Affected(usize),
    /// Result of an aggregate read
    Aggregate(f64),
}

/// Isolation level requested when a transaction begins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// Each statement sees the latest committed data; write-write conflicts
    /// block on row locks and surface as conflict failures
    #[default]
    ReadCommitted,
}
