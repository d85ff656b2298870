//! Core types and traits for contend
//!
//! This crate defines the foundational types used throughout the system:
//! - RowId / TaskId / Row: the shared table's data model
//! - Task / BehaviorClass / Selection: immutable workload tasks
//! - Statement / StatementResult / IsolationLevel: the store's statement contract
//! - StoreError / ContendError: error type hierarchy
//! - Traits: the transactional store contract (Store, StoreTransaction)
//! - RunConfig / OperatingMode / WorkloadMix: run configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{OperatingMode, RunConfig, WorkloadMix, CONFIG_FILE_NAME, MAX_BACKOFF_MS};
pub use error::{ConflictKind, ContendError, ContendResult, StoreError, StoreResult};
pub use traits::{Store, StoreTransaction};
pub use types::{
    BehaviorClass, IsolationLevel, Row, RowId, Selection, Statement, StatementResult, Task,
    TaskId, ValueRange, UNMODIFIED,
};
