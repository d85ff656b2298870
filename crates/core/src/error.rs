//! Error types for contend
//!
//! Two layers, both built with `thiserror`:
//! - [`StoreError`]: failures reported by the transactional store. Conflicts
//!   (deadlock, serialization failure, lock-wait timeout) are recoverable by
//!   rollback and retry; everything else is fatal for the attempt.
//! - [`ContendError`]: run-level failures (bad configuration, worker panic).
//!
//! An interrupted backoff wait is deliberately not an error: it is reported
//! as a wait outcome and handled as "retry now".

use crate::types::RowId;
use std::io;
use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for run-level operations
pub type ContendResult<T> = std::result::Result<T, ContendError>;

/// Kind of synchronization failure reported by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictKind {
    /// The store detected a circular wait and picked this transaction as victim
    Deadlock,
    /// The store could not serialize this transaction against a concurrent one
    Serialization,
    /// A row lock could not be obtained before the lock-wait timeout
    LockTimeout,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictKind::Deadlock => f.write_str("deadlock detected"),
            ConflictKind::Serialization => f.write_str("could not serialize access"),
            ConflictKind::LockTimeout => f.write_str("lock wait timeout"),
        }
    }
}

/// Failure reported by the transactional store
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// Synchronization conflict with a concurrent transaction
    #[error("conflict: {kind}: {detail}")]
    Conflict {
        /// What kind of conflict the store observed
        kind: ConflictKind,
        /// Store-provided description
        detail: String,
    },

    /// Any non-conflict failure (lost connection, internal error, ...)
    #[error("fatal store error: {0}")]
    Fatal(String),

    /// A statement referenced a row that does not exist
    #[error("row not found: {0}")]
    RowNotFound(RowId),

    /// The transaction was already committed or rolled back
    #[error("transaction is no longer active")]
    TransactionClosed,
}

impl StoreError {
    /// Create a conflict error
    pub fn conflict(kind: ConflictKind, detail: impl Into<String>) -> Self {
        StoreError::Conflict {
            kind,
            detail: detail.into(),
        }
    }

    /// Create a fatal error
    pub fn fatal(detail: impl Into<String>) -> Self {
        StoreError::Fatal(detail.into())
    }

    /// Whether the store reported a synchronization conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    /// Conflict kind, if this is a conflict
    pub fn conflict_kind(&self) -> Option<ConflictKind> {
        match self {
            StoreError::Conflict { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Run-level error
#[derive(Debug, Error)]
pub enum ContendError {
    /// A store failure escaped the per-attempt boundary (setup, population)
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration rejected by validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// I/O error (reading a config file)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A worker thread panicked
    #[error("worker panicked: {0}")]
    WorkerPanicked(String),
}

impl ContendError {
    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        ContendError::InvalidConfig(msg.into())
    }
}

impl From<toml::de::Error> for ContendError {
    fn from(e: toml::de::Error) -> Self {
        ContendError::ConfigParse(e.to_string())
    }
}
