//! Storage layer for contend
//!
//! This crate implements the store side of the transactional contract:
//! - TableStore: BTreeMap + RwLock table with read-committed transactions
//! - RowLockTable: exclusive row locks with lock-wait timeouts
//! - Population: deterministic bulk load of the shared table
//! - Testing: fault injection over any `Store`
//!
//! The retry engine never depends on these types directly; it only sees
//! `contend_core::Store`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod locks;
pub mod populate;
pub mod table;
pub mod testing;

pub use locks::{RowLockTable, TxnId};
pub use populate::{generate_rows, populate};
pub use table::{StoreStats, TableStore, TableTransaction, DEFAULT_LOCK_WAIT_TIMEOUT};
