//! Testing utilities for the store contract
//!
//! - **Fault injection**: wrap any `Store` and fail chosen statements or
//!   commits with conflict or fatal errors, a bounded number of times
//!
//! # Example
//!
//! ```ignore
//! use contend_storage::testing::{FaultInjectingStore, FaultPlan, FaultPoint, FaultTarget};
//!
//! let plan = FaultPlan::new();
//! plan.inject(FaultPoint::Commit, FaultTarget::Writers, 3, StoreError::fatal("lost connection"));
//! let store = FaultInjectingStore::new(TableStore::default(), plan);
//! ```

mod fault_injection;

pub use fault_injection::{
    FaultInjectingStore, FaultInjectingTransaction, FaultPlan, FaultPoint, FaultTarget,
};
