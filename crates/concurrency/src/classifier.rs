//! Conflict classification and the retry decision
//!
//! The store reports two families of failure: synchronization conflicts
//! (deadlock victim, serialization failure, lock-wait timeout) and
//! everything else. Which conflicts are worth another attempt depends on the
//! operating mode:
//!
//! | Mode                | Conflict       | Fatal          |
//! |---------------------|----------------|----------------|
//! | `AbortOnConflict`   | NonRetryable   | NonRetryable   |
//! | `Retry`             | Retryable      | NonRetryable   |
//! | `RetryWithFairness` | Retryable      | NonRetryable   |
//!
//! The fairness design has no retry cap; an optional cap exists for
//! experiments and turns the cap-th conflict into an abort.

use contend_core::{OperatingMode, RunConfig, StoreError};

/// Whether a failure may be retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Roll back and attempt again
    Retryable,
    /// Roll back and give up on the task
    NonRetryable,
}

/// Why a task stopped without committing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbortReason {
    /// First conflict in abort-on-conflict mode
    Conflict,
    /// A non-conflict store failure
    Fatal,
    /// The configured retry cap was reached
    RetryCapReached,
    /// The run was asked to stop while the task was retrying
    Stopped,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::Conflict => f.write_str("conflict"),
            AbortReason::Fatal => f.write_str("fatal error"),
            AbortReason::RetryCapReached => f.write_str("retry cap reached"),
            AbortReason::Stopped => f.write_str("stopped"),
        }
    }
}

/// Outcome of classifying a failure in the context of a task's history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Back off and attempt again
    Retry,
    /// Give up on the task
    Abort(AbortReason),
}

/// Maps store failures to retry decisions for one operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictClassifier {
    mode: OperatingMode,
    max_retries: Option<u32>,
}

impl ConflictClassifier {
    /// Classifier for `mode` with no retry cap
    pub fn new(mode: OperatingMode) -> Self {
        Self {
            mode,
            max_retries: None,
        }
    }

    /// Classifier described by a run configuration
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            mode: config.mode,
            max_retries: config.max_retries,
        }
    }

    /// Cap the number of retries per task
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Operating mode
    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    /// Classify one failure
    pub fn classify(&self, error: &StoreError) -> Classification {
        if error.is_conflict() && self.mode.retries() {
            Classification::Retryable
        } else {
            Classification::NonRetryable
        }
    }

    /// Decide what to do after a failure, given the task's conflict tally
    /// including this failure
    pub fn decide(&self, error: &StoreError, retry_count: u32) -> RetryDecision {
        match self.classify(error) {
            Classification::NonRetryable if error.is_conflict() => {
                RetryDecision::Abort(AbortReason::Conflict)
            }
            Classification::NonRetryable => RetryDecision::Abort(AbortReason::Fatal),
            Classification::Retryable => match self.max_retries {
                Some(cap) if retry_count > cap => RetryDecision::Abort(AbortReason::RetryCapReached),
                _ => RetryDecision::Retry,
            },
        }
    }
}
