//! Fairness arbiter: FIFO admission gate for retry attempts
//!
//! A ticket lock shared by the whole run. A task that observed a conflict
//! takes a ticket after its backoff wait and is admitted when `now_serving`
//! reaches that ticket; grant order is arrival order, regardless of how many
//! times the task has retried. The returned guard releases the gate on drop,
//! so every exit path of the retry attempt (success, another conflict, a
//! fatal error, a panic) hands the gate to the next ticket.
//!
//! Only retries pass through the gate. First attempts stay fully parallel.
//!
//! Any waiter's delay is bounded by the number of tickets issued before its
//! own, times the length of one attempt.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Condvar, Mutex};
use tracing::trace;

#[derive(Debug, Default)]
struct TicketState {
    next_ticket: u64,
    now_serving: u64,
}

/// Process-wide FIFO gate
#[derive(Debug, Default)]
pub struct FairnessArbiter {
    state: Mutex<TicketState>,
    turn: Condvar,
    grants: AtomicU64,
}

impl FairnessArbiter {
    /// Create an idle arbiter
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until it is the caller's turn, in arrival order
    pub fn acquire(&self) -> ArbiterGuard<'_> {
        let mut state = self.state.lock();
        let ticket = state.next_ticket;
        state.next_ticket += 1;

        while state.now_serving != ticket {
            self.turn.wait(&mut state);
        }
        drop(state);

        self.grants.fetch_add(1, Ordering::Relaxed);
        trace!(target: "contend::arbiter", ticket, "Gate granted");
        ArbiterGuard {
            arbiter: self,
            ticket,
        }
    }

    fn release(&self, ticket: u64) {
        {
            let mut state = self.state.lock();
            debug_assert_eq!(state.now_serving, ticket);
            state.now_serving += 1;
        }
        // Every waiter re-checks its own ticket; only the next one proceeds.
        self.turn.notify_all();
        trace!(target: "contend::arbiter", ticket, "Gate released");
    }

    /// Tickets issued and not yet released (holder plus waiters)
    pub fn outstanding(&self) -> u64 {
        let state = self.state.lock();
        state.next_ticket - state.now_serving
    }

    /// Tasks waiting for the gate, not counting the holder
    pub fn queue_len(&self) -> u64 {
        self.outstanding().saturating_sub(1)
    }

    /// Whether some task currently holds the gate or waits for it
    pub fn is_busy(&self) -> bool {
        self.outstanding() > 0
    }

    /// Total admissions granted
    pub fn grants(&self) -> u64 {
        self.grants.load(Ordering::Relaxed)
    }
}

/// Exclusive hold on the arbiter; released on drop
#[derive(Debug)]
#[must_use = "the gate is released as soon as the guard is dropped"]
pub struct ArbiterGuard<'a> {
    arbiter: &'a FairnessArbiter,
    ticket: u64,
}

impl ArbiterGuard<'_> {
    /// Position of this admission in the global FIFO order
    pub fn ticket(&self) -> u64 {
        self.ticket
    }
}

impl Drop for ArbiterGuard<'_> {
    fn drop(&mut self) {
        self.arbiter.release(self.ticket);
    }
}
