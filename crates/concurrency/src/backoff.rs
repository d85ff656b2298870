//! Randomized backoff and the interruptible wait that performs it
//!
//! After a retryable conflict the worker waits
//! `base_delay + uniform(0, worker_count * scale_factor)` before trying
//! again. The random part desynchronizes tasks that collided, and its spread
//! grows with the pool size so the chance of re-colliding stays bounded as
//! contention grows. `BackoffPolicy::fixed` drops the random part, which is
//! the fixed-delay retry variant that can livelock.
//!
//! The wait itself goes through [`Interrupt`], a per-worker interrupt
//! status. An interrupted wait returns early with
//! [`WaitOutcome::Interrupted`] and leaves the status set; the caller retries
//! immediately instead of treating the interruption as an error.

use std::time::{Duration, Instant};

use contend_core::RunConfig;
use parking_lot::{Condvar, Mutex};
use rand::Rng;

/// Computes the wait before a retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base_delay: Duration,
    spread: Duration,
}

impl BackoffPolicy {
    /// `base_delay + uniform(0, worker_count * scale_factor)`
    pub fn new(base_delay: Duration, worker_count: usize, scale_factor: Duration) -> Self {
        let workers = u32::try_from(worker_count).unwrap_or(u32::MAX);
        Self {
            base_delay,
            spread: scale_factor.saturating_mul(workers),
        }
    }

    /// Always wait exactly `base_delay`
    pub fn fixed(base_delay: Duration) -> Self {
        Self {
            base_delay,
            spread: Duration::ZERO,
        }
    }

    /// Policy described by a run configuration
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(
            config.base_delay(),
            config.workers,
            Duration::from_millis(config.scale_factor_ms),
        )
    }

    /// Fixed part of every wait
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Width of the random part
    pub fn spread(&self) -> Duration {
        self.spread
    }

    /// Upper bound (exclusive when randomized) of any delay
    pub fn max_delay(&self) -> Duration {
        self.base_delay.saturating_add(self.spread)
    }

    /// Draw the next delay, millisecond granularity
    pub fn next_delay<R: Rng>(&self, rng: &mut R) -> Duration {
        let spread_ms = u64::try_from(self.spread.as_millis()).unwrap_or(u64::MAX);
        let jitter = if spread_ms == 0 {
            0
        } else {
            rng.gen_range(0..spread_ms)
        };
        self.base_delay.saturating_add(Duration::from_millis(jitter))
    }
}

/// How a wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full interval passed
    Elapsed,
    /// The interrupt status was set before or during the wait
    Interrupted,
}

/// Interrupt status of one worker
///
/// Setting the status wakes a wait in progress. The status is sticky: waits
/// do not clear it, so every later wait also returns `Interrupted` until
/// [`Interrupt::clear`] is called.
#[derive(Debug, Default)]
pub struct Interrupt {
    flag: Mutex<bool>,
    wake: Condvar,
}

impl Interrupt {
    /// Create a status that is not interrupted
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the status and wake any wait in progress
    pub fn interrupt(&self) {
        *self.flag.lock() = true;
        self.wake.notify_all();
    }

    /// Whether the status is set
    pub fn is_interrupted(&self) -> bool {
        *self.flag.lock()
    }

    /// Clear the status, returning whether it was set
    pub fn clear(&self) -> bool {
        std::mem::replace(&mut *self.flag.lock(), false)
    }

    /// Wait for `duration` unless interrupted
    pub fn sleep(&self, duration: Duration) -> WaitOutcome {
        let deadline = Instant::now() + duration;
        let mut flag = self.flag.lock();
        loop {
            if *flag {
                return WaitOutcome::Interrupted;
            }
            if Instant::now() >= deadline {
                return WaitOutcome::Elapsed;
            }
            self.wake.wait_until(&mut flag, deadline);
        }
    }
}
