//! Worker pool and the per-task retry loop
//!
//! A fixed set of named threads drains one FIFO queue of tasks. Each worker
//! drives its current task to a fate before taking the next one:
//!
//! ```text
//! attempt ──Success──────────────────────────────▶ Finished
//!    │
//!    └─failure─▶ classify ──Abort────────────────▶ Aborted
//!                   │
//!                   └─Retry─▶ backoff wait ─▶ [fairness gate] ─▶ attempt
//! ```
//!
//! The gate is held only for the duration of a retry attempt. First attempts
//! never pass through it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use contend_concurrency::{
    AbortReason, AttemptOutcome, BackoffPolicy, ConflictClassifier, FairnessArbiter, Interrupt,
    RetryDecision, TransactionalUnit, WaitOutcome,
};
use contend_core::{BehaviorClass, ContendError, ContendResult, Store, StoreError, Task, TaskId};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info, trace, warn};

use crate::counters::OutcomeCounters;

/// Per-task retry bookkeeping, owned by the worker driving the task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    /// Conflicts observed by this task so far
    pub retry_count: u32,
    /// Most recent backoff delay
    pub last_delay: Duration,
}

/// How a task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFate {
    /// Committed; `finisher` is the post-increment `tasks_finished`
    Finished {
        /// 1-based completion order across the run
        finisher: u64,
    },
    /// Gave up without committing
    Aborted(AbortReason),
}

/// What happened to one task
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    /// Task id
    pub task: TaskId,
    /// Task behavior class
    pub behavior: BehaviorClass,
    /// Index of the worker that drove the task
    pub worker: usize,
    /// Final retry bookkeeping
    pub retry: RetryState,
    /// Outcome
    pub fate: TaskFate,
}

impl TaskRecord {
    /// Whether the task committed
    pub fn is_finished(&self) -> bool {
        matches!(self.fate, TaskFate::Finished { .. })
    }
}

/// Run-wide state visible to the handle as well as the workers
#[derive(Debug, Default)]
pub(crate) struct RunControl {
    stop: AtomicBool,
    pub(crate) counters: OutcomeCounters,
    records: Mutex<Vec<TaskRecord>>,
}

impl RunControl {
    pub(crate) fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    pub(crate) fn take_records(&self) -> Vec<TaskRecord> {
        let mut records = std::mem::take(&mut *self.records.lock());
        records.sort_by_key(|r| r.task);
        records
    }
}

/// Everything a worker needs to drive tasks
pub(crate) struct WorkerContext<S> {
    unit: Arc<TransactionalUnit<S>>,
    classifier: ConflictClassifier,
    backoff: BackoffPolicy,
    arbiter: Option<FairnessArbiter>,
    queue: Mutex<VecDeque<Task>>,
    seed: u64,
    pub(crate) control: Arc<RunControl>,
}

impl<S: Store> WorkerContext<S> {
    pub(crate) fn new(
        unit: Arc<TransactionalUnit<S>>,
        classifier: ConflictClassifier,
        backoff: BackoffPolicy,
        arbiter: Option<FairnessArbiter>,
        tasks: Vec<Task>,
        seed: u64,
    ) -> Self {
        Self {
            unit,
            classifier,
            backoff,
            arbiter,
            queue: Mutex::new(tasks.into()),
            seed,
            control: Arc::new(RunControl::default()),
        }
    }

    fn next_task(&self) -> Option<Task> {
        self.queue.lock().pop_front()
    }

    /// Drain the queue on the calling thread
    pub(crate) fn worker_loop(&self, worker: usize, interrupt: &Interrupt) {
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(worker as u64 + 1));
        debug!(target: "contend::worker", worker, "Worker started");

        while let Some(task) = self.next_task() {
            // Interrupt status does not carry over from the previous task
            interrupt.clear();

            let record = if self.control.stop_requested() {
                self.abort(&task, worker, RetryState::default(), AbortReason::Stopped, None)
            } else {
                // Lives outside the unwind boundary so a panic keeps the tally
                let mut state = RetryState::default();
                let driven = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    self.run_task(&task, worker, interrupt, &mut rng, &mut state)
                }));
                match driven {
                    Ok(record) => record,
                    Err(payload) => {
                        error!(
                            target: "contend::worker",
                            worker,
                            task = %task.id,
                            retries = state.retry_count,
                            "Task panicked: {}",
                            panic_message(payload.as_ref())
                        );
                        self.control.counters.record_fatal();
                        self.abort(&task, worker, state, AbortReason::Fatal, None)
                    }
                }
            };
            self.control.records.lock().push(record);
        }

        debug!(target: "contend::worker", worker, "Worker drained");
    }

    fn run_task(
        &self,
        task: &Task,
        worker: usize,
        interrupt: &Interrupt,
        rng: &mut StdRng,
        state: &mut RetryState,
    ) -> TaskRecord {
        let counters = &self.control.counters;
        let mut outcome = self.unit.attempt(task);

        loop {
            let error = match outcome {
                AttemptOutcome::Success(output) => {
                    let finisher = counters.record_finish();
                    info!(
                        target: "contend::worker",
                        worker,
                        task = %task.id,
                        behavior = %task.behavior,
                        finisher,
                        retries = state.retry_count,
                        ?output,
                        "Task finished"
                    );
                    return TaskRecord {
                        task: task.id,
                        behavior: task.behavior,
                        worker,
                        retry: *state,
                        fate: TaskFate::Finished { finisher },
                    };
                }
                AttemptOutcome::Conflict(error) => {
                    state.retry_count += 1;
                    counters.record_conflict(state.retry_count);
                    error
                }
                AttemptOutcome::Fatal(error) => {
                    counters.record_fatal();
                    error
                }
            };

            if let RetryDecision::Abort(reason) = self.classifier.decide(&error, state.retry_count) {
                return self.abort(task, worker, *state, reason, Some(&error));
            }
            if self.control.stop_requested() {
                return self.abort(task, worker, *state, AbortReason::Stopped, Some(&error));
            }

            let delay = self.backoff.next_delay(rng);
            state.last_delay = delay;
            debug!(
                target: "contend::worker",
                worker,
                task = %task.id,
                retries = state.retry_count,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Conflict, backing off"
            );
            if interrupt.sleep(delay) == WaitOutcome::Interrupted {
                counters.record_interrupted_wait();
                debug!(target: "contend::worker", worker, task = %task.id, "Backoff interrupted, retrying now");
            }
            if self.control.stop_requested() {
                return self.abort(task, worker, *state, AbortReason::Stopped, Some(&error));
            }

            outcome = match &self.arbiter {
                Some(arbiter) => {
                    let gate = arbiter.acquire();
                    if self.control.stop_requested() {
                        drop(gate);
                        return self.abort(task, worker, *state, AbortReason::Stopped, Some(&error));
                    }
                    trace!(target: "contend::worker", worker, task = %task.id, ticket = gate.ticket(), "Retrying under gate");
                    self.unit.attempt(task)
                }
                None => self.unit.attempt(task),
            };
        }
    }

    fn abort(
        &self,
        task: &Task,
        worker: usize,
        state: RetryState,
        reason: AbortReason,
        error: Option<&StoreError>,
    ) -> TaskRecord {
        self.control.counters.record_abort();
        match error {
            Some(error) => warn!(
                target: "contend::worker",
                worker,
                task = %task.id,
                retries = state.retry_count,
                %reason,
                error = %error,
                "Task aborted"
            ),
            None => warn!(target: "contend::worker", worker, task = %task.id, %reason, "Task aborted"),
        }
        TaskRecord {
            task: task.id,
            behavior: task.behavior,
            worker,
            retry: state,
            fate: TaskFate::Aborted(reason),
        }
    }
}

/// Text of a panic payload: `panic!("literal")` carries a `&str`,
/// formatted panics a `String`
fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("(non-string panic)")
}

/// Fixed set of named worker threads draining one task queue
pub(crate) struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    interrupts: Vec<Arc<Interrupt>>,
}

impl WorkerPool {
    /// Spawn `workers` threads named `contend-worker-{i}`
    ///
    /// If a thread cannot be spawned, the run is stopped, the threads
    /// already started are joined, and the spawn error is returned.
    pub(crate) fn start<S: Store + 'static>(
        context: Arc<WorkerContext<S>>,
        workers: usize,
    ) -> ContendResult<Self> {
        let mut pool = Self {
            handles: Vec::with_capacity(workers),
            interrupts: Vec::with_capacity(workers),
        };

        for i in 0..workers {
            let interrupt = Arc::new(Interrupt::new());
            let context_clone = Arc::clone(&context);
            let interrupt_clone = Arc::clone(&interrupt);
            let spawned = std::thread::Builder::new()
                .name(format!("contend-worker-{}", i))
                .spawn(move || context_clone.worker_loop(i, &interrupt_clone));

            match spawned {
                Ok(handle) => {
                    pool.handles.push(handle);
                    pool.interrupts.push(interrupt);
                }
                Err(e) => {
                    error!(target: "contend::run", worker = i, error = %e, "Failed to spawn worker thread");
                    context.control.request_stop();
                    pool.interrupt_all();
                    let _ = pool.join();
                    return Err(ContendError::Io(e));
                }
            }
        }
        Ok(pool)
    }

    /// Number of worker threads
    pub(crate) fn size(&self) -> usize {
        self.handles.len()
    }

    /// Set every worker's interrupt status
    pub(crate) fn interrupt_all(&self) {
        for interrupt in &self.interrupts {
            interrupt.interrupt();
        }
    }

    /// Whether every worker has exited
    pub(crate) fn is_finished(&self) -> bool {
        self.handles.iter().all(|h| h.is_finished())
    }

    /// Wait for every worker to exit
    pub(crate) fn join(self) -> ContendResult<()> {
        let mut panicked = None;
        for handle in self.handles {
            let name = handle.thread().name().unwrap_or("contend-worker").to_string();
            if handle.join().is_err() && panicked.is_none() {
                panicked = Some(name);
            }
        }
        match panicked {
            Some(name) => Err(ContendError::WorkerPanicked(name)),
            None => Ok(()),
        }
    }
}
