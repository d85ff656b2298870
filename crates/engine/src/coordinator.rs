//! Run coordinator
//!
//! The coordinator owns the store handle and the run configuration. Each
//! run gets fresh counters, a fresh fairness arbiter and its own worker
//! pool, so one coordinator can execute several runs back to back against
//! the same store.
//!
//! - `run` dispatches tasks to the pool and blocks until all are done
//! - `spawn` returns a [`RunHandle`] for interrupting or stopping a run
//! - `run_serial` is the sequential baseline: same tasks, calling thread only

use std::sync::Arc;
use std::time::Instant;

use contend_concurrency::{BackoffPolicy, ConflictClassifier, FairnessArbiter, Interrupt, TransactionalUnit};
use contend_core::{ContendResult, RunConfig, Store, Task};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::counters::CounterSnapshot;
use crate::pool::{RunControl, TaskRecord, WorkerContext, WorkerPool};

/// Label used in reports for the sequential baseline
pub const SERIAL_MODE: &str = "serial";

/// Summary of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Tasks submitted
    pub tasks_total: u64,
    /// Tasks committed
    pub tasks_finished: u64,
    /// Tasks that gave up without committing
    pub tasks_aborted: u64,
    /// Conflict occurrences across all tasks
    pub deadlock_count: u64,
    /// Highest per-task conflict tally
    pub max_retry_count: u32,
    /// Non-conflict store failures
    pub fatal_failures: u64,
    /// Backoff waits cut short by an interrupt
    pub interrupted_waits: u64,
    /// Wall-clock duration of the run
    pub elapsed_millis: u64,
    /// Operating mode label, or `"serial"` for the baseline
    pub mode: String,
    /// Worker threads used
    pub workers: usize,
    /// Statements per task
    pub queries_per_task: usize,
    /// Per-task outcomes, ordered by task id
    #[serde(skip)]
    pub records: Vec<TaskRecord>,
}

impl RunReport {
    fn build(
        counters: CounterSnapshot,
        records: Vec<TaskRecord>,
        tasks_total: usize,
        started: Instant,
        mode: String,
        workers: usize,
        queries_per_task: usize,
    ) -> Self {
        Self {
            tasks_total: tasks_total as u64,
            tasks_finished: counters.tasks_finished,
            tasks_aborted: counters.tasks_aborted,
            deadlock_count: counters.deadlock_count,
            max_retry_count: counters.max_retry_count,
            fatal_failures: counters.fatal_failures,
            interrupted_waits: counters.interrupted_waits,
            elapsed_millis: started.elapsed().as_millis() as u64,
            mode,
            workers,
            queries_per_task,
            records,
        }
    }

    /// Whether every submitted task committed
    pub fn all_finished(&self) -> bool {
        self.tasks_finished == self.tasks_total
    }

    /// Whether every task is accounted for as finished or aborted
    pub fn is_complete(&self) -> bool {
        self.tasks_finished + self.tasks_aborted == self.tasks_total
    }
}

/// Executes task populations against a store
#[derive(Debug)]
pub struct Coordinator<S> {
    unit: Arc<TransactionalUnit<S>>,
    config: RunConfig,
}

impl<S: Store + 'static> Coordinator<S> {
    /// Coordinator running against `store` as `config` describes
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the config fails validation.
    pub fn new(store: S, config: RunConfig) -> ContendResult<Self> {
        config.validate()?;
        Ok(Self {
            unit: Arc::new(TransactionalUnit::new(store)),
            config,
        })
    }

    /// The store tasks run against
    pub fn store(&self) -> &S {
        self.unit.store()
    }

    /// The run configuration
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    fn context(&self, tasks: &[Task], arbiter: Option<FairnessArbiter>) -> WorkerContext<S> {
        WorkerContext::new(
            Arc::clone(&self.unit),
            ConflictClassifier::from_config(&self.config),
            BackoffPolicy::from_config(&self.config),
            arbiter,
            tasks.to_vec(),
            self.config.seed,
        )
    }

    /// Start a run on the worker pool and return immediately
    ///
    /// # Errors
    ///
    /// Returns `Io` if a worker thread cannot be spawned.
    pub fn spawn(&self, tasks: &[Task]) -> ContendResult<RunHandle> {
        let mode = self.config.mode;
        let arbiter = mode.uses_arbiter().then(FairnessArbiter::new);
        let context = Arc::new(self.context(tasks, arbiter));
        let control = Arc::clone(&context.control);

        info!(
            target: "contend::run",
            tasks = tasks.len(),
            workers = self.config.workers,
            %mode,
            "Run started"
        );
        let started = Instant::now();
        let pool = WorkerPool::start(context, self.config.workers)?;

        Ok(RunHandle {
            pool,
            control,
            started,
            tasks_total: tasks.len(),
            mode: mode.to_string(),
            queries_per_task: self.config.queries_per_task,
        })
    }

    /// Execute `tasks` on the worker pool and wait for all of them
    pub fn run(&self, tasks: &[Task]) -> ContendResult<RunReport> {
        self.spawn(tasks)?.join()
    }

    /// Execute `tasks` one after another on the calling thread
    ///
    /// The sequential baseline: the same tasks and counters, no pool and no
    /// fairness gate. With a single transaction open at a time the reference
    /// store reports no conflicts.
    pub fn run_serial(&self, tasks: &[Task]) -> ContendResult<RunReport> {
        let context = self.context(tasks, None);
        info!(target: "contend::run", tasks = tasks.len(), "Serial run started");
        let started = Instant::now();

        context.worker_loop(0, &Interrupt::new());

        let report = RunReport::build(
            context.control.counters.snapshot(),
            context.control.take_records(),
            tasks.len(),
            started,
            SERIAL_MODE.to_string(),
            1,
            self.config.queries_per_task,
        );
        log_report(&report);
        Ok(report)
    }
}

/// Handle to a run in progress
pub struct RunHandle {
    pool: WorkerPool,
    control: Arc<RunControl>,
    started: Instant,
    tasks_total: usize,
    mode: String,
    queries_per_task: usize,
}

impl RunHandle {
    /// Interrupt every worker's backoff wait
    ///
    /// A worker waiting out a backoff delay retries at once. The interrupt
    /// status stays set for the rest of the worker's current task.
    pub fn interrupt_workers(&self) {
        info!(target: "contend::run", "Interrupting workers");
        self.pool.interrupt_all();
    }

    /// Ask the workers to stop retrying
    ///
    /// Attempts already running complete normally. Tasks that would retry,
    /// and tasks still queued, are aborted with reason `Stopped`.
    pub fn stop(&self) {
        info!(target: "contend::run", "Stop requested");
        self.control.request_stop();
        self.pool.interrupt_all();
    }

    /// Current counter values
    pub fn counters(&self) -> CounterSnapshot {
        self.control.counters.snapshot()
    }

    /// Whether every worker has exited
    pub fn is_finished(&self) -> bool {
        self.pool.is_finished()
    }

    /// Wait for every worker and summarize the run
    ///
    /// # Errors
    ///
    /// Returns `WorkerPanicked` if a worker thread died.
    pub fn join(self) -> ContendResult<RunReport> {
        let workers = self.pool.size();
        self.pool.join()?;

        let report = RunReport::build(
            self.control.counters.snapshot(),
            self.control.take_records(),
            self.tasks_total,
            self.started,
            self.mode,
            workers,
            self.queries_per_task,
        );
        log_report(&report);
        Ok(report)
    }
}

fn log_report(report: &RunReport) {
    info!(
        target: "contend::run",
        finished = report.tasks_finished,
        aborted = report.tasks_aborted,
        total = report.tasks_total,
        deadlocks = report.deadlock_count,
        max_retries = report.max_retry_count,
        elapsed_ms = report.elapsed_millis,
        mode = %report.mode,
        "Run finished"
    );
}
