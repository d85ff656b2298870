//! One-call experiment runs against the in-memory reference table
//!
//! Populates a fresh [`TableStore`], generates the task population and runs
//! it, all from a single [`RunConfig`]. The population and the tasks share
//! the config seed, so an experiment is reproducible up to thread timing.

use contend_core::{ContendResult, RunConfig, Task};
use contend_storage::{populate, TableStore};

use crate::coordinator::{Coordinator, RunReport};
use crate::generator::generate_tasks;

/// A populated table plus the tasks to run against it
#[derive(Debug)]
pub struct Experiment {
    coordinator: Coordinator<TableStore>,
    tasks: Vec<Task>,
}

impl Experiment {
    /// Populate the table and generate tasks
    pub fn prepare(config: &RunConfig) -> ContendResult<Self> {
        config.validate()?;
        let store = TableStore::new(config.lock_wait_timeout());
        populate(&store, config.rows, config.max_value, config.seed);
        let tasks = generate_tasks(config)?;
        Ok(Self {
            coordinator: Coordinator::new(store, config.clone())?,
            tasks,
        })
    }

    /// The generated tasks
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// The coordinator, for access to the table
    pub fn coordinator(&self) -> &Coordinator<TableStore> {
        &self.coordinator
    }

    /// Run on the worker pool
    pub fn run(&self) -> ContendResult<RunReport> {
        self.coordinator.run(&self.tasks)
    }

    /// Run the sequential baseline
    pub fn run_serial(&self) -> ContendResult<RunReport> {
        self.coordinator.run_serial(&self.tasks)
    }
}

/// Populate, generate and run on the worker pool
pub fn run(config: &RunConfig) -> ContendResult<RunReport> {
    Experiment::prepare(config)?.run()
}

/// Populate, generate and run the sequential baseline
pub fn run_serial(config: &RunConfig) -> ContendResult<RunReport> {
    Experiment::prepare(config)?.run_serial()
}
