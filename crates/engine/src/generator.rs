//! Task generation
//!
//! The whole task population is built before execution starts, from a single
//! seeded `StdRng`, so two runs with the same config issue the same tasks in
//! the same order. Task ids start at 1: 0 is the unmodified sentinel in
//! `modified_by`.

use contend_core::{
    BehaviorClass, ContendResult, RowId, RunConfig, Selection, Task, TaskId, ValueRange,
    WorkloadMix,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Deterministic source of workload tasks
#[derive(Debug)]
pub struct TaskGenerator {
    rng: StdRng,
    rows: u32,
    max_value: f64,
    queries_per_task: usize,
    mix: WorkloadMix,
}

impl TaskGenerator {
    /// Generator for the workload a config describes
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the config fails validation, in
    /// particular when more distinct keys per task are requested than the
    /// table has rows.
    pub fn new(config: &RunConfig) -> ContendResult<Self> {
        config.validate()?;
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            rows: config.rows,
            max_value: config.max_value,
            queries_per_task: config.queries_per_task,
            mix: config.mix,
        })
    }

    /// Draw the next task
    pub fn next_task(&mut self, id: TaskId) -> Task {
        let p: f64 = self.rng.gen();
        let behavior = self.mix.pick(p);

        let selection = match behavior {
            BehaviorClass::PointRead | BehaviorClass::PointWrite => Selection::Keys(self.keys()),
            BehaviorClass::RangeWrite => Selection::Ranges(self.ranges()),
            BehaviorClass::RangeScan => Selection::FullTable,
        };
        let new_values = if behavior.is_write() {
            (0..self.queries_per_task)
                .map(|_| self.rng.gen::<f64>() * self.max_value)
                .collect()
        } else {
            Vec::new()
        };

        Task {
            id,
            behavior,
            selection,
            new_values,
        }
    }

    /// Draw `count` tasks with ids `1..=count`
    ///
    /// Ids are `u32`; at most `u32::MAX` tasks are drawn.
    pub fn generate(&mut self, count: usize) -> Vec<Task> {
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        let tasks: Vec<Task> = (1..=count)
            .map(|i| self.next_task(TaskId(i)))
            .collect();
        debug!(target: "contend::run", tasks = tasks.len(), "Tasks generated");
        tasks
    }

    fn keys(&mut self) -> Vec<RowId> {
        let mut keys = Vec::with_capacity(self.queries_per_task);
        while keys.len() < self.queries_per_task {
            let key = RowId(self.rng.gen_range(0..self.rows));
            // Reject and resample duplicates
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    fn ranges(&mut self) -> Vec<ValueRange> {
        (0..self.queries_per_task)
            .map(|_| {
                let high = self.rng.gen::<f64>() * self.max_value;
                let low = self.rng.gen::<f64>() * high;
                ValueRange::new(low, high)
            })
            .collect()
    }
}

/// Generate the full task population of a config
pub fn generate_tasks(config: &RunConfig) -> ContendResult<Vec<Task>> {
    Ok(TaskGenerator::new(config)?.generate(config.tasks))
}
