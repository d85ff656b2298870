//! Run configuration via `contend.toml`
//!
//! A run is fully described by [`RunConfig`]: workload shape, pool size,
//! operating mode, backoff constants and the reference store's parameters.
//! Every field has a default matching the classic experiment (30 tasks,
//! 3 statements each, 4 workers, 50,000 rows), so a config file only needs
//! the fields it changes.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{ContendError, ContendResult};
use crate::types::BehaviorClass;

/// Config file name looked up by the harness when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "contend.toml";

/// How the engine reacts to a conflict failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// Roll back and abort the task on its first conflict
    #[serde(alias = "abort", alias = "abort-on-conflict")]
    AbortOnConflict,
    /// Roll back, back off and retry, with no admission control
    Retry,
    /// Roll back, back off, pass the FIFO fairness gate, then retry
    #[default]
    #[serde(alias = "fair", alias = "retry-with-fairness")]
    RetryWithFairness,
}

impl OperatingMode {
    /// Whether conflicts lead to another attempt
    pub fn retries(&self) -> bool {
        !matches!(self, OperatingMode::AbortOnConflict)
    }

    /// Whether retries pass through the fairness arbiter
    pub fn uses_arbiter(&self) -> bool {
        matches!(self, OperatingMode::RetryWithFairness)
    }

    /// Parse a mode name: the short CLI name, the TOML name, or the
    /// report label
    pub fn parse(s: &str) -> ContendResult<Self> {
        match s {
            "abort" | "abort_on_conflict" | "abort-on-conflict" => {
                Ok(OperatingMode::AbortOnConflict)
            }
            "retry" => Ok(OperatingMode::Retry),
            "fair" | "retry_with_fairness" | "retry-with-fairness" => {
                Ok(OperatingMode::RetryWithFairness)
            }
            other => Err(ContendError::invalid_config(format!(
                "unknown operating mode '{}'. Expected \"abort\", \"retry\" or \"fair\".",
                other
            ))),
        }
    }
}

impl std::fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperatingMode::AbortOnConflict => f.write_str("abort-on-conflict"),
            OperatingMode::Retry => f.write_str("retry"),
            OperatingMode::RetryWithFairness => f.write_str("retry-with-fairness"),
        }
    }
}

/// Upper bound of the fixed backoff part and of the jitter spread (one hour)
pub const MAX_BACKOFF_MS: u64 = 3_600_000;

/// Probability weights of each behavior class
///
/// Weights are matched against a uniform draw in `[0, 1)` in the order
/// point read, range scan, range write, point write.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkloadMix {
    /// Weight of multi-point reads
    #[serde(default)]
    pub point_read: f64,
    /// Weight of full-table aggregate reads
    #[serde(default)]
    pub range_scan: f64,
    /// Weight of ranged updates
    #[serde(default)]
    pub range_write: f64,
    /// Weight of updates by row id
    #[serde(default)]
    pub point_write: f64,
}

impl Default for WorkloadMix {
    fn default() -> Self {
        Self::mixed()
    }
}

impl WorkloadMix {
    /// ~70% point reads, ~10% full scans, ~20% ranged writes
    pub fn mixed() -> Self {
        Self {
            point_read: 0.7,
            range_scan: 0.1,
            range_write: 0.2,
            point_write: 0.0,
        }
    }

    /// ~70% point reads, ~10% full scans, ~20% writes by row id
    pub fn mixed_point_writes() -> Self {
        Self {
            point_read: 0.7,
            range_scan: 0.1,
            range_write: 0.0,
            point_write: 0.2,
        }
    }

    /// Every task is a ranged write
    pub fn range_writes_only() -> Self {
        Self {
            point_read: 0.0,
            range_scan: 0.0,
            range_write: 1.0,
            point_write: 0.0,
        }
    }

    /// Parse the preset names used on the command line
    pub fn preset(name: &str) -> ContendResult<Self> {
        match name {
            "mixed" => Ok(Self::mixed()),
            "point-writes" | "point_writes" => Ok(Self::mixed_point_writes()),
            "range-writes" | "range_writes" => Ok(Self::range_writes_only()),
            other => Err(ContendError::invalid_config(format!(
                "unknown workload mix '{}'. Expected \"mixed\", \"point-writes\" or \"range-writes\".",
                other
            ))),
        }
    }

    /// Sum of all weights
    pub fn total(&self) -> f64 {
        self.point_read + self.range_scan + self.range_write + self.point_write
    }

    /// Map a uniform draw `p ∈ [0, 1)` onto a behavior class
    ///
    /// Draws past the cumulative total (rounding) fall to the last class
    /// with a non-zero weight.
    pub fn pick(&self, p: f64) -> BehaviorClass {
        let classes = [
            (BehaviorClass::PointRead, self.point_read),
            (BehaviorClass::RangeScan, self.range_scan),
            (BehaviorClass::RangeWrite, self.range_write),
            (BehaviorClass::PointWrite, self.point_write),
        ];

        let mut cumulative = 0.0;
        let mut last = BehaviorClass::PointRead;
        for (class, weight) in classes {
            if weight <= 0.0 {
                continue;
            }
            cumulative += weight;
            last = class;
            if p < cumulative {
                return class;
            }
        }
        last
    }

    fn validate(&self) -> ContendResult<()> {
        let weights = [
            self.point_read,
            self.range_scan,
            self.range_write,
            self.point_write,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ContendError::invalid_config(
                "workload weights must be finite and non-negative",
            ));
        }
        if (self.total() - 1.0).abs() > 1e-6 {
            return Err(ContendError::invalid_config(format!(
                "workload weights must sum to 1.0, got {}",
                self.total()
            )));
        }
        Ok(())
    }
}

/// Full description of one run
///
/// # Example
///
/// ```toml
/// tasks = 30
/// queries_per_task = 3
/// workers = 4
/// mode = "retry_with_fairness"   # or "abort_on_conflict", "retry"
///
/// [mix]
/// point_read = 0.7
/// range_scan = 0.1
/// range_write = 0.2
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of tasks generated up front
    pub tasks: usize,
    /// Statements (K) per task
    pub queries_per_task: usize,
    /// Worker pool size; keep constant across compared runs
    pub workers: usize,
    /// Rows in the shared table
    pub rows: u32,
    /// Exclusive upper bound of row values
    pub max_value: f64,
    /// Reaction to conflicts
    pub mode: OperatingMode,
    /// Seed of the task generator, population and backoff jitter
    pub seed: u64,
    /// Fixed part of every backoff wait
    pub base_delay_ms: u64,
    /// Jitter spread per worker; spread = workers * scale_factor_ms
    pub scale_factor_ms: u64,
    /// Optional cap on retries per task (none in the fairness design)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    /// Reference store: how long a blocked row-lock wait lasts before failing
    pub lock_wait_timeout_ms: u64,
    /// Behavior class distribution (kept last: serialized as a TOML table)
    pub mix: WorkloadMix,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tasks: 30,
            queries_per_task: 3,
            workers: 4,
            rows: 50_000,
            max_value: 50.0,
            mode: OperatingMode::default(),
            seed: 123_456,
            base_delay_ms: 100,
            scale_factor_ms: 1000,
            max_retries: None,
            lock_wait_timeout_ms: 50,
            mix: WorkloadMix::default(),
        }
    }
}

impl RunConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of tasks
    pub fn with_tasks(mut self, tasks: usize) -> Self {
        self.tasks = tasks;
        self
    }

    /// Set statements per task
    pub fn with_queries_per_task(mut self, queries: usize) -> Self {
        self.queries_per_task = queries;
        self
    }

    /// Set the worker pool size
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the table size
    pub fn with_rows(mut self, rows: u32) -> Self {
        self.rows = rows;
        self
    }

    /// Set the workload mix
    pub fn with_mix(mut self, mix: WorkloadMix) -> Self {
        self.mix = mix;
        self
    }

    /// Set the operating mode
    pub fn with_mode(mut self, mode: OperatingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set backoff constants
    pub fn with_backoff_ms(mut self, base_delay_ms: u64, scale_factor_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self.scale_factor_ms = scale_factor_ms;
        self
    }

    /// Cap retries per task
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set the reference store's lock-wait timeout
    pub fn with_lock_wait_timeout_ms(mut self, ms: u64) -> Self {
        self.lock_wait_timeout_ms = ms;
        self
    }

    /// Fixed part of the backoff wait
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Lock-wait timeout as a duration
    pub fn lock_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_wait_timeout_ms)
    }

    /// Check the config describes a runnable experiment
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> ContendResult<()> {
        if self.workers == 0 {
            return Err(ContendError::invalid_config("workers must be at least 1"));
        }
        if u32::try_from(self.tasks).is_err() {
            return Err(ContendError::invalid_config(format!(
                "tasks must be at most {}",
                u32::MAX
            )));
        }
        if self.base_delay_ms > MAX_BACKOFF_MS {
            return Err(ContendError::invalid_config(format!(
                "base_delay_ms must be at most {}",
                MAX_BACKOFF_MS
            )));
        }
        let spread = u64::try_from(self.workers)
            .ok()
            .and_then(|w| w.checked_mul(self.scale_factor_ms));
        if !spread.is_some_and(|ms| ms <= MAX_BACKOFF_MS) {
            return Err(ContendError::invalid_config(format!(
                "workers * scale_factor_ms must be at most {}",
                MAX_BACKOFF_MS
            )));
        }
        if self.queries_per_task == 0 {
            return Err(ContendError::invalid_config(
                "queries_per_task must be at least 1",
            ));
        }
        if self.rows == 0 {
            return Err(ContendError::invalid_config("rows must be at least 1"));
        }
        if !(self.max_value.is_finite() && self.max_value > 0.0) {
            return Err(ContendError::invalid_config(
                "max_value must be a positive finite number",
            ));
        }
        let needs_keys = self.mix.point_read > 0.0 || self.mix.point_write > 0.0;
        if needs_keys && self.queries_per_task > self.rows as usize {
            return Err(ContendError::invalid_config(format!(
                "queries_per_task ({}) exceeds rows ({}); distinct keys cannot be drawn",
                self.queries_per_task, self.rows
            )));
        }
        self.mix.validate()
    }

    /// Parse a config from TOML text and validate it
    pub fn from_toml_str(text: &str) -> ContendResult<Self> {
        let config: RunConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> ContendResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> ContendResult<String> {
        toml::to_string(self).map_err(|e| ContendError::ConfigParse(e.to_string()))
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# contend run configuration
#
# Workload
tasks = 30
queries_per_task = 3
rows = 50000
max_value = 50.0
seed = 123456

# Keep the pool size constant across compared runs.
workers = 4

# "abort_on_conflict", "retry" or "retry_with_fairness"
mode = "retry_with_fairness"

# Backoff: base_delay_ms + uniform(0, workers * scale_factor_ms)
base_delay_ms = 100
scale_factor_ms = 1000
# max_retries = 10              # optional, unbounded by default

# Reference store: blocked row-lock waits fail after this long
lock_wait_timeout_ms = 50

[mix]
point_read = 0.7
range_scan = 0.1
range_write = 0.2
point_write = 0.0
"#
    }
}
