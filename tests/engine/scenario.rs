//! The classic experiment shape
//!
//! 30 tasks of 3 statements on 4 workers over 50,000 rows, with roughly a
//! fifth of the tasks issuing overlapping ranged writes.

use crate::common::*;
use contend::{run, Experiment};
use std::io::Write;
use std::time::{Duration, Instant};

fn classic() -> RunConfig {
    // Default workload; backoff scaled down so the test stays quick
    RunConfig::new().with_backoff_ms(10, 25)
}

#[test]
fn test_fair_mode_finishes_every_task() {
    let started = Instant::now();
    let report = run(&classic()).unwrap();

    assert_eq!(report.tasks_total, 30);
    assert_eq!(report.tasks_finished, 30);
    assert_eq!(report.tasks_aborted, 0);
    assert_eq!(report.workers, 4);
    assert_eq!(report.queries_per_task, 3);
    assert_no_double_commit(&report);
    assert!(started.elapsed() < Duration::from_secs(60));
}

#[test]
fn test_generated_workload_has_overlapping_writers() {
    let experiment = Experiment::prepare(&classic()).unwrap();
    let ranges: Vec<ValueRange> = experiment
        .tasks()
        .iter()
        .filter_map(|t| match &t.selection {
            Selection::Ranges(r) => Some(r.clone()),
            _ => None,
        })
        .flatten()
        .collect();

    assert!(!ranges.is_empty(), "default mix produces ranged writes");
    let overlapping = ranges
        .iter()
        .enumerate()
        .any(|(i, a)| ranges[i + 1..].iter().any(|b| a.overlaps(b)));
    assert!(overlapping);
}

#[test]
fn test_committed_writes_are_marked() {
    let experiment = Experiment::prepare(&classic()).unwrap();
    let report = experiment.run().unwrap();
    assert!(report.all_finished());

    let writers: Vec<i64> = experiment
        .tasks()
        .iter()
        .filter(|t| t.behavior.is_write())
        .map(|t| t.id.as_modifier())
        .collect();
    let table = experiment.coordinator().store();
    for row in table.rows() {
        assert!(
            row.modified_by == contend::UNMODIFIED || writers.contains(&row.modified_by),
            "row {} marked by a non-writer {}",
            row.id,
            row.modified_by
        );
    }
    assert_eq!(table.locked_rows(), 0);
}

#[test]
fn test_run_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "tasks = 8\nworkers = 2\nrows = 2000\nmode = \"retry\"\nbase_delay_ms = 1\nscale_factor_ms = 2"
    )
    .unwrap();

    let config = RunConfig::load(file.path()).unwrap();
    let report = run(&config).unwrap();
    assert_eq!(report.tasks_total, 8);
    assert_eq!(report.workers, 2);
    assert!(report.all_finished());
}

#[test]
fn test_report_json_omits_records() {
    let report = run(&fast_config().with_tasks(6)).unwrap();
    assert_eq!(report.records.len(), 6);

    let value: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["tasks_total"], 6);
    assert_eq!(value["mode"], "retry-with-fairness");
    assert!(value.get("records").is_none());
}

/// Same experiment with the default backoff (100ms + U(0, 4000ms) on 4 workers)
#[test]
#[ignore]
fn test_fair_mode_default_backoff() {
    let report = run(&RunConfig::new()).unwrap();
    assert_eq!(report.tasks_finished, 30);
}
