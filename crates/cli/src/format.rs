//! RunReport → human/json string formatting.
//!
//! - **Human** (default): the classic summary lines
//! - **JSON** (`--json`): `serde_json::to_string_pretty`

use contend_core::ContendError;
use contend_engine::RunReport;

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Format a finished run.
pub fn format_report(report: &RunReport, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::to_string_pretty(report)
            .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e)),
        OutputMode::Human => format_human(report),
    }
}

fn format_human(report: &RunReport) -> String {
    let mut lines = vec![
        format!(
            "[DONE] Task execution after roughly {} ms finished: {} of {}",
            report.elapsed_millis, report.tasks_finished, report.tasks_total
        ),
        format!("Mode: {}", report.mode),
        format!("Deadlocks observed: {}", report.deadlock_count),
        format!("Max number of retries for a task: {}", report.max_retry_count),
    ];
    if report.tasks_aborted > 0 {
        lines.push(format!("Tasks aborted: {}", report.tasks_aborted));
    }
    if report.fatal_failures > 0 {
        lines.push(format!("Fatal failures: {}", report.fatal_failures));
    }
    if report.interrupted_waits > 0 {
        lines.push(format!("Interrupted waits: {}", report.interrupted_waits));
    }
    lines.push(format!(
        "Number of queries per task: {}",
        report.queries_per_task
    ));
    lines.push(format!("Number of Threads: {}", report.workers));
    lines.join("\n")
}

/// Format an error.
pub fn format_error(err: &ContendError, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::to_string_pretty(&serde_json::json!({
            "error": err.to_string()
        }))
        .unwrap_or_else(|_| format!("{{\"error\": \"{}\"}}", err)),
        OutputMode::Human => format!("(error) {}", err),
    }
}
