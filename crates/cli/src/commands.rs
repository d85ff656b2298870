//! Clap command tree definition.

use clap::{Arg, ArgAction, Command};

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("contend")
        .about("Run a contended transactional workload and report how it resolves")
        .subcommand_required(false)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Run configuration file (default: ./contend.toml if present)"),
        )
        .arg(
            Arg::new("tasks")
                .long("tasks")
                .value_name("N")
                .value_parser(clap::value_parser!(usize))
                .help("Number of tasks (default: 30)"),
        )
        .arg(
            Arg::new("queries")
                .long("queries")
                .value_name("K")
                .value_parser(clap::value_parser!(usize))
                .help("Statements per task (default: 3)"),
        )
        .arg(
            Arg::new("workers")
                .long("workers")
                .value_name("N")
                .value_parser(clap::value_parser!(usize))
                .help("Worker threads (default: 4)"),
        )
        .arg(
            Arg::new("rows")
                .long("rows")
                .value_name("N")
                .value_parser(clap::value_parser!(u32))
                .help("Rows in the shared table (default: 50000)"),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .value_parser([
                    "abort",
                    "retry",
                    "fair",
                    "serial",
                    "abort-on-conflict",
                    "retry-with-fairness",
                ])
                .help("Reaction to conflicts, or the sequential baseline (default: fair)"),
        )
        .arg(
            Arg::new("mix")
                .long("mix")
                .value_parser(["mixed", "point-writes", "range-writes"])
                .help("Workload mix preset (default: mixed)"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_parser(clap::value_parser!(u64))
                .help("Seed for population, tasks and backoff (default: 123456)"),
        )
        .arg(
            Arg::new("base-delay-ms")
                .long("base-delay-ms")
                .value_name("MS")
                .value_parser(clap::value_parser!(u64))
                .help("Fixed part of every backoff wait (default: 100)"),
        )
        .arg(
            Arg::new("scale-ms")
                .long("scale-ms")
                .value_name("MS")
                .value_parser(clap::value_parser!(u64))
                .help("Backoff jitter per worker (default: 1000)"),
        )
        .arg(
            Arg::new("max-retries")
                .long("max-retries")
                .value_name("N")
                .value_parser(clap::value_parser!(u32))
                .help("Abort a task after this many retries (default: unlimited)"),
        )
        .arg(
            Arg::new("lock-timeout-ms")
                .long("lock-timeout-ms")
                .value_name("MS")
                .value_parser(clap::value_parser!(u64))
                .help("How long a blocked row lock waits before failing (default: 50)"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("JSON output mode")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log task progress (-v), retries and backoff (-vv)")
                .action(ArgAction::Count),
        )
        .subcommand(
            Command::new("config").about("Print the default contend.toml and exit"),
        )
}
