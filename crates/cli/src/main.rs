//! contend CLI: run a contended workload and print how it resolved.
//!
//! - `contend [flags]`: populate, generate, run, print the summary
//! - `contend --mode serial`: the sequential baseline over the same tasks
//! - `contend config`: print the default `contend.toml`

mod commands;
mod format;
mod parse;

use std::process;

use contend_core::RunConfig;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{format_error, format_report, OutputMode};
use parse::{exit_code, matches_to_action, CliAction};

fn main() {
    let matches = build_cli().get_matches();

    let output_mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };
    init_tracing(matches.get_count("verbose"));

    let action = match matches_to_action(&matches) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("{}", format_error(&e, output_mode));
            process::exit(exit_code(&e));
        }
    };

    let result = match action {
        CliAction::PrintConfig => {
            print!("{}", RunConfig::default_toml());
            return;
        }
        CliAction::Run(config) => {
            debug!(target: "contend::run", ?config, "Configuration resolved");
            contend_engine::run(&config)
        }
        CliAction::RunSerial(config) => {
            debug!(target: "contend::run", ?config, "Configuration resolved (serial)");
            contend_engine::run_serial(&config)
        }
    };

    match result {
        Ok(report) => println!("{}", format_report(&report, output_mode)),
        Err(e) => {
            eprintln!("{}", format_error(&e, output_mode));
            process::exit(exit_code(&e));
        }
    }
}

/// Logs go to stderr so `--json` output stays parseable.
fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
