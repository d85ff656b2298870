//! ArgMatches → run invocation conversion.
//!
//! The run configuration is layered: built-in defaults, then the config
//! file (`--config`, or `./contend.toml` when present), then command-line
//! flags. The result is validated once, after all layers are applied.

use std::path::Path;

use clap::ArgMatches;
use contend_core::{
    ContendError, ContendResult, OperatingMode, RunConfig, WorkloadMix, CONFIG_FILE_NAME,
};

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum CliAction {
    /// Run on the worker pool.
    Run(RunConfig),
    /// Run the sequential baseline.
    RunSerial(RunConfig),
    /// Print the default config file.
    PrintConfig,
}

/// Convert parsed arguments into an action.
pub fn matches_to_action(matches: &ArgMatches) -> ContendResult<CliAction> {
    if matches.subcommand_name() == Some("config") {
        return Ok(CliAction::PrintConfig);
    }

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => RunConfig::load(path)?,
        None if Path::new(CONFIG_FILE_NAME).exists() => RunConfig::load(CONFIG_FILE_NAME)?,
        None => RunConfig::default(),
    };

    let mut serial = false;
    if let Some(mode) = matches.get_one::<String>("mode") {
        if mode == "serial" {
            serial = true;
        } else {
            config.mode = OperatingMode::parse(mode)?;
        }
    }
    if let Some(mix) = matches.get_one::<String>("mix") {
        config.mix = WorkloadMix::preset(mix)?;
    }
    if let Some(&tasks) = matches.get_one::<usize>("tasks") {
        config.tasks = tasks;
    }
    if let Some(&queries) = matches.get_one::<usize>("queries") {
        config.queries_per_task = queries;
    }
    if let Some(&workers) = matches.get_one::<usize>("workers") {
        config.workers = workers;
    }
    if let Some(&rows) = matches.get_one::<u32>("rows") {
        config.rows = rows;
    }
    if let Some(&seed) = matches.get_one::<u64>("seed") {
        config.seed = seed;
    }
    if let Some(&ms) = matches.get_one::<u64>("base-delay-ms") {
        config.base_delay_ms = ms;
    }
    if let Some(&ms) = matches.get_one::<u64>("scale-ms") {
        config.scale_factor_ms = ms;
    }
    if let Some(&cap) = matches.get_one::<u32>("max-retries") {
        config.max_retries = Some(cap);
    }
    if let Some(&ms) = matches.get_one::<u64>("lock-timeout-ms") {
        config.lock_wait_timeout_ms = ms;
    }

    config.validate()?;
    Ok(if serial {
        CliAction::RunSerial(config)
    } else {
        CliAction::Run(config)
    })
}

/// Process exit code for a failed invocation.
pub fn exit_code(err: &ContendError) -> i32 {
    match err {
        ContendError::InvalidConfig(_) | ContendError::ConfigParse(_) | ContendError::Io(_) => 2,
        ContendError::Store(_) | ContendError::WorkerPanicked(_) => 1,
    }
}
