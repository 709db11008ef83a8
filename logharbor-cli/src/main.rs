//! `logharbor` command-line entry point.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;

use logharbor_core::config::{GeneralConfig, LogHarborConfig};

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, exit_code = e.exit_code(), "command failed");
            eprintln!("error: {e}");
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);
    let level = cli.log_level.as_deref();

    match cli.command {
        // reports broken configuration itself, so it must not load it first
        Commands::Config(args) => {
            init_logging(&GeneralConfig::default(), level)?;
            commands::config::execute(args, &cli.config, &writer)
        }
        Commands::Ingest(args) => {
            commands::ingest::execute(args, &setup(&cli.config, level)?, &writer)
        }
        Commands::Search(args) => {
            commands::search::execute(args, &setup(&cli.config, level)?, &writer)
        }
        Commands::Status => commands::status::execute(&setup(&cli.config, level)?, &writer),
        Commands::Pull(args) => commands::pull::execute(args, &setup(&cli.config, level)?, &writer),
        Commands::Tail(args) => commands::tail::execute(args, &setup(&cli.config, level)?, &writer),
    }
}

/// Load configuration (file + env overrides), then start logging and register metrics.
fn setup(path: &Path, level: Option<&str>) -> Result<LogHarborConfig, CliError> {
    let config = LogHarborConfig::load(path)?;
    init_logging(&config.general, level)?;
    logharbor_core::metrics::describe_all();
    tracing::debug!(config = %path.display(), "configuration loaded");
    Ok(config)
}

fn init_logging(general: &GeneralConfig, level: Option<&str>) -> Result<(), CliError> {
    logging::init_tracing(general, level).map_err(|e| CliError::Config(e.to_string()))
}
