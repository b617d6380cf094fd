//! CLI entry point and dispatch logic
//!
//! `run()` parses arguments, initializes tracing, discovers configuration,
//! creates the tokio runtime, and dispatches to a command. It owns all error
//! output; `main` only maps the returned code to a process exit.

use clap::Parser;
use repolens_config::{CliOverrides, Config};
use repolens_utils::logging::init_tracing;
use repolens_utils::{ExitCode, RepolensError};

use super::args::{Cli, Commands};
use super::commands;

/// Overrides carried by the parsed command line.
#[must_use]
pub fn overrides_from(cli: &Cli) -> CliOverrides {
    let mut overrides = CliOverrides {
        config_path: cli.config.clone(),
        model: cli.model.clone(),
        ..CliOverrides::default()
    };
    if let Commands::Summarize {
        max_files,
        environment,
        judge,
        ..
    } = &cli.command
    {
        overrides.max_selected_files = *max_files;
        overrides.environment = *environment;
        overrides.enable_judge = judge.then_some(true);
    }
    overrides
}

/// Main CLI execution function.
///
/// Returns `Err(code)` for any non-zero exit.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    if let Err(err) = init_tracing(cli.verbose) {
        eprintln!("Failed to initialize logging: {err}");
    }

    let pretty = matches!(cli.command, Commands::Summarize { pretty: true, .. });
    let config = match Config::discover(&overrides_from(&cli)) {
        Ok(config) => config,
        Err(err) => {
            return Err(commands::report_failure(&RepolensError::from(err), pretty));
        }
    };

    let result = match cli.command {
        Commands::Config { json } => {
            commands::print_config(&config, json).map(|()| ExitCode::SUCCESS)
        }
        Commands::Summarize { url, pretty, .. } => {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("Failed to create async runtime: {e}");
                    return Err(ExitCode::INTERNAL);
                }
            };
            rt.block_on(commands::summarize(config, &url, pretty))
        }
    };

    match result {
        Ok(code) if code == ExitCode::SUCCESS => Ok(()),
        Ok(code) => Err(code),
        Err(err) => {
            eprintln!("{err:#}");
            Err(ExitCode::INTERNAL)
        }
    }
}
