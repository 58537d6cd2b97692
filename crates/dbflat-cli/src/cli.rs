//! `dbflat` command-line entry point.
//!
//! Parses arguments, loads settings, installs the tracing subscriber and runs
//! one command. The process exit status is derived from the failure's
//! category; diagnostics go to stderr so exported data on stdout stays clean.

use std::process::ExitCode;

use clap::Parser;
use dbflat_interchange::{ErrorCategory, Verbosity};

mod args;
mod commands;
mod escape;
mod logging;
mod settings;

use args::Cli;
use settings::Settings;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("error: {:#}", err);
            return ExitCode::from(ErrorCategory::Configuration.exit_code());
        }
    };

    let verbosity = cli.verbose.or(settings.verbosity).unwrap_or_default();
    logging::init(verbosity);
    tracing::debug!(settings = ?settings, "settings loaded");

    match commands::run(&cli, &settings, verbosity) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if verbosity > Verbosity::Silent {
                eprintln!("error: {:#}", err);
            }
            ExitCode::from(commands::exit_code(&err))
        }
    }
}
