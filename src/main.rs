//! Config Merge CLI
//!
//! Merges and validates JSON configuration files against a schema
//! descriptor, printing records to stdout and diagnostics to stderr.

use anyhow::Result;
use clap::Parser;
use config_merge::cli::check::run_check;
use config_merge::cli::merge::run_merge;
use config_merge::cli::names::run_names;
use config_merge::cli::{Cli, Command};
use config_merge::logging::init_logging;
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log, cli.verbose)?;

    let outcome = match &cli.command {
        Command::Merge(args) => run_merge(args)?,
        Command::Check(args) => run_check(args)?,
        Command::Names(args) => run_names(args)?,
    };

    if !outcome.output.is_empty() {
        println!("{}", outcome.output);
    }

    if let Some(err) = outcome.errors.into_error() {
        debug!("Finished with diagnostics");
        eprintln!("{}", err);
        std::process::exit(1);
    }

    Ok(())
}
