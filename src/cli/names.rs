//! Names subcommand for config-merge CLI
//!
//! Shows the display name each file gets in diagnostics.

use super::Outcome;
use crate::config::distinct_filenames;
use crate::error::ErrorList;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the names subcommand
#[derive(Args, Debug)]
pub struct NamesArgs {
    /// Files to name
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,
}

/// One `distinct-name<TAB>supplied-path` line per accepted file.
pub fn run_names(args: &NamesArgs) -> Result<Outcome> {
    let mut errors = ErrorList::new();
    let files = distinct_filenames(&args.files, &mut errors);

    let output = files
        .iter()
        .map(|file| format!("{}\t{}", file.distinct_name, file.name))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(Outcome { output, errors })
}
