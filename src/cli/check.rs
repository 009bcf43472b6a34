//! Check subcommand for config-merge CLI
//!
//! Reports conflicting and unused settings without materializing records.

use super::{Outcome, SchemaArgs};
use anyhow::{Result, bail};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the check subcommand
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Configuration files to validate
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,
}

pub fn run_check(args: &CheckArgs) -> Result<Outcome> {
    let (loader, id) = args.schema.load()?;

    let report = match (id, args.files.as_slice()) {
        (Some(id), files) => loader.check_files(&id, files)?,
        (None, [single]) => loader.check_file(single),
        (None, files) => bail!(
            "checking {} files needs an identifier field: pass --id or set `id` in the schema",
            files.len()
        ),
    };

    let output = format!(
        "checked {} file(s): {} configuration(s), {} problem(s)",
        args.files.len(),
        report.value.len(),
        report.errors.len()
    );
    Ok(Outcome {
        output,
        errors: report.errors,
    })
}
