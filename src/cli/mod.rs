//! CLI command definitions for config-merge
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod check;
pub mod merge;
pub mod names;

use crate::config::{ConfigLoader, SchemaDescriptor};
use crate::error::ErrorList;
use crate::logging::LogTarget;
use anyhow::{Result, anyhow};
use check::CheckArgs;
use clap::{Args, Parser, Subcommand};
use merge::MergeArgs;
use names::NamesArgs;
use std::path::PathBuf;

/// Environment variable naming the schema file when `--schema` is omitted.
pub const SCHEMA_ENV: &str = "CONFIG_MERGE_SCHEMA";

/// Merge and validate JSON configuration split across files
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: LogTarget,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge files and print one record per identifier
    Merge(MergeArgs),

    /// Validate files without printing records
    Check(CheckArgs),

    /// Print the distinct display name given to each file
    Names(NamesArgs),
}

/// Schema selection shared by `merge` and `check`.
#[derive(Args, Debug, Clone, Default)]
pub struct SchemaArgs {
    /// Schema descriptor file, YAML or JSON (default: $CONFIG_MERGE_SCHEMA)
    #[arg(short, long, value_name = "FILE")]
    pub schema: Option<PathBuf>,

    /// Identifier field that groups objects across files (overrides the schema's `id`)
    #[arg(long, value_name = "FIELD")]
    pub id: Option<String>,
}

impl SchemaArgs {
    /// The schema path from `--schema`, falling back to the environment.
    pub fn schema_path(&self) -> Result<PathBuf> {
        self.schema
            .clone()
            .or_else(|| std::env::var(SCHEMA_ENV).ok().map(PathBuf::from))
            .ok_or_else(|| anyhow!("no schema given: pass --schema or set {}", SCHEMA_ENV))
    }

    /// Load the schema and pick the identifier field.
    pub fn load(&self) -> Result<(ConfigLoader, Option<String>)> {
        let descriptor = SchemaDescriptor::load(self.schema_path()?)?;
        let loader = ConfigLoader::new(descriptor.to_schema()?)?;
        let id = self.id.clone().or(descriptor.id);
        Ok((loader, id))
    }
}

/// What a subcommand produced: text for stdout plus any diagnostics.
#[derive(Debug, Default)]
pub struct Outcome {
    pub output: String,
    pub errors: ErrorList,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_merge_command() {
        let cli = Cli::try_parse_from([
            "config-merge",
            "--log",
            "off",
            "merge",
            "--schema",
            "schema.yaml",
            "--id",
            "Name",
            "a.json",
            "b.json",
        ])
        .unwrap();

        assert_eq!(cli.log, LogTarget::Off);
        let Command::Merge(args) = cli.command else {
            panic!("expected merge");
        };
        assert_eq!(args.schema.schema, Some(PathBuf::from("schema.yaml")));
        assert_eq!(args.schema.id.as_deref(), Some("Name"));
        assert_eq!(args.files.len(), 2);
    }

    #[test]
    fn test_explicit_schema_path_wins() {
        let args = SchemaArgs {
            schema: Some(PathBuf::from("explicit.yaml")),
            id: None,
        };
        assert_eq!(args.schema_path().unwrap(), PathBuf::from("explicit.yaml"));
    }
}
