//! Merge subcommand for config-merge CLI
//!
//! Loads every file against the schema and prints the merged records.

use super::{Outcome, SchemaArgs};
use crate::config::{DEFAULT_ID, LoadReport, Record};
use anyhow::{Result, bail};
use clap::Args;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Arguments for the merge subcommand
#[derive(Args, Debug)]
pub struct MergeArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Output format: json (default) or text
    #[arg(short, long, default_value = "json", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Configuration files, in merge order (later files win)
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,
}

/// Output format for merged records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "text" => Ok(OutputFormat::Text),
            _ => Err(format!(
                "Invalid format '{}'. Valid options: json, text",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}

/// Load records for the given files.
///
/// Without an identifier field a single file is read as one `default`
/// record; several files need an identifier.
pub fn load_records(
    schema: &SchemaArgs,
    files: &[PathBuf],
) -> Result<LoadReport<BTreeMap<String, Record>>> {
    let (loader, id) = schema.load()?;

    match (id, files) {
        (Some(id), _) => Ok(loader.read_files(&id, files)?),
        (None, [single]) => {
            let report = loader.read_file::<Record, _>(single);
            Ok(LoadReport {
                value: BTreeMap::from([(DEFAULT_ID.to_string(), report.value)]),
                errors: report.errors,
            })
        }
        (None, _) => bail!(
            "merging {} files needs an identifier field: pass --id or set `id` in the schema",
            files.len()
        ),
    }
}

/// Render records as pretty JSON or as `[id]` sections of `field = value` lines.
pub fn render(records: &BTreeMap<String, Record>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        OutputFormat::Text => {
            let mut out = String::new();
            for (id, record) in records {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(&format!("[{}]\n", id));
                for (field, value) in record.iter() {
                    out.push_str(&format!("{} = {}\n", field, value));
                }
            }
            Ok(out.trim_end().to_string())
        }
    }
}

pub fn run_merge(args: &MergeArgs) -> Result<Outcome> {
    let report = load_records(&args.schema, &args.files)?;
    Ok(Outcome {
        output: render(&report.value, args.format)?,
        errors: report.errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldSink, FieldValue};

    #[test]
    fn test_output_format_parse() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("TEXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_render_text() {
        let mut a = Record::new();
        a.set("port", FieldValue::Integer(8080));
        a.set("enabled", FieldValue::Boolean(true));
        let mut b = Record::new();
        b.set("port", FieldValue::Integer(9090));

        let records = BTreeMap::from([("a".to_string(), a), ("b".to_string(), b)]);
        assert_eq!(
            render(&records, OutputFormat::Text).unwrap(),
            "[a]\nenabled = true\nport = 8080\n\n[b]\nport = 9090"
        );
    }

    #[test]
    fn test_render_json() {
        let mut a = Record::new();
        a.set("port", FieldValue::Integer(8080));
        let records = BTreeMap::from([("a".to_string(), a)]);

        let rendered = render(&records, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value, serde_json::json!({"a": {"port": 8080}}));
    }
}
