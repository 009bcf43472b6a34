//! Tests for the CLI subcommands driven through their argument structs.

use config_merge::cli::SchemaArgs;
use config_merge::cli::check::{CheckArgs, run_check};
use config_merge::cli::merge::{MergeArgs, OutputFormat, run_merge};
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Schema descriptor with an identifier and one field per semantic type.
fn schema_yaml() -> &'static str {
    r#"
id: Name
fields:
  - name: Name
    alias: name
    type: text
  - name: Port
    alias: port
    type: integer
  - name: Enabled
    alias: enabled
    type: boolean
  - name: Timeout
    alias: timeout
    type: duration
"#
}

fn write(temp: &TempDir, relative: &str, content: &str) -> PathBuf {
    let path = temp.path().join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn schema_args(temp: &TempDir) -> SchemaArgs {
    SchemaArgs {
        schema: Some(write(temp, "schema.yaml", schema_yaml())),
        id: None,
    }
}

#[test]
fn merge_prints_json_records() {
    let temp = TempDir::new().unwrap();
    let general = write(
        &temp,
        "general.json",
        r#"[{"name": "web", "port": 80}, {"name": "api", "port": "8080"}]"#,
    );
    let secrets = write(
        &temp,
        "secrets.json",
        r#"{"name": "api", "enabled": "true", "timeout": "1m30s"}"#,
    );

    let args = MergeArgs {
        schema: schema_args(&temp),
        format: OutputFormat::Json,
        files: vec![general, secrets],
    };
    let outcome = run_merge(&args).unwrap();

    assert!(outcome.errors.is_empty(), "{}", outcome.errors);
    let value: Value = serde_json::from_str(&outcome.output).unwrap();
    assert_eq!(
        value,
        json!({
            "api": {"Name": "api", "Port": 8080, "Enabled": true, "Timeout": "1m30s"},
            "web": {"Name": "web", "Port": 80}
        })
    );
}

#[test]
fn merge_single_file_without_identifier() {
    let temp = TempDir::new().unwrap();
    let file = write(&temp, "app.json", r#"{"name": "solo", "port": 1}"#);

    let args = MergeArgs {
        schema: SchemaArgs {
            schema: Some(write(
                &temp,
                "schema.json",
                r#"{"fields": [{"name": "name", "type": "text"}, {"name": "port", "type": "int"}]}"#,
            )),
            id: None,
        },
        format: OutputFormat::Text,
        files: vec![file],
    };
    let outcome = run_merge(&args).unwrap();

    assert!(outcome.errors.is_empty(), "{}", outcome.errors);
    assert_eq!(outcome.output, "[default]\nname = solo\nport = 1");
}

#[test]
fn merge_many_files_requires_identifier() {
    let temp = TempDir::new().unwrap();
    let a = write(&temp, "a.json", "{}");
    let b = write(&temp, "b.json", "{}");

    let args = MergeArgs {
        schema: SchemaArgs {
            schema: Some(write(
                &temp,
                "schema.yaml",
                "fields:\n  - name: name\n    type: text\n",
            )),
            id: None,
        },
        format: OutputFormat::Json,
        files: vec![a, b],
    };

    let err = run_merge(&args).unwrap_err();
    assert!(err.to_string().contains("needs an identifier field"));
}

#[test]
fn check_reports_conflicts() {
    let temp = TempDir::new().unwrap();
    let a = write(&temp, "prod/app.json", r#"{"name": "api", "port": 1}"#);
    let b = write(&temp, "dev/app.json", r#"{"name": "api", "port": 2}"#);

    let args = CheckArgs {
        schema: schema_args(&temp),
        files: vec![a, b],
    };
    let outcome = run_check(&args).unwrap();

    assert_eq!(
        outcome.output,
        "checked 2 file(s): 1 configuration(s), 1 problem(s)"
    );
    assert_eq!(
        outcome.errors.iter().next().unwrap(),
        "settings for api conflict, parameter Port: \"1\" [prod/app.json] != \"2\" [dev/app.json]"
    );
}

#[test]
fn unreadable_schema_is_an_error() {
    let temp = TempDir::new().unwrap();
    let file = write(&temp, "a.json", "{}");

    let args = CheckArgs {
        schema: SchemaArgs {
            schema: Some(temp.path().join("absent.yaml")),
            id: Some("Name".into()),
        },
        files: vec![file],
    };

    let err = run_check(&args).unwrap_err();
    assert!(err.to_string().starts_with("loading schema"));
}

#[test]
fn check_single_file_without_identifier() {
    let temp = TempDir::new().unwrap();
    let file = write(&temp, "app.json", r#"{"name": "solo", "prot": 1}"#);

    let args = CheckArgs {
        schema: SchemaArgs {
            schema: Some(write(
                &temp,
                "schema.yaml",
                "fields:\n  - name: name\n    type: text\n",
            )),
            id: None,
        },
        files: vec![file],
    };
    let outcome = run_check(&args).unwrap();

    assert_eq!(
        outcome.output,
        "checked 1 file(s): 1 configuration(s), 1 problem(s)"
    );
    assert_eq!(
        outcome.errors.iter().collect::<Vec<_>>(),
        vec!["unused setting for default, parameter prot [app.json]"]
    );
}
