//! Multi-file JSON configuration loading.
//!
//! A load runs in four steps:
//! 1. **Resolve** - validate each path, deduplicate by canonical path and give
//!    every file a distinct display name (`files`)
//! 2. **Ingest** - decode each file as one object or an array of objects and
//!    group the objects by identifier (`loader`)
//! 3. **Validate** - report conflicting values across files and keys the
//!    schema does not know (`validate`)
//! 4. **Materialize** - coerce each field to its semantic type and write it
//!    into a record per identifier (`merge`)
//!
//! Problems found along the way are collected into one
//! [`ErrorList`](crate::error::ErrorList) rather than stopping at the first.

mod coerce;
mod duration;
mod files;
mod loader;
mod merge;
mod types;
mod validate;

pub use coerce::{CoerceError, coerce, json_kind, raw_string};
pub use duration::{DurationError, format_duration, parse_duration};
pub use files::{
    FileDetail, FileError, MAX_ITERATIONS, distinct_filenames, validate_dir, validate_file,
    validate_file_or_parent_dir,
};
pub use loader::{
    ConfigLoader, DEFAULT_ID, LoadReport, Parsed, ParsedMap, read_config_file, read_config_files,
};
pub use merge::{materialize, materialize_staged};
pub use types::{
    ConfigRecord, FieldDescriptor, FieldSink, FieldSpec, FieldType, FieldValue, Record, Schema,
    SchemaDescriptor,
};
pub use validate::validate_parameters;
