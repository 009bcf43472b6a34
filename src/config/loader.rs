//! Configuration loader for one or more JSON files.
//!
//! Each file holds either a single JSON object or an array of objects. When
//! several files are loaded, a designated identifier field groups objects
//! from different files into one logical configuration, so general settings
//! can live in one file and credentials in another.

use super::coerce::{json_kind, raw_string};
use super::files::{FileDetail, distinct_filenames};
use super::merge::{materialize, materialize_staged};
use super::types::{ConfigRecord, FieldSink, FieldSpec, Schema};
use super::validate::validate_parameters;
use crate::error::{ConfigError, ErrorList};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Identifier used for single-file, single-element loads.
pub const DEFAULT_ID: &str = "default";

/// One JSON object, remembering where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    /// Path as supplied by the caller.
    pub file_name: String,
    /// Collision-free display name of the file.
    pub distinct_name: String,
    /// 0 for a file holding a single object, 1..N for elements of an array.
    pub position: usize,
    pub element: Map<String, Value>,
}

impl Parsed {
    pub fn new(file: &FileDetail, position: usize, element: Map<String, Value>) -> Self {
        Self {
            file_name: file.name.clone(),
            distinct_name: file.distinct_name.clone(),
            position,
            element,
        }
    }

    /// Display name used in diagnostics: `name` or `name:elem#N`.
    pub fn label(&self) -> String {
        if self.position == 0 {
            self.distinct_name.clone()
        } else {
            format!("{}:elem#{}", self.distinct_name, self.position)
        }
    }
}

/// Objects grouped by identifier, each list in file-supply order.
pub type ParsedMap = BTreeMap<String, Vec<Parsed>>;

/// Result of a completed load: the value plus every recoverable problem.
#[derive(Debug)]
pub struct LoadReport<T> {
    pub value: T,
    pub errors: ErrorList,
}

impl<T> LoadReport<T> {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Split into the value and the combined error, if any.
    pub fn into_parts(self) -> (T, Option<ConfigError>) {
        (self.value, self.errors.into_error())
    }

    /// The value only if no diagnostics were recorded.
    pub fn into_result(self) -> Result<T, ConfigError> {
        let value = self.value;
        self.errors.into_result().map(|()| value)
    }
}

/// Loads JSON configuration files against a schema.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    schema: Schema,
}

impl ConfigLoader {
    /// Create a loader, rejecting malformed schemas.
    pub fn new(schema: Schema) -> Result<Self, ConfigError> {
        schema.check()?;
        Ok(Self { schema })
    }

    /// Create a loader for a typed record.
    pub fn for_record<R: ConfigRecord>() -> Result<Self, ConfigError> {
        Self::new(R::schema())
    }

    /// Read a single file holding exactly one JSON object.
    pub fn read_file<S, P>(&self, path: P) -> LoadReport<S>
    where
        S: FieldSink + Default,
        P: AsRef<Path>,
    {
        let mut errors = ErrorList::new();
        let parsed = self.parse_single(path.as_ref(), &mut errors);

        validate_parameters(&self.schema, &parsed, &mut errors);
        let mut records = materialize(&self.schema, &parsed, S::default, &mut errors);

        LoadReport {
            value: records.remove(DEFAULT_ID).unwrap_or_default(),
            errors,
        }
    }

    /// Read many files, returning one record per identifier.
    ///
    /// Fails immediately if `id_field` is not in the schema. Every other
    /// problem is recorded in the report and the affected file, element or
    /// field is skipped.
    pub fn read_files<S, P>(
        &self,
        id_field: &str,
        paths: &[P],
    ) -> Result<LoadReport<BTreeMap<String, S>>, ConfigError>
    where
        S: FieldSink + Default,
        P: AsRef<Path>,
    {
        let (parsed, mut errors) = self.parse_files(id_field, paths)?;

        validate_parameters(&self.schema, &parsed, &mut errors);
        let records = materialize(&self.schema, &parsed, S::default, &mut errors);

        debug!("Parsed {} distinct configurations", records.len());
        Ok(LoadReport {
            value: records,
            errors,
        })
    }

    /// Like [`read_files`](Self::read_files), but writes every identifier
    /// through one shared staging record.
    ///
    /// Fields touched for one identifier are reset to their zero value before
    /// the next identifier when more than one identifier is produced.
    pub fn read_files_staged<S, P>(
        &self,
        staging: &mut S,
        id_field: &str,
        paths: &[P],
    ) -> Result<LoadReport<BTreeMap<String, S>>, ConfigError>
    where
        S: FieldSink + Clone,
        P: AsRef<Path>,
    {
        let (parsed, mut errors) = self.parse_files(id_field, paths)?;

        validate_parameters(&self.schema, &parsed, &mut errors);
        let records = materialize_staged(&self.schema, &parsed, staging, &mut errors);

        debug!("Parsed {} distinct configurations", records.len());
        Ok(LoadReport {
            value: records,
            errors,
        })
    }

    /// Validate a single-object file without materializing a record.
    pub fn check_file<P: AsRef<Path>>(&self, path: P) -> LoadReport<ParsedMap> {
        let mut errors = ErrorList::new();
        let parsed = self.parse_single(path.as_ref(), &mut errors);
        validate_parameters(&self.schema, &parsed, &mut errors);
        LoadReport {
            value: parsed,
            errors,
        }
    }

    /// Validate files without materializing records.
    ///
    /// The report carries the grouped objects, so callers can still count
    /// configurations.
    pub fn check_files<P: AsRef<Path>>(
        &self,
        id_field: &str,
        paths: &[P],
    ) -> Result<LoadReport<ParsedMap>, ConfigError> {
        let (parsed, mut errors) = self.parse_files(id_field, paths)?;
        validate_parameters(&self.schema, &parsed, &mut errors);
        Ok(LoadReport {
            value: parsed,
            errors,
        })
    }

    /// Resolve, decode and group files by identifier.
    pub fn parse_files<P: AsRef<Path>>(
        &self,
        id_field: &str,
        paths: &[P],
    ) -> Result<(ParsedMap, ErrorList), ConfigError> {
        let id = self.schema.identifier(id_field)?;

        let mut errors = ErrorList::new();
        let files = distinct_filenames(paths, &mut errors);

        let mut parsed = ParsedMap::new();
        for file in &files {
            ingest_file(file, id, &mut parsed, &mut errors);
        }
        Ok((parsed, errors))
    }

    fn parse_single(&self, path: &Path, errors: &mut ErrorList) -> ParsedMap {
        let mut parsed = ParsedMap::new();

        let file = match FileDetail::resolve(path) {
            Ok(file) => file,
            Err(e) => {
                errors.add(e.to_string());
                return parsed;
            }
        };

        let Some(value) = decode_file(&file, errors) else {
            return parsed;
        };

        match value {
            Value::Object(element) => {
                debug!("Parsing single element [{}]", file.name);
                parsed.insert(DEFAULT_ID.to_string(), vec![Parsed::new(&file, 0, element)]);
            }
            other => errors.add(format!(
                "contains type {:?}, must be a JSON element [{}]",
                json_kind(&other),
                file.name
            )),
        }
        parsed
    }
}

/// Read and decode one file; failures are recorded and yield `None`.
fn decode_file(file: &FileDetail, errors: &mut ErrorList) -> Option<Value> {
    let content = match std::fs::read_to_string(&file.full_path) {
        Ok(content) => content,
        Err(e) => {
            errors.add(format!("reading file: {} [{}]", e, file.name));
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Parsing issue, skipping [{}]", file.name);
            errors.add(format!("{}, skipping [{}]", e, file.name));
            None
        }
    }
}

/// Decode a file and add its objects to `parsed` under their identifiers.
fn ingest_file(file: &FileDetail, id: &FieldSpec, parsed: &mut ParsedMap, errors: &mut ErrorList) {
    let Some(value) = decode_file(file, errors) else {
        return;
    };

    match value {
        Value::Object(element) => {
            debug!("Parsing single element [{}]", file.name);
            group_element(Parsed::new(file, 0, element), id, parsed, errors);
        }
        Value::Array(items) => {
            debug!("Parsing {} elements [{}]", items.len(), file.name);
            for (i, item) in items.into_iter().enumerate() {
                let position = i + 1;
                match item {
                    Value::Object(element) => {
                        group_element(Parsed::new(file, position, element), id, parsed, errors);
                    }
                    other => errors.add(format!(
                        "parsing config: element has JSON type {:?}, must be an object, skipping [{}:elem#{}]",
                        json_kind(&other),
                        file.name,
                        position
                    )),
                }
            }
        }
        other => errors.add(format!(
            "parsing config: unrecognized JSON type {:?} [{}]",
            json_kind(&other),
            file.name
        )),
    }
}

/// File the element under its identifier, or drop it if the identifier is missing.
fn group_element(element: Parsed, id: &FieldSpec, parsed: &mut ParsedMap, errors: &mut ErrorList) {
    let identifier = id
        .lookup(&element.element)
        .map(raw_string)
        .filter(|s| !s.is_empty());

    match identifier {
        Some(identifier) => parsed.entry(identifier).or_default().push(element),
        None => {
            let location = if element.position == 0 {
                element.file_name.clone()
            } else {
                format!("{}:elem#{}", element.file_name, element.position)
            };
            errors.add(format!(
                "required id parameter {} not found, skipping [{}]",
                id.name, location
            ));
        }
    }
}

/// Read a single-object file into a typed record.
pub fn read_config_file<R: ConfigRecord>(path: impl AsRef<Path>) -> Result<LoadReport<R>, ConfigError> {
    Ok(ConfigLoader::for_record::<R>()?.read_file(path))
}

/// Read many files into typed records keyed by the `id_field` value.
pub fn read_config_files<R: ConfigRecord, P: AsRef<Path>>(
    id_field: &str,
    paths: &[P],
) -> Result<LoadReport<BTreeMap<String, R>>, ConfigError> {
    ConfigLoader::for_record::<R>()?.read_files(id_field, paths)
}
