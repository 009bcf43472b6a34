//! Schema and record types.
//!
//! A [`Schema`] is the static description of a configuration record: an
//! ordered list of fields, each with a semantic type and an optional external
//! alias used as the JSON key. Coerced values are written into anything that
//! implements [`FieldSink`]; typed structs implement [`ConfigRecord`] to carry
//! their schema with them, and [`Record`] covers schemas only known at runtime.

use super::duration::format_duration;
use crate::error::ConfigError;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::warn;

/// Semantic type of a schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Real,
    Integer,
    Boolean,
    Duration,
    Timestamp,
    /// A type name the loader does not understand. Values for such fields
    /// are reported instead of materialized.
    Unsupported(String),
}

impl FieldType {
    /// Parse a type name from a schema descriptor.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "text" | "string" => FieldType::Text,
            "real" | "float" | "float64" => FieldType::Real,
            "integer" | "int" | "int64" => FieldType::Integer,
            "boolean" | "bool" => FieldType::Boolean,
            "duration" => FieldType::Duration,
            "timestamp" | "time" | "date" => FieldType::Timestamp,
            _ => FieldType::Unsupported(name.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Real => "real",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Duration => "duration",
            FieldType::Timestamp => "timestamp",
            FieldType::Unsupported(name) => name,
        }
    }

    /// The value a field of this type holds before anything is assigned.
    pub fn zero_value(&self) -> Option<FieldValue> {
        match self {
            FieldType::Text => Some(FieldValue::Text(String::new())),
            FieldType::Real => Some(FieldValue::Real(0.0)),
            FieldType::Integer => Some(FieldValue::Integer(0)),
            FieldType::Boolean => Some(FieldValue::Boolean(false)),
            FieldType::Duration => Some(FieldValue::Duration(Duration::zero())),
            FieldType::Timestamp => Some(FieldValue::Timestamp(DateTime::<Utc>::default())),
            FieldType::Unsupported(_) => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A coerced field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Real(f64),
    Integer(i64),
    Boolean(bool),
    Duration(Duration),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            FieldValue::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            FieldValue::Duration(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(v) => write!(f, "{}", v),
            FieldValue::Real(v) => write!(f, "{}", v),
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Boolean(v) => write!(f, "{}", v),
            FieldValue::Duration(v) => write!(f, "{}", format_duration(v)),
            FieldValue::Timestamp(v) => write!(f, "{}", v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(v) => serializer.serialize_str(v),
            FieldValue::Real(v) => serializer.serialize_f64(*v),
            FieldValue::Integer(v) => serializer.serialize_i64(*v),
            FieldValue::Boolean(v) => serializer.serialize_bool(*v),
            FieldValue::Duration(_) | FieldValue::Timestamp(_) => {
                serializer.serialize_str(&self.to_string())
            }
        }
    }
}

/// One field of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    /// External JSON key, looked up before `name`.
    pub alias: Option<String>,
    pub field_type: FieldType,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            alias: None,
            field_type,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Find this field's raw value in a JSON element, alias first.
    ///
    /// `null` counts as not specified.
    pub fn lookup<'a>(&self, element: &'a Map<String, Value>) -> Option<&'a Value> {
        self.alias
            .as_deref()
            .and_then(|alias| element.get(alias))
            .filter(|v| !v.is_null())
            .or_else(|| element.get(&self.name).filter(|v| !v.is_null()))
    }
}

/// Ordered description of a configuration record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field keyed by its own name.
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldSpec::new(name, field_type));
        self
    }

    /// Append a field keyed by `alias` in JSON, falling back to `name`.
    pub fn aliased_field(
        mut self,
        name: impl Into<String>,
        alias: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        self.fields
            .push(FieldSpec::new(name, field_type).with_alias(alias));
        self
    }

    pub fn push(&mut self, spec: FieldSpec) {
        self.fields.push(spec);
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up the identifier field, which must be declared.
    pub fn identifier(&self, name: &str) -> Result<&FieldSpec, ConfigError> {
        self.get(name)
            .ok_or_else(|| ConfigError::UnknownIdField(name.to_string()))
    }

    /// Whether a raw JSON key maps to any field, by alias or by name.
    pub fn recognizes(&self, key: &str) -> bool {
        self.fields
            .iter()
            .any(|f| f.name == key || f.alias.as_deref() == Some(key))
    }

    /// Reject schemas that declare the same field name twice.
    pub fn check(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(ConfigError::DuplicateField(field.name.clone()));
            }
        }
        Ok(())
    }
}

/// Receives coerced field values.
pub trait FieldSink {
    /// Store a value for the named field.
    fn set(&mut self, field: &str, value: FieldValue);

    /// Return a field to its type's zero value.
    fn reset(&mut self, field: &FieldSpec) {
        if let Some(zero) = field.field_type.zero_value() {
            self.set(&field.name, zero);
        }
    }
}

/// A typed configuration record that declares its own schema.
///
/// ```
/// use config_merge::config::{ConfigRecord, FieldSink, FieldType, FieldValue, Schema};
///
/// #[derive(Debug, Default, Clone)]
/// struct Service {
///     id: String,
///     port: i64,
/// }
///
/// impl FieldSink for Service {
///     fn set(&mut self, field: &str, value: FieldValue) {
///         match (field, value) {
///             ("Id", FieldValue::Text(v)) => self.id = v,
///             ("Port", FieldValue::Integer(v)) => self.port = v,
///             _ => {}
///         }
///     }
/// }
///
/// impl ConfigRecord for Service {
///     fn schema() -> Schema {
///         Schema::new()
///             .aliased_field("Id", "id", FieldType::Text)
///             .aliased_field("Port", "port", FieldType::Integer)
///     }
/// }
/// ```
pub trait ConfigRecord: FieldSink + Default {
    fn schema() -> Schema;
}

/// A dynamic record: field name to coerced value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    values: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    pub fn real(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_real)
    }

    pub fn integer(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(FieldValue::as_integer)
    }

    pub fn boolean(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(FieldValue::as_bool)
    }

    pub fn duration(&self, field: &str) -> Option<Duration> {
        self.get(field).and_then(FieldValue::as_duration)
    }

    pub fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.get(field).and_then(FieldValue::as_timestamp)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FieldSink for Record {
    fn set(&mut self, field: &str, value: FieldValue) {
        self.values.insert(field.to_string(), value);
    }
}

/// Serialized schema description, as read from a YAML or JSON file.
///
/// ```yaml
/// id: Name
/// fields:
///   - name: Name
///     alias: name
///     type: text
///   - name: Port
///     type: integer
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    /// Default identifier field for multi-file loads.
    #[serde(default)]
    pub id: Option<String>,

    pub fields: Vec<FieldDescriptor>,
}

/// Serialized description of one field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,

    #[serde(default)]
    pub alias: Option<String>,

    #[serde(rename = "type")]
    pub field_type: String,
}

impl SchemaDescriptor {
    /// Load a descriptor from a YAML (or JSON) file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let schema_error = |reason: String| ConfigError::SchemaLoad {
            path: path.display().to_string(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| schema_error(e.to_string()))?;
        serde_yaml::from_str(&content).map_err(|e| schema_error(e.to_string()))
    }

    /// Build the schema, rejecting duplicate field names.
    pub fn to_schema(&self) -> Result<Schema, ConfigError> {
        let mut schema = Schema::new();
        for field in &self.fields {
            let field_type = FieldType::parse(&field.field_type);
            if let FieldType::Unsupported(ref name) = field_type {
                warn!("Field {} has unsupported type {}", field.name, name);
            }
            let mut spec = FieldSpec::new(&field.name, field_type);
            spec.alias = field.alias.clone();
            schema.push(spec);
        }
        schema.check()?;
        Ok(schema)
    }
}
