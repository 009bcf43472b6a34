//! Field materialization from grouped objects into records.
//!
//! For each identifier, objects are applied in the order their files were
//! supplied, so when files disagree the last one read wins. Conflicts are
//! reported separately by validation.

use super::coerce::coerce;
use super::loader::{Parsed, ParsedMap};
use super::types::{FieldSink, Schema};
use crate::error::ErrorList;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Coerce every schema field found in `elements` into `record`.
///
/// Returns the names of fields that had a value, whether or not coercion
/// succeeded.
fn apply_elements<'s, S: FieldSink>(
    schema: &'s Schema,
    id: &str,
    elements: &[Parsed],
    record: &mut S,
    errors: &mut ErrorList,
) -> BTreeSet<&'s str> {
    let mut touched = BTreeSet::new();

    for element in elements {
        for field in schema.fields() {
            let Some(raw) = field.lookup(&element.element) else {
                continue;
            };
            touched.insert(field.name.as_str());

            match coerce(raw, &field.field_type) {
                Ok(value) => record.set(&field.name, value),
                Err(e) => errors.add(format!(
                    "setting for {} invalid, parameter {}: {} [{}]",
                    id,
                    field.name,
                    e,
                    element.label()
                )),
            }
        }
    }
    touched
}

/// Build a fresh record per identifier.
pub fn materialize<S, F>(
    schema: &Schema,
    parsed: &ParsedMap,
    mut make: F,
    errors: &mut ErrorList,
) -> BTreeMap<String, S>
where
    S: FieldSink,
    F: FnMut() -> S,
{
    let mut results = BTreeMap::new();
    for (id, elements) in parsed {
        let mut record = make();
        apply_elements(schema, id, elements, &mut record, errors);
        results.insert(id.clone(), record);
    }

    debug!("Materialized {} records", results.len());
    results
}

/// Build every identifier's record in one shared staging record.
///
/// Each result is a clone of the staging record taken after its identifier
/// was applied. With more than one identifier, touched fields are reset to
/// zero before the next identifier so values do not leak between them.
pub fn materialize_staged<S>(
    schema: &Schema,
    parsed: &ParsedMap,
    staging: &mut S,
    errors: &mut ErrorList,
) -> BTreeMap<String, S>
where
    S: FieldSink + Clone,
{
    let clear = parsed.len() > 1;

    let mut results = BTreeMap::new();
    for (id, elements) in parsed {
        let touched = apply_elements(schema, id, elements, staging, errors);
        results.insert(id.clone(), staging.clone());

        if clear {
            for field in schema.fields().iter().filter(|f| touched.contains(f.name.as_str())) {
                staging.reset(field);
            }
        }
    }

    debug!("Materialized {} records through staging", results.len());
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldType, FieldValue, Record};
    use serde_json::{Value, json};

    fn parsed(distinct_name: &str, element: Value) -> Parsed {
        let Value::Object(element) = element else {
            panic!("not an object");
        };
        Parsed {
            file_name: distinct_name.to_string(),
            distinct_name: distinct_name.to_string(),
            position: 0,
            element,
        }
    }

    fn schema() -> Schema {
        Schema::new()
            .aliased_field("Id", "id", FieldType::Text)
            .field("port", FieldType::Integer)
            .field("enabled", FieldType::Boolean)
    }

    #[test]
    fn test_fields_from_two_files_combine() {
        let mut map = ParsedMap::new();
        map.insert(
            "svc1".into(),
            vec![
                parsed("file1.json", json!({"id": "svc1", "port": "8080"})),
                parsed("file2.json", json!({"id": "svc1", "enabled": "true"})),
            ],
        );

        let mut errors = ErrorList::new();
        let records = materialize(&schema(), &map, Record::new, &mut errors);

        assert!(errors.is_empty());
        let svc = &records["svc1"];
        assert_eq!(svc.text("Id"), Some("svc1"));
        assert_eq!(svc.integer("port"), Some(8080));
        assert_eq!(svc.boolean("enabled"), Some(true));
    }

    #[test]
    fn test_last_seen_wins() {
        let mut map = ParsedMap::new();
        map.insert(
            "svc1".into(),
            vec![
                parsed("file1.json", json!({"id": "svc1", "port": 8080})),
                parsed("file2.json", json!({"id": "svc1", "port": 9090})),
            ],
        );

        let mut errors = ErrorList::new();
        let records = materialize(&schema(), &map, Record::new, &mut errors);
        assert_eq!(records["svc1"].integer("port"), Some(9090));
    }

    #[test]
    fn test_coercion_failure_keeps_prior_value() {
        let mut map = ParsedMap::new();
        map.insert(
            "svc1".into(),
            vec![
                parsed("file1.json", json!({"id": "svc1", "port": 8080})),
                parsed("file2.json", json!({"id": "svc1", "port": "eighty"})),
            ],
        );

        let mut errors = ErrorList::new();
        let records = materialize(&schema(), &map, Record::new, &mut errors);

        assert_eq!(records["svc1"].integer("port"), Some(8080));
        assert_eq!(
            errors.iter().collect::<Vec<_>>(),
            vec!["setting for svc1 invalid, parameter port: integer eighty [file2.json]"]
        );
    }

    #[test]
    fn test_unsupported_type_is_diagnostic() {
        let schema = schema().field("blob", FieldType::Unsupported("bytes".into()));
        let mut map = ParsedMap::new();
        map.insert(
            "svc1".into(),
            vec![parsed("file1.json", json!({"id": "svc1", "blob": "AA=="}))],
        );

        let mut errors = ErrorList::new();
        let records = materialize(&schema, &map, Record::new, &mut errors);

        assert!(records["svc1"].get("blob").is_none());
        assert_eq!(
            errors.iter().collect::<Vec<_>>(),
            vec!["setting for svc1 invalid, parameter blob: unsupported type bytes [file1.json]"]
        );
    }

    #[test]
    fn test_staged_record_does_not_leak_between_ids() {
        let mut map = ParsedMap::new();
        map.insert(
            "a".into(),
            vec![parsed("file1.json", json!({"id": "a", "enabled": true}))],
        );
        map.insert(
            "b".into(),
            vec![parsed("file2.json", json!({"id": "b", "port": 1}))],
        );

        let mut staging = Record::new();
        let mut errors = ErrorList::new();
        let records = materialize_staged(&schema(), &map, &mut staging, &mut errors);

        assert_eq!(records["a"].boolean("enabled"), Some(true));
        assert_eq!(records["b"].boolean("enabled"), Some(false));
        assert_eq!(records["b"].integer("port"), Some(1));
        assert_eq!(staging.get("port"), Some(&FieldValue::Integer(0)));
    }

    #[test]
    fn test_staged_single_id_keeps_values() {
        let mut map = ParsedMap::new();
        map.insert(
            "a".into(),
            vec![parsed("file1.json", json!({"id": "a", "enabled": true}))],
        );

        let mut staging = Record::new();
        let mut errors = ErrorList::new();
        materialize_staged(&schema(), &map, &mut staging, &mut errors);

        assert_eq!(staging.boolean("enabled"), Some(true));
    }
}
