//! Cross-file validation of grouped configuration objects.
//!
//! Runs before materialization so that conflicting settings are reported
//! rather than silently resolved by whichever file was read last.

use super::coerce::raw_string;
use super::loader::{Parsed, ParsedMap};
use super::types::Schema;
use crate::error::ErrorList;

/// Distinct raw values seen for one field, each with the files that supplied it.
type ValueSources = Vec<(String, Vec<String>)>;

fn record_source(entries: &mut Vec<(String, Vec<String>)>, key: String, label: &str) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some((_, labels)) => labels.push(label.to_string()),
        None => entries.push((key, vec![label.to_string()])),
    }
}

/// Report conflicting values and unrecognized keys for every identifier.
pub fn validate_parameters(schema: &Schema, parsed: &ParsedMap, errors: &mut ErrorList) {
    for (id, elements) in parsed {
        report_conflicts(schema, id, elements, errors);
        report_unused(schema, id, elements, errors);
    }
}

fn report_conflicts(schema: &Schema, id: &str, elements: &[Parsed], errors: &mut ErrorList) {
    for field in schema.fields() {
        let mut values: ValueSources = Vec::new();
        for element in elements {
            if let Some(raw) = field.lookup(&element.element) {
                record_source(&mut values, raw_string(raw), &element.label());
            }
        }

        if values.len() > 1 {
            let conflicts: Vec<String> = values
                .iter()
                .map(|(value, labels)| format!("{:?} [{}]", value, labels.join(",")))
                .collect();
            errors.add(format!(
                "settings for {} conflict, parameter {}: {}",
                id,
                field.name,
                conflicts.join(" != ")
            ));
        }
    }
}

fn report_unused(schema: &Schema, id: &str, elements: &[Parsed], errors: &mut ErrorList) {
    let mut unused: Vec<(String, Vec<String>)> = Vec::new();
    for element in elements {
        let label = element.label();
        for key in element.element.keys() {
            if !schema.recognizes(key) {
                record_source(&mut unused, key.clone(), &label);
            }
        }
    }

    for (key, labels) in unused {
        if let [only] = labels.as_slice() {
            errors.add(format!(
                "unused setting for {}, parameter {} [{}]",
                id, key, only
            ));
        } else {
            errors.add(format!(
                "unused settings for {}, parameter {}: {} occurrences [{}]",
                id,
                key,
                labels.len(),
                labels.join(",")
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldType;
    use serde_json::{Value, json};

    fn parsed(distinct_name: &str, position: usize, element: Value) -> Parsed {
        let Value::Object(element) = element else {
            panic!("not an object");
        };
        Parsed {
            file_name: distinct_name.to_string(),
            distinct_name: distinct_name.to_string(),
            position,
            element,
        }
    }

    fn schema() -> Schema {
        Schema::new()
            .aliased_field("Id", "id", FieldType::Text)
            .field("port", FieldType::Integer)
            .field("enabled", FieldType::Boolean)
    }

    fn validate(elements: Vec<Parsed>) -> Vec<String> {
        let mut map = ParsedMap::new();
        map.insert("svc1".to_string(), elements);
        let mut errors = ErrorList::new();
        validate_parameters(&schema(), &map, &mut errors);
        errors.iter().map(String::from).collect()
    }

    #[test]
    fn test_same_value_is_not_conflict() {
        let errors = validate(vec![
            parsed("file1.json", 0, json!({"id": "svc1", "port": "8080"})),
            parsed("file2.json", 0, json!({"id": "svc1", "port": 8080})),
        ]);
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_different_values_conflict_once() {
        let errors = validate(vec![
            parsed("file1.json", 0, json!({"id": "svc1", "port": "8080"})),
            parsed("file2.json", 0, json!({"id": "svc1", "port": "9090"})),
            parsed("file3.json", 2, json!({"id": "svc1", "port": "8080"})),
        ]);
        assert_eq!(
            errors,
            vec![
                "settings for svc1 conflict, parameter port: \"8080\" [file1.json,file3.json:elem#2] != \"9090\" [file2.json]"
            ]
        );
    }

    #[test]
    fn test_unused_singular() {
        let errors = validate(vec![parsed(
            "file1.json",
            0,
            json!({"id": "svc1", "prot": 80}),
        )]);
        assert_eq!(
            errors,
            vec!["unused setting for svc1, parameter prot [file1.json]"]
        );
    }

    #[test]
    fn test_unused_plural_counts_occurrences() {
        let errors = validate(vec![
            parsed("file1.json", 0, json!({"id": "svc1", "stale": 1})),
            parsed("file2.json", 1, json!({"id": "svc1", "stale": 1})),
        ]);
        assert_eq!(
            errors,
            vec!["unused settings for svc1, parameter stale: 2 occurrences [file1.json,file2.json:elem#1]"]
        );
    }

    #[test]
    fn test_bare_name_of_aliased_field_is_recognized() {
        let errors = validate(vec![parsed(
            "file1.json",
            0,
            json!({"Id": "svc1", "enabled": true}),
        )]);
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_same_number_in_different_notation_is_not_conflict() {
        let a: Value = serde_json::from_str(r#"{"id": "svc1", "port": 1000}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"id": "svc1", "port": 1e3}"#).unwrap();
        let errors = validate(vec![
            parsed("a.json", 0, a),
            parsed("b.json", 0, b),
            parsed("c.json", 0, json!({"id": "svc1", "port": 1000.0})),
        ]);
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_null_values_do_not_conflict() {
        let errors = validate(vec![
            parsed("file1.json", 0, json!({"id": "svc1", "port": 1})),
            parsed("file2.json", 0, json!({"id": "svc1", "port": null})),
        ]);
        assert!(errors.is_empty(), "{:?}", errors);
    }
}
