//! # Schema Normalizer
//!
//! The two entry points for turning caller input into a descriptor:
//!
//! - [`check_schema`]: the validation gate. Lowers the raw JSON into a
//!   [`SchemaDefinition`] and runs every structural check, failing on the
//!   first violation. Never mutates its input.
//! - [`create`]: runs the gate and, only if it passes, builds a
//!   [`SchemaDescriptor`].
//!
//! ## Check order
//!
//! 1. `_id` / `_rev` must not be declared.
//! 2. Field naming and placement rules ([`validate_fields_deep`]).
//! 3. At most one primary; the primary is a plain `string` that is not also
//!    `index`, `unique`, `encrypted`, or listed in `required`.
//! 4. `compoundIndexes` is an array of non-empty arrays of strings.
//! 5. Every indexed field is declared at the top level and typed `string` or
//!    `integer`.

use serde_json::Value;

use crate::definition::{describe_type, CompoundIndexes, SchemaDefinition};
use crate::descriptor::SchemaDescriptor;
use crate::error::{ConfigurationError, SchemaResult};
use crate::fields::validate_fields_deep;
use crate::indexes::{get_indexes, indexed_fields};
use crate::rules::{is_indexable, PRIMARY_TYPE, SYSTEM_FIELDS};

/// Check a raw schema without building a descriptor.
///
/// # Errors
///
/// Returns [`SchemaError::Configuration`](crate::SchemaError::Configuration)
/// with the first violation found.
pub fn check_schema(schema: &Value) -> SchemaResult<()> {
    let definition = lower(schema)?;
    check_definition(&definition).map_err(|e| reject(e).into())
}

/// Check and build a descriptor.
///
/// # Errors
///
/// Returns the same errors as [`check_schema`]. No descriptor is returned
/// unless every check passes.
pub fn create(schema: &Value) -> SchemaResult<SchemaDescriptor> {
    let definition = lower(schema)?;
    create_from_definition(&definition)
}

/// Check and build a descriptor from an already lowered definition.
pub fn create_from_definition(definition: &SchemaDefinition) -> SchemaResult<SchemaDescriptor> {
    check_definition(definition).map_err(reject)?;
    SchemaDescriptor::from_checked(definition)
}

/// Run every structural check on a lowered definition.
///
/// # Errors
///
/// The first [`ConfigurationError`] found, in the documented check order.
pub fn check_definition(schema: &SchemaDefinition) -> Result<(), ConfigurationError> {
    for field in SYSTEM_FIELDS {
        if schema.properties.contains_key(field) {
            return Err(ConfigurationError::SystemFieldDeclared {
                field: (*field).to_owned(),
            });
        }
    }

    validate_fields_deep(schema)?;
    check_primary(schema)?;

    if let CompoundIndexes::Malformed { reason, .. } = &schema.compound_indexes {
        return Err(ConfigurationError::MalformedCompoundIndexes {
            reason: reason.clone(),
        });
    }

    let indexes = get_indexes(schema);
    for field in indexed_fields(&indexes) {
        let def = schema
            .properties
            .get(field)
            .ok_or_else(|| ConfigurationError::UnknownIndexField {
                field: field.to_owned(),
            })?;
        if !is_indexable(def.single_type()) {
            return Err(ConfigurationError::NonIndexableType {
                field: field.to_owned(),
                actual: describe_type(def.field_type.as_ref()),
            });
        }
    }
    Ok(())
}

fn check_primary(schema: &SchemaDefinition) -> Result<(), ConfigurationError> {
    let mut primary: Option<&str> = None;
    for (name, def) in schema.properties.iter() {
        if !def.flags.is_primary() {
            continue;
        }
        if let Some(first) = primary {
            return Err(ConfigurationError::DuplicatePrimary {
                first: first.to_owned(),
                second: name.to_owned(),
            });
        }
        primary = Some(name);

        let field = name.to_owned();
        if def.flags.is_index() {
            return Err(ConfigurationError::PrimaryIsIndex { field });
        }
        if def.flags.is_unique() {
            return Err(ConfigurationError::PrimaryIsUnique { field });
        }
        if def.flags.is_encrypted() {
            return Err(ConfigurationError::PrimaryIsEncrypted { field });
        }
        if def.single_type() != Some(PRIMARY_TYPE) {
            return Err(ConfigurationError::PrimaryNotString {
                field,
                actual: describe_type(def.field_type.as_ref()),
            });
        }
    }

    if let Some(primary) = primary {
        if schema.required().iter().any(|r| r == primary) {
            return Err(ConfigurationError::PrimaryDeclaredRequired {
                field: primary.to_owned(),
            });
        }
    }
    Ok(())
}

fn lower(schema: &Value) -> Result<SchemaDefinition, ConfigurationError> {
    SchemaDefinition::from_value(schema).map_err(reject)
}

fn reject(error: ConfigurationError) -> ConfigurationError {
    tracing::warn!(%error, "schema rejected");
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, SchemaError};
    use serde_json::json;

    fn config_err(raw: Value) -> ConfigurationError {
        match check_schema(&raw) {
            Err(SchemaError::Configuration(e)) => e,
            other => panic!("expected configuration error for {raw}, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_schema_passes() {
        check_schema(&json!({
            "properties": {
                "name": {"type": "string", "primary": true},
                "age": {"type": "integer", "index": true},
                "nick": {"type": "string"}
            },
            "required": ["age"],
            "compoundIndexes": [["age", "nick"]]
        }))
        .unwrap();
    }

    #[test]
    fn test_check_does_not_mutate_input() {
        let raw = json!({
            "properties": {"name": {"type": "string", "primary": true}},
            "compoundIndexes": [["name"]]
        });
        let before = raw.clone();
        let _ = check_schema(&raw);
        assert_eq!(raw, before);
    }

    #[test]
    fn test_system_fields_rejected() {
        for field in ["_id", "_rev"] {
            let mut props = serde_json::Map::new();
            props.insert(field.to_string(), json!({"type": "string"}));
            let err = config_err(json!({"properties": props}));
            assert_eq!(err, ConfigurationError::SystemFieldDeclared { field: field.into() });
        }
    }

    #[test]
    fn test_system_field_checked_before_field_rules() {
        // `_id` would also fail the underscore rule; the system-field check comes first.
        let err = config_err(json!({"properties": {"_id": {"type": "string"}, "a.b": {}}}));
        assert!(matches!(err, ConfigurationError::SystemFieldDeclared { .. }));
    }

    #[test]
    fn test_dotted_field_rejected() {
        let err = config_err(json!({"properties": {"a.b": {"type": "string"}}}));
        assert!(matches!(err, ConfigurationError::DottedFieldName { .. }));
    }

    #[test]
    fn test_duplicate_primary() {
        let err = config_err(json!({
            "properties": {
                "a": {"type": "string", "primary": true},
                "b": {"type": "string", "primary": true}
            }
        }));
        assert_eq!(
            err,
            ConfigurationError::DuplicatePrimary { first: "a".into(), second: "b".into() }
        );
    }

    #[test]
    fn test_primary_flag_conflicts() {
        let cases = [
            ("index", json!({"type": "string", "primary": true, "index": true})),
            ("unique", json!({"type": "string", "primary": true, "unique": true})),
            ("encrypted", json!({"type": "string", "primary": true, "encrypted": true})),
            ("type", json!({"type": "integer", "primary": true})),
            ("type", json!({"type": ["string", "null"], "primary": true})),
            ("type", json!({"primary": true})),
        ];
        for (what, def) in cases {
            let err = config_err(json!({"properties": {"pk": def}}));
            let ok = match what {
                "index" => matches!(err, ConfigurationError::PrimaryIsIndex { .. }),
                "unique" => matches!(err, ConfigurationError::PrimaryIsUnique { .. }),
                "encrypted" => matches!(err, ConfigurationError::PrimaryIsEncrypted { .. }),
                _ => matches!(err, ConfigurationError::PrimaryNotString { .. }),
            };
            assert!(ok, "{what}: unexpected {err:?}");
        }
    }

    #[test]
    fn test_primary_in_required_rejected() {
        let err = config_err(json!({
            "properties": {"pk": {"type": "string", "primary": true}},
            "required": ["pk"]
        }));
        assert_eq!(err, ConfigurationError::PrimaryDeclaredRequired { field: "pk".into() });
    }

    #[test]
    fn test_compound_indexes_shape() {
        let err = config_err(json!({
            "properties": {"a": {"type": "string"}},
            "compoundIndexes": ["a"]
        }));
        assert!(matches!(err, ConfigurationError::MalformedCompoundIndexes { .. }));
    }

    #[test]
    fn test_indexed_boolean_rejected() {
        let err = config_err(json!({"properties": {"flag": {"type": "boolean", "index": true}}}));
        assert_eq!(
            err,
            ConfigurationError::NonIndexableType { field: "flag".into(), actual: "boolean".into() }
        );
    }

    #[test]
    fn test_compound_index_field_type_checked() {
        let err = config_err(json!({
            "properties": {
                "a": {"type": "string"},
                "score": {"type": "number"}
            },
            "compoundIndexes": [["a", "score"]]
        }));
        assert!(matches!(
            err,
            ConfigurationError::NonIndexableType { ref field, .. } if field == "score"
        ));
    }

    #[test]
    fn test_compound_index_unknown_field() {
        let err = config_err(json!({
            "properties": {"a": {"type": "string"}},
            "compoundIndexes": [["a", "ghost"]]
        }));
        assert_eq!(err, ConfigurationError::UnknownIndexField { field: "ghost".into() });
    }

    #[test]
    fn test_malformed_root() {
        let err = config_err(json!({"required": []}));
        assert!(matches!(err, ConfigurationError::MalformedSchema { .. }));
    }

    #[test]
    fn test_identical_input_identical_error() {
        let raw = json!({"properties": {"flag": {"type": "boolean", "index": true}}});
        assert_eq!(config_err(raw.clone()), config_err(raw));
    }

    #[test]
    fn test_create_fails_without_descriptor() {
        let err = create(&json!({"properties": {"_rev": {"type": "string"}}})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_create_example() {
        let d = create(&json!({
            "properties": {
                "name": {"type": "string", "primary": true},
                "age": {"type": "integer", "index": true}
            }
        }))
        .unwrap();
        assert_eq!(d.primary_path(), Some("name"));
        assert!(d.indexes().contains(&crate::Index::single("age")));
        let required = d.required();
        assert!(required.iter().any(|r| r == "name"));
        assert!(required.iter().any(|r| r == "age"));
    }

    #[test]
    fn test_create_from_definition() {
        let def = SchemaDefinition::from_value(&json!({
            "properties": {"a": {"type": "string", "index": true}}
        }))
        .unwrap();
        let d = create_from_definition(&def).unwrap();
        assert_eq!(d.required(), &["a".to_string()]);
        assert_eq!(def.required, None);
    }
}
