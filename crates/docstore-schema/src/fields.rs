//! # Field Rules
//!
//! Naming and placement rules checked on every field of a schema, at every
//! depth:
//!
//! - no reserved names ([`RESERVED_FIELD_NAMES`]);
//! - no dots in a name;
//! - `primary` and `index` only on top-level fields;
//! - no leading underscore on top-level names (that namespace belongs to the
//!   store's system fields).
//!
//! The first violation found stops the check.

use std::ops::ControlFlow;

use crate::definition::{FieldVisit, FieldVisitor, SchemaDefinition, Walk};
use crate::error::ConfigurationError;
use crate::rules::RESERVED_FIELD_NAMES;

struct FieldRules;

impl FieldVisitor for FieldRules {
    type Break = ConfigurationError;

    fn visit(&mut self, field: FieldVisit<'_>) -> ControlFlow<ConfigurationError, Walk> {
        match check_field(&field) {
            Ok(()) => ControlFlow::Continue(Walk::Descend),
            Err(e) => ControlFlow::Break(e),
        }
    }
}

fn check_field(field: &FieldVisit<'_>) -> Result<(), ConfigurationError> {
    let name = field.name();

    if RESERVED_FIELD_NAMES.contains(&name) {
        return Err(ConfigurationError::ReservedFieldName {
            name: name.to_owned(),
            path: field.dotted_path(),
        });
    }
    if name.contains('.') {
        return Err(ConfigurationError::DottedFieldName {
            path: field.dotted_path(),
        });
    }

    let flags = &field.definition.flags;
    if field.is_top_level() {
        if name.starts_with('_') {
            return Err(ConfigurationError::UnderscoreTopLevelField {
                name: name.to_owned(),
            });
        }
    } else if flags.is_primary() {
        return Err(ConfigurationError::NestedTopLevelFlag {
            flag: "primary",
            path: field.dotted_path(),
        });
    } else if flags.is_index() {
        return Err(ConfigurationError::NestedTopLevelFlag {
            flag: "index",
            path: field.dotted_path(),
        });
    }
    Ok(())
}

/// Check every field of `schema` against the naming and placement rules.
///
/// # Errors
///
/// Returns the first [`ConfigurationError`] found, depth-first in
/// declaration order.
pub fn validate_fields_deep(schema: &SchemaDefinition) -> Result<(), ConfigurationError> {
    match schema.walk(&mut FieldRules) {
        ControlFlow::Continue(()) => Ok(()),
        ControlFlow::Break(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn check(raw: Value) -> Result<(), ConfigurationError> {
        validate_fields_deep(&SchemaDefinition::from_value(&raw).unwrap())
    }

    #[test]
    fn test_valid_nested_schema() {
        check(json!({
            "properties": {
                "name": {"type": "string", "primary": true},
                "age": {"type": "integer", "index": true},
                "address": {
                    "type": "object",
                    "properties": {
                        "_street": {"type": "string"},
                        "city": {"type": "string"}
                    }
                }
            }
        }))
        .unwrap();
    }

    #[test]
    fn test_dotted_name() {
        let err = check(json!({"properties": {"a.b": {"type": "string"}}})).unwrap_err();
        assert_eq!(err, ConfigurationError::DottedFieldName { path: "a.b".into() });
    }

    #[test]
    fn test_dotted_nested_name() {
        let err = check(json!({
            "properties": {
                "o": {"type": "object", "properties": {"x.y": {"type": "string"}}}
            }
        }))
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::DottedFieldName { .. }));
    }

    #[test]
    fn test_reserved_names_at_any_depth() {
        let err = check(json!({"properties": {"language": {"type": "string"}}})).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::ReservedFieldName { ref name, .. } if name == "language"
        ));

        let err = check(json!({
            "properties": {
                "o": {
                    "type": "object",
                    "properties": {"properties": {"type": "string"}}
                }
            }
        }))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::ReservedFieldName {
                name: "properties".into(),
                path: "o.properties".into()
            }
        );
    }

    #[test]
    fn test_top_level_underscore() {
        let err = check(json!({"properties": {"_secret": {"type": "string"}}})).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnderscoreTopLevelField { name: "_secret".into() }
        );
    }

    #[test]
    fn test_nested_primary() {
        let err = check(json!({
            "properties": {
                "o": {
                    "type": "object",
                    "properties": {"id": {"type": "string", "primary": true}}
                }
            }
        }))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::NestedTopLevelFlag { flag: "primary", path: "o.id".into() }
        );
    }

    #[test]
    fn test_nested_index_inside_array_items() {
        let err = check(json!({
            "properties": {
                "list": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {"x": {"type": "string", "index": true}}
                    }
                }
            }
        }))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::NestedTopLevelFlag { flag: "index", path: "list.items.x".into() }
        );
    }

    #[test]
    fn test_items_definition_cannot_be_primary() {
        let err = check(json!({
            "properties": {
                "list": {"type": "array", "items": {"type": "string", "primary": true}}
            }
        }))
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::NestedTopLevelFlag { flag: "primary", .. }));
    }

    #[test]
    fn test_first_violation_wins() {
        let err = check(json!({
            "properties": {
                "_a": {"type": "string"},
                "b.c": {"type": "string"}
            }
        }))
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnderscoreTopLevelField { .. }));
    }
}
