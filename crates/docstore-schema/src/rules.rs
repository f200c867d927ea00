//! Fixed naming and typing rules of the store.

use crate::definition::{FieldType, PropertyDefinition};

/// Field names that may not be used at any depth.
pub const RESERVED_FIELD_NAMES: &[&str] = &["properties", "language"];

/// The store's internal document identifier.
pub const ID_FIELD: &str = "_id";

/// The store's revision token.
pub const REV_FIELD: &str = "_rev";

/// Fields injected into every normalized schema. Callers may not declare them.
pub const SYSTEM_FIELDS: &[&str] = &[ID_FIELD, REV_FIELD];

/// `minLength` of every system field.
pub const SYSTEM_FIELD_MIN_LENGTH: u64 = 1;

/// Types a field must have to take part in an index.
pub const INDEXABLE_TYPES: &[FieldType] = &[FieldType::String, FieldType::Integer];

/// Type the primary field must have.
pub const PRIMARY_TYPE: FieldType = FieldType::String;

/// `{type: "string", minLength: 1}`
pub fn system_field_definition() -> PropertyDefinition {
    PropertyDefinition {
        min_length: Some(SYSTEM_FIELD_MIN_LENGTH),
        ..PropertyDefinition::leaf(FieldType::String)
    }
}

/// Whether a field of this type may be indexed.
pub fn is_indexable(field_type: Option<FieldType>) -> bool {
    field_type.is_some_and(|t| INDEXABLE_TYPES.contains(&t))
}
