//! Primary key lookup.

use crate::definition::SchemaDefinition;

/// The first top-level field, in declaration order, with `primary: true`.
///
/// At most one primary is allowed; that rule is enforced by the normalizer,
/// not here.
pub fn get_primary(schema: &SchemaDefinition) -> Option<&str> {
    schema
        .properties
        .iter()
        .find(|(_, def)| def.flags.is_primary())
        .map(|(name, _)| name)
}
