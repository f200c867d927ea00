//! # Index Resolution
//!
//! An index is an ordered, non-empty list of top-level field names. Simple
//! indexes come from `index: true` fields; compound indexes are taken verbatim
//! from `compoundIndexes`.
//!
//! Duplicates are removed by comparing the field-name lists by value, so two
//! compound indexes written separately with the same fields in the same order
//! collapse into one. Order matters: `["a", "b"]` and `["b", "a"]` are
//! distinct indexes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::definition::SchemaDefinition;

/// An ordered, non-empty list of field names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Index(Vec<String>);

impl Index {
    /// Build an index; `None` if `fields` is empty.
    pub fn new(fields: Vec<String>) -> Option<Self> {
        (!fields.is_empty()).then_some(Self(fields))
    }

    /// A one-field index.
    pub fn single(field: impl Into<String>) -> Self {
        Self(vec![field.into()])
    }

    /// The indexed fields in order.
    pub fn fields(&self) -> &[String] {
        &self.0
    }

    /// Whether this index covers more than one field.
    pub fn is_compound(&self) -> bool {
        self.0.len() > 1
    }
}

impl TryFrom<Vec<String>> for Index {
    type Error = &'static str;

    fn try_from(fields: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(fields).ok_or("an index needs at least one field")
    }
}

impl From<Index> for Vec<String> {
    fn from(index: Index) -> Self {
        index.0
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Simple indexes from top-level `index: true` fields, in declaration order,
/// followed by the declared compound indexes, with value-equal duplicates
/// removed (first occurrence wins).
///
/// A malformed `compoundIndexes` contributes nothing; the normalizer rejects
/// such a schema before this matters.
pub fn get_indexes(schema: &SchemaDefinition) -> Vec<Index> {
    let simple = schema
        .properties
        .iter()
        .filter(|(_, def)| def.flags.is_index())
        .map(|(name, _)| Index::single(name));
    let compound = schema.compound_indexes.declared().iter().cloned();

    let mut out: Vec<Index> = Vec::new();
    for index in simple.chain(compound) {
        if !out.contains(&index) {
            out.push(index);
        }
    }
    out
}

/// Every field name referenced by any index, each once, in first-seen order.
pub fn indexed_fields(indexes: &[Index]) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for field in indexes.iter().flat_map(|i| i.fields()) {
        if !out.contains(&field.as_str()) {
            out.push(field);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(raw: serde_json::Value) -> SchemaDefinition {
        SchemaDefinition::from_value(&raw).unwrap()
    }

    fn idx(fields: &[&str]) -> Index {
        Index::new(fields.iter().map(|f| f.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_simple_then_compound_in_order() {
        let s = schema(json!({
            "properties": {
                "b": {"type": "string", "index": true},
                "a": {"type": "integer", "index": true},
                "c": {"type": "string"}
            },
            "compoundIndexes": [["c", "a"]]
        }));
        assert_eq!(get_indexes(&s), vec![idx(&["b"]), idx(&["a"]), idx(&["c", "a"])]);
    }

    #[test]
    fn test_content_equal_compound_indexes_deduplicated() {
        let s = schema(json!({
            "properties": {
                "a": {"type": "string"},
                "b": {"type": "string"}
            },
            "compoundIndexes": [["a", "b"], ["b", "a"], ["a", "b"]]
        }));
        assert_eq!(get_indexes(&s), vec![idx(&["a", "b"]), idx(&["b", "a"])]);
    }

    #[test]
    fn test_compound_single_field_duplicate_of_simple_index() {
        let s = schema(json!({
            "properties": {"a": {"type": "string", "index": true}},
            "compoundIndexes": [["a"]]
        }));
        assert_eq!(get_indexes(&s), vec![idx(&["a"])]);
    }

    #[test]
    fn test_no_indexes() {
        let s = schema(json!({"properties": {"a": {"type": "string"}}}));
        assert!(get_indexes(&s).is_empty());
    }

    #[test]
    fn test_malformed_compound_indexes_contribute_nothing() {
        let s = schema(json!({
            "properties": {"a": {"type": "string", "index": true}},
            "compoundIndexes": ["a"]
        }));
        assert_eq!(get_indexes(&s), vec![idx(&["a"])]);
    }

    #[test]
    fn test_indexed_fields_union() {
        let indexes = vec![idx(&["a"]), idx(&["b", "a"]), idx(&["c"])];
        assert_eq!(indexed_fields(&indexes), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_index_serde_shape() {
        let i = idx(&["x", "y"]);
        assert_eq!(serde_json::to_value(&i).unwrap(), json!(["x", "y"]));
        assert!(serde_json::from_value::<Index>(json!([])).is_err());
        assert!(i.is_compound());
        assert_eq!(i.to_string(), "[x, y]");
    }
}
