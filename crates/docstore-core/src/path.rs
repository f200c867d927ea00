//! # Dotted Object Paths
//!
//! A document field is addressed by a dotted path such as `"address.city"`.
//! Inside a schema the same field lives at
//! `"properties.address.properties.city"`; [`ObjectPath::to_schema_path`]
//! performs that translation.
//!
//! [`get_by_dotted_path`] resolves a dotted path inside any JSON value.
//! Object segments are looked up by key; array segments must parse as a
//! zero-based index.

use std::fmt;

use serde_json::Value;

use crate::error::PathError;

/// The schema keyword that holds an object's named children.
pub const PROPERTIES_HOP: &str = "properties";

/// A parsed, non-empty dotted path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectPath {
    segments: Vec<String>,
}

impl ObjectPath {
    /// Parse a dotted path.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Empty`] for `""` and [`PathError::EmptySegment`]
    /// when any segment between dots is empty.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }
        let segments: Vec<String> = path.split('.').map(str::to_owned).collect();
        if let Some(position) = segments.iter().position(String::is_empty) {
            return Err(PathError::EmptySegment {
                path: path.to_owned(),
                position,
            });
        }
        Ok(Self { segments })
    }

    /// The individual path segments, root first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Translate to schema addressing: `a.b` becomes `properties.a.properties.b`.
    pub fn to_schema_path(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(PROPERTIES_HOP);
            out.push('.');
            out.push_str(segment);
        }
        out
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl std::str::FromStr for ObjectPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Resolve a dotted path inside a JSON value.
///
/// Returns `None` when any segment is missing, when an intermediate value is
/// a scalar, or when an array segment is not a valid index. The empty path
/// resolves to the value itself.
pub fn get_by_dotted_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_and_display() {
        let p = ObjectPath::parse("address.city").unwrap();
        assert_eq!(p.segments(), &["address".to_string(), "city".to_string()]);
        assert_eq!(p.to_string(), "address.city");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(ObjectPath::parse(""), Err(PathError::Empty));
        assert!(matches!(
            ObjectPath::parse("a..b"),
            Err(PathError::EmptySegment { position: 1, .. })
        ));
        assert!(matches!(
            ObjectPath::parse(".a"),
            Err(PathError::EmptySegment { position: 0, .. })
        ));
    }

    #[test]
    fn test_schema_path_translation() {
        let p: ObjectPath = "a.b.c".parse().unwrap();
        assert_eq!(p.to_schema_path(), "properties.a.properties.b.properties.c");
        let single = ObjectPath::parse("name").unwrap();
        assert_eq!(single.to_schema_path(), "properties.name");
    }

    #[test]
    fn test_get_by_dotted_path() {
        let doc = json!({
            "properties": {
                "address": {"properties": {"city": {"type": "string"}}}
            },
            "list": [{"x": 1}, {"x": 2}]
        });
        assert_eq!(
            get_by_dotted_path(&doc, "properties.address.properties.city"),
            Some(&json!({"type": "string"}))
        );
        assert_eq!(get_by_dotted_path(&doc, "list.1.x"), Some(&json!(2)));
        assert_eq!(get_by_dotted_path(&doc, "list.9.x"), None);
        assert_eq!(get_by_dotted_path(&doc, "list.x"), None);
        assert_eq!(get_by_dotted_path(&doc, "properties.missing"), None);
        assert_eq!(get_by_dotted_path(&doc, ""), Some(&doc));
    }

    #[test]
    fn test_scalar_intermediate_yields_none() {
        let doc = json!({"a": "text"});
        assert_eq!(get_by_dotted_path(&doc, "a.b"), None);
    }
}
