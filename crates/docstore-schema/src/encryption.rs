//! # Encrypted Path Discovery
//!
//! Finds every node marked `encrypted: true` and records it under its full
//! dotted path. Encryption itself happens outside this crate; the store only
//! needs to know which paths to hand to the cipher.
//!
//! Every attribute of a definition is searched, not only the typed field
//! tree. `properties` is a transparent hop; any other attribute name becomes
//! a path segment, and array positions become numeric segments. So an
//! encrypted field inside array elements is `list.items.secret`, one under
//! `additionalProperties` is `secrets.additionalProperties`, and the first
//! `oneOf` branch of `contact` is `contact.oneOf.0`.
//!
//! An encrypted node is recorded as a whole and not descended into: a
//! nested object under an encrypted node is encrypted with it.

use std::collections::BTreeMap;
use std::ops::ControlFlow;

use serde::Serialize;
use serde_json::Value;

use crate::definition::{FieldVisit, FieldVisitor, SchemaDefinition, Walk};

const KW_ENCRYPTED: &str = "encrypted";
const KW_PROPERTIES: &str = "properties";

/// Dotted path → the definition that declared `encrypted: true`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EncryptedPathMap {
    entries: BTreeMap<String, Value>,
}

impl EncryptedPathMap {
    /// Definition recorded for a path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.entries.get(path)
    }

    /// Whether a path is encrypted.
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// All encrypted paths, sorted.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Path and definition pairs, sorted by path.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of encrypted paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no path is encrypted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Search uninterpreted schema JSON below `path`.
    fn scan_raw(&mut self, node: &Value, path: &mut Vec<String>) {
        match node {
            Value::Object(map) => {
                if map.get(KW_ENCRYPTED).and_then(Value::as_bool) == Some(true) {
                    self.entries.insert(path.join("."), node.clone());
                    return;
                }
                for (key, child) in map {
                    if key == KW_PROPERTIES {
                        self.scan_raw(child, path);
                    } else {
                        path.push(key.clone());
                        self.scan_raw(child, path);
                        path.pop();
                    }
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    path.push(i.to_string());
                    self.scan_raw(child, path);
                    path.pop();
                }
            }
            _ => {}
        }
    }
}

#[derive(Default)]
struct EncryptionScanner {
    found: EncryptedPathMap,
}

impl FieldVisitor for EncryptionScanner {
    type Break = std::convert::Infallible;

    fn visit(&mut self, field: FieldVisit<'_>) -> ControlFlow<Self::Break, Walk> {
        let definition = field.definition;
        if definition.flags.is_encrypted() {
            self.found
                .entries
                .insert(field.dotted_path(), definition.to_value());
            return ControlFlow::Continue(Walk::Skip);
        }

        // Keywords outside the typed tree (`additionalProperties`, `oneOf`,
        // tuple-form `items`, ...) can still hold encrypted definitions.
        let mut path: Vec<String> = field.path.iter().map(|s| (*s).to_owned()).collect();
        for (key, child) in &definition.extra {
            path.push(key.clone());
            self.found.scan_raw(child, &mut path);
            path.pop();
        }
        ControlFlow::Continue(Walk::Descend)
    }
}

/// Every encrypted path in `schema`.
pub fn get_encrypted_paths(schema: &SchemaDefinition) -> EncryptedPathMap {
    let mut scanner = EncryptionScanner::default();
    if let ControlFlow::Break(never) = schema.walk(&mut scanner) {
        match never {}
    }

    let mut path = Vec::new();
    for (key, child) in &schema.extra {
        path.push(key.clone());
        scanner.found.scan_raw(child, &mut path);
        path.pop();
    }
    scanner.found
}

/// Whether `schema` has at least one encrypted path.
pub fn has_crypt(schema: &SchemaDefinition) -> bool {
    !get_encrypted_paths(schema).is_empty()
}
