//! # Schema Definition Tree
//!
//! The typed form of a caller-supplied collection schema. Raw JSON is lowered
//! once, at the boundary, into a tagged tree:
//!
//! - [`SchemaDefinition`]: the root: ordered top-level [`Properties`], the
//!   optional `required` list, and the optional `compoundIndexes`.
//! - [`PropertyDefinition`]: one field: its `type`, the engine flags
//!   (`primary`, `index`, `unique`, `encrypted`), `minLength`, and a
//!   [`NodeShape`] saying whether it is a leaf, an object with named
//!   children, or an array with an `items` definition.
//!
//! JSON-schema keywords the engine does not interpret (`maxLength`,
//! `description`, `enum`, ...) are carried verbatim in each node's `extra`
//! map and written back unchanged by [`SchemaDefinition::to_value`].
//!
//! Field traversal goes through [`FieldVisitor`], which sees every field
//! definition depth-first in declaration order together with its dotted path
//! and nesting level.

use std::fmt;
use std::ops::ControlFlow;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::ConfigurationError;
use crate::indexes::Index;

const KW_TYPE: &str = "type";
const KW_PRIMARY: &str = "primary";
const KW_INDEX: &str = "index";
const KW_UNIQUE: &str = "unique";
const KW_ENCRYPTED: &str = "encrypted";
const KW_MIN_LENGTH: &str = "minLength";
const KW_PROPERTIES: &str = "properties";
const KW_ITEMS: &str = "items";
const KW_REQUIRED: &str = "required";
const KW_COMPOUND_INDEXES: &str = "compoundIndexes";
const KW_VERSION: &str = "version";

/// Location label used in errors about the root object.
const ROOT: &str = "(root)";

/// A JSON-schema primitive type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// `"string"`
    String,
    /// `"integer"`
    Integer,
    /// `"number"`
    Number,
    /// `"boolean"`
    Boolean,
    /// `"object"`
    Object,
    /// `"array"`
    Array,
    /// `"null"`
    Null,
}

impl FieldType {
    /// The JSON-schema name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Null => "null",
        }
    }

    /// Parse a JSON-schema type name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "string" => Self::String,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "object" => Self::Object,
            "array" => Self::Array,
            "null" => Self::Null,
            _ => return None,
        })
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `type` keyword of a field: a single type or a union such as
/// `["string", "null"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDecl {
    /// `"type": "string"`
    Single(FieldType),
    /// `"type": ["string", "null"]`
    Union(Vec<FieldType>),
}

impl TypeDecl {
    /// The single declared type, or `None` for a union.
    pub fn single(&self) -> Option<FieldType> {
        match self {
            Self::Single(t) => Some(*t),
            Self::Union(_) => None,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Single(t) => Value::from(t.as_str()),
            Self::Union(ts) => Value::Array(ts.iter().map(|t| Value::from(t.as_str())).collect()),
        }
    }
}

impl fmt::Display for TypeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(t) => write!(f, "{t}"),
            Self::Union(ts) => {
                let names: Vec<&str> = ts.iter().map(FieldType::as_str).collect();
                write!(f, "[{}]", names.join(", "))
            }
        }
    }
}

/// Render an optional type declaration for error messages.
pub(crate) fn describe_type(decl: Option<&TypeDecl>) -> String {
    decl.map_or_else(|| "none".to_string(), ToString::to_string)
}

/// Engine flags on a field. `None` means the flag was not written; an
/// explicit `false` is kept so normalization does not rewrite the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldFlags {
    /// `primary`
    pub primary: Option<bool>,
    /// `index`
    pub index: Option<bool>,
    /// `unique`
    pub unique: Option<bool>,
    /// `encrypted`
    pub encrypted: Option<bool>,
}

impl FieldFlags {
    /// `primary: true`
    pub fn is_primary(&self) -> bool {
        self.primary.unwrap_or(false)
    }

    /// `index: true`
    pub fn is_index(&self) -> bool {
        self.index.unwrap_or(false)
    }

    /// `unique: true`
    pub fn is_unique(&self) -> bool {
        self.unique.unwrap_or(false)
    }

    /// `encrypted: true`
    pub fn is_encrypted(&self) -> bool {
        self.encrypted.unwrap_or(false)
    }
}

/// Structural shape of a field definition.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeShape {
    /// No nested definition.
    Leaf,
    /// Object with named child fields (`properties`).
    Object(Properties),
    /// Array with an element definition (`items`).
    Array(Box<PropertyDefinition>),
}

/// A single field definition.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDefinition {
    /// Declared `type`.
    pub field_type: Option<TypeDecl>,
    /// Engine flags.
    pub flags: FieldFlags,
    /// `minLength`.
    pub min_length: Option<u64>,
    /// Leaf, object or array.
    pub shape: NodeShape,
    /// Keywords the engine does not interpret, in input order.
    pub extra: Map<String, Value>,
}

impl PropertyDefinition {
    /// A leaf definition of the given type with no flags.
    pub fn leaf(field_type: FieldType) -> Self {
        Self {
            field_type: Some(TypeDecl::Single(field_type)),
            flags: FieldFlags::default(),
            min_length: None,
            shape: NodeShape::Leaf,
            extra: Map::new(),
        }
    }

    /// The single declared type, if the field has exactly one.
    pub fn single_type(&self) -> Option<FieldType> {
        self.field_type.as_ref().and_then(TypeDecl::single)
    }

    /// Named children, if this is an object definition.
    pub fn properties(&self) -> Option<&Properties> {
        match &self.shape {
            NodeShape::Object(props) => Some(props),
            _ => None,
        }
    }

    /// Element definition, if this is an array definition.
    pub fn items(&self) -> Option<&PropertyDefinition> {
        match &self.shape {
            NodeShape::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Lower a JSON field definition. `location` is the dotted path used in
    /// error messages.
    pub fn from_value(value: &Value, location: &str) -> Result<Self, ConfigurationError> {
        let obj = value.as_object().ok_or_else(|| {
            ConfigurationError::malformed(location, "field definition must be an object")
        })?;

        let mut def = Self {
            field_type: None,
            flags: FieldFlags::default(),
            min_length: None,
            shape: NodeShape::Leaf,
            extra: Map::new(),
        };
        let mut items = None;

        for (key, v) in obj {
            match key.as_str() {
                KW_TYPE => def.field_type = Some(parse_type(v, location)?),
                KW_PRIMARY => def.flags.primary = Some(parse_flag(v, key, location)?),
                KW_INDEX => def.flags.index = Some(parse_flag(v, key, location)?),
                KW_UNIQUE => def.flags.unique = Some(parse_flag(v, key, location)?),
                KW_ENCRYPTED => def.flags.encrypted = Some(parse_flag(v, key, location)?),
                KW_MIN_LENGTH => {
                    let n = v.as_u64().ok_or_else(|| {
                        ConfigurationError::malformed(
                            location,
                            "minLength must be a non-negative integer",
                        )
                    })?;
                    def.min_length = Some(n);
                }
                KW_PROPERTIES => {
                    def.shape = NodeShape::Object(Properties::from_value(v, Some(location))?);
                }
                // Tuple-form `items` (an array of schemas) is carried verbatim.
                KW_ITEMS if v.is_object() => items = Some(v),
                _ => {
                    def.extra.insert(key.clone(), v.clone());
                }
            }
        }

        if let Some(items) = items {
            if matches!(def.shape, NodeShape::Object(_)) {
                return Err(ConfigurationError::malformed(
                    location,
                    "a field cannot declare both properties and items",
                ));
            }
            let item_location = format!("{location}.{KW_ITEMS}");
            def.shape = NodeShape::Array(Box::new(Self::from_value(items, &item_location)?));
        }

        Ok(def)
    }

    /// Render back to JSON.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        if let Some(t) = &self.field_type {
            out.insert(KW_TYPE.into(), t.to_value());
        }
        let flags = [
            (KW_PRIMARY, self.flags.primary),
            (KW_INDEX, self.flags.index),
            (KW_UNIQUE, self.flags.unique),
            (KW_ENCRYPTED, self.flags.encrypted),
        ];
        for (name, flag) in flags {
            if let Some(b) = flag {
                out.insert(name.into(), Value::Bool(b));
            }
        }
        if let Some(n) = self.min_length {
            out.insert(KW_MIN_LENGTH.into(), Value::from(n));
        }
        match &self.shape {
            NodeShape::Leaf => {}
            NodeShape::Object(props) => {
                out.insert(KW_PROPERTIES.into(), props.to_value());
            }
            NodeShape::Array(items) => {
                out.insert(KW_ITEMS.into(), items.to_value());
            }
        }
        for (k, v) in &self.extra {
            out.insert(k.clone(), v.clone());
        }
        Value::Object(out)
    }
}

impl Serialize for PropertyDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

fn parse_flag(v: &Value, key: &str, location: &str) -> Result<bool, ConfigurationError> {
    v.as_bool()
        .ok_or_else(|| ConfigurationError::malformed(location, format!("{key} must be a boolean")))
}

fn parse_type(v: &Value, location: &str) -> Result<TypeDecl, ConfigurationError> {
    let name_to_type = |name: &Value| {
        name.as_str().and_then(FieldType::from_name).ok_or_else(|| {
            ConfigurationError::malformed(location, format!("unknown type {name}"))
        })
    };
    match v {
        Value::String(_) => Ok(TypeDecl::Single(name_to_type(v)?)),
        Value::Array(names) if !names.is_empty() => Ok(TypeDecl::Union(
            names.iter().map(name_to_type).collect::<Result<_, _>>()?,
        )),
        _ => Err(ConfigurationError::malformed(
            location,
            "type must be a type name or a non-empty array of type names",
        )),
    }
}

/// Ordered map of field name to definition. Declaration order is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    entries: Vec<(String, PropertyDefinition)>,
}

impl Properties {
    /// An empty property map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&PropertyDefinition> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    /// Whether a field with this name is declared.
    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert or replace a field. A new field is appended; a replaced field
    /// keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, def: PropertyDefinition) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = def,
            None => self.entries.push((name, def)),
        }
    }

    /// Fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyDefinition)> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d))
    }

    /// Field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn from_value(value: &Value, parent: Option<&str>) -> Result<Self, ConfigurationError> {
        let obj = value.as_object().ok_or_else(|| {
            ConfigurationError::malformed(parent.unwrap_or(ROOT), "properties must be an object")
        })?;
        let mut entries = Vec::with_capacity(obj.len());
        for (name, def) in obj {
            let location = match parent {
                Some(p) => format!("{p}.{name}"),
                None => name.clone(),
            };
            entries.push((name.clone(), PropertyDefinition::from_value(def, &location)?));
        }
        Ok(Self { entries })
    }

    fn to_value(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(n, d)| (n.clone(), d.to_value()))
                .collect(),
        )
    }
}

/// The `compoundIndexes` keyword as found in the input.
///
/// A malformed value is kept rather than rejected during lowering so that the
/// normalizer reports it in its documented check order.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CompoundIndexes {
    /// Keyword not present.
    #[default]
    Absent,
    /// Well-formed array of arrays of strings.
    Declared(Vec<Index>),
    /// Present but not array-of-array-of-string.
    Malformed {
        /// The raw value.
        raw: Value,
        /// What was wrong.
        reason: String,
    },
}

impl CompoundIndexes {
    /// Declared compound indexes; empty when absent or malformed.
    pub fn declared(&self) -> &[Index] {
        match self {
            Self::Declared(indexes) => indexes,
            _ => &[],
        }
    }

    fn from_value(value: &Value) -> Self {
        match parse_compound_indexes(value) {
            Ok(indexes) => Self::Declared(indexes),
            Err(reason) => Self::Malformed {
                raw: value.clone(),
                reason,
            },
        }
    }

    fn to_value(&self) -> Option<Value> {
        match self {
            Self::Absent => None,
            Self::Declared(indexes) => Some(Value::Array(
                indexes
                    .iter()
                    .map(|i| {
                        Value::Array(i.fields().iter().map(|f| Value::from(f.as_str())).collect())
                    })
                    .collect(),
            )),
            Self::Malformed { raw, .. } => Some(raw.clone()),
        }
    }
}

fn parse_compound_indexes(value: &Value) -> Result<Vec<Index>, String> {
    let outer = value.as_array().ok_or("expected an array")?;
    outer
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let inner = entry
                .as_array()
                .ok_or_else(|| format!("entry {i} is not an array"))?;
            let fields = inner
                .iter()
                .map(|f| f.as_str().map(str::to_owned))
                .collect::<Option<Vec<String>>>()
                .ok_or_else(|| format!("entry {i} contains a non-string field name"))?;
            Index::new(fields).ok_or_else(|| format!("entry {i} is empty"))
        })
        .collect()
}

/// The root of a collection schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDefinition {
    /// Top-level fields in declaration order.
    pub properties: Properties,
    /// `required`, if written.
    pub required: Option<Vec<String>>,
    /// `compoundIndexes`, if written.
    pub compound_indexes: CompoundIndexes,
    /// Root keywords the engine does not interpret, in input order.
    pub extra: Map<String, Value>,
}

impl SchemaDefinition {
    /// Lower a raw JSON schema into the typed tree.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MalformedSchema`] when the input is not
    /// shaped like a schema. A malformed `compoundIndexes` is not an error
    /// here; see [`CompoundIndexes::Malformed`].
    pub fn from_value(value: &Value) -> Result<Self, ConfigurationError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ConfigurationError::malformed(ROOT, "schema must be an object"))?;

        let properties = match obj.get(KW_PROPERTIES) {
            Some(v) => Properties::from_value(v, None)?,
            None => return Err(ConfigurationError::malformed(ROOT, "schema has no properties")),
        };

        let mut def = Self {
            properties,
            required: None,
            compound_indexes: CompoundIndexes::Absent,
            extra: Map::new(),
        };

        for (key, v) in obj {
            match key.as_str() {
                KW_PROPERTIES => {}
                KW_REQUIRED => def.required = Some(parse_required(v)?),
                KW_COMPOUND_INDEXES => def.compound_indexes = CompoundIndexes::from_value(v),
                _ => {
                    def.extra.insert(key.clone(), v.clone());
                }
            }
        }
        Ok(def)
    }

    /// Render back to JSON: uninterpreted root keywords first, then
    /// `properties`, `required` and `compoundIndexes`.
    pub fn to_value(&self) -> Value {
        let mut out = self.extra.clone();
        out.insert(KW_PROPERTIES.into(), self.properties.to_value());
        if let Some(required) = &self.required {
            out.insert(
                KW_REQUIRED.into(),
                Value::Array(required.iter().map(|r| Value::from(r.as_str())).collect()),
            );
        }
        if let Some(ci) = self.compound_indexes.to_value() {
            out.insert(KW_COMPOUND_INDEXES.into(), ci);
        }
        Value::Object(out)
    }

    /// The `required` list, empty when not written.
    pub fn required(&self) -> &[String] {
        self.required.as_deref().unwrap_or(&[])
    }

    /// The schema's `version` keyword, when it is a non-negative integer.
    pub fn version(&self) -> Option<u64> {
        self.extra.get(KW_VERSION).and_then(Value::as_u64)
    }

    /// Visit every field definition depth-first in declaration order.
    ///
    /// An object field's children sit one nesting level below it. An array
    /// field's `items` definition is visited as a child named `items`, and
    /// its own children one level further down.
    pub fn walk<V: FieldVisitor>(&self, visitor: &mut V) -> ControlFlow<V::Break> {
        let mut path = Vec::new();
        walk_properties(&self.properties, &mut path, 0, visitor)
    }
}

impl Serialize for SchemaDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SchemaDefinition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<&Value> for SchemaDefinition {
    type Error = ConfigurationError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

fn parse_required(v: &Value) -> Result<Vec<String>, ConfigurationError> {
    v.as_array()
        .and_then(|names| {
            names
                .iter()
                .map(|n| n.as_str().map(str::to_owned))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or_else(|| ConfigurationError::malformed(ROOT, "required must be an array of strings"))
}

/// What to do after visiting a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// Visit this field's children.
    Descend,
    /// Do not visit this field's children.
    Skip,
}

/// A field seen during [`SchemaDefinition::walk`].
#[derive(Debug, Clone, Copy)]
pub struct FieldVisit<'a> {
    /// Path segments from the root to this field, inclusive.
    pub path: &'a [&'a str],
    /// Number of enclosing fields; 0 for top-level fields.
    pub nesting: usize,
    /// The field definition.
    pub definition: &'a PropertyDefinition,
}

impl FieldVisit<'_> {
    /// The field's own name.
    pub fn name(&self) -> &str {
        self.path.last().copied().unwrap_or_default()
    }

    /// The dotted path from the root.
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }

    /// Whether this is a top-level field.
    pub fn is_top_level(&self) -> bool {
        self.nesting == 0
    }
}

/// Callback for [`SchemaDefinition::walk`]. Returning `Break` stops the walk.
pub trait FieldVisitor {
    /// Value carried out of the walk when it stops early.
    type Break;

    /// Called once per field, parent before children.
    fn visit(&mut self, field: FieldVisit<'_>) -> ControlFlow<Self::Break, Walk>;
}

fn walk_properties<'a, V: FieldVisitor>(
    properties: &'a Properties,
    path: &mut Vec<&'a str>,
    nesting: usize,
    visitor: &mut V,
) -> ControlFlow<V::Break> {
    for (name, def) in properties.iter() {
        path.push(name);
        let flow = walk_field(def, path, nesting, visitor);
        path.pop();
        flow?;
    }
    ControlFlow::Continue(())
}

fn walk_field<'a, V: FieldVisitor>(
    def: &'a PropertyDefinition,
    path: &mut Vec<&'a str>,
    nesting: usize,
    visitor: &mut V,
) -> ControlFlow<V::Break> {
    let visit = FieldVisit {
        path,
        nesting,
        definition: def,
    };
    if visitor.visit(visit)? == Walk::Skip {
        return ControlFlow::Continue(());
    }
    match &def.shape {
        NodeShape::Leaf => ControlFlow::Continue(()),
        NodeShape::Object(props) => walk_properties(props, path, nesting + 1, visitor),
        NodeShape::Array(items) => {
            path.push(KW_ITEMS);
            let flow = walk_field(items, path, nesting + 1, visitor);
            path.pop();
            flow
        }
    }
}
