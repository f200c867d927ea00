//! # Schema Descriptor
//!
//! The long-lived, enriched form of a validated schema. One descriptor is
//! built per collection definition and shared read-only by every document
//! operation on that collection (wrap it in an `Arc`).
//!
//! ## Normalization
//!
//! Construction takes an owned copy of the caller's definition and:
//!
//! 1. moves `compoundIndexes` out of the schema root into
//!    [`SchemaDescriptor::compound_indexes`];
//! 2. resolves the simple indexes of the remaining schema;
//! 3. appends every indexed field, then the primary field, to `required`;
//! 4. injects the `_id` and `_rev` system fields (`{type: "string", minLength: 1}`);
//! 5. closes the schema with `additionalProperties: false`;
//! 6. hashes the result (JCS + SHA-256).
//!
//! After construction nothing changes except two compute-once caches: the
//! encrypted-path map and the compiled document validator. Both are pure
//! functions of the normalized schema.

use std::fmt;

use docstore_core::{get_by_dotted_path, sha256_digest, CanonicalBytes, ContentDigest, ObjectPath};
use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::definition::{CompoundIndexes, PropertyDefinition, SchemaDefinition};
use crate::encryption::{get_encrypted_paths, has_crypt, EncryptedPathMap};
use crate::error::SchemaResult;
use crate::indexes::{get_indexes, indexed_fields, Index};
use crate::primary::get_primary;
use crate::rules::{system_field_definition, ID_FIELD, REV_FIELD};
#[cfg(feature = "validation")]
use crate::validate::DocumentValidator;

/// Serializable view of a descriptor's derived metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorSummary {
    /// Simple indexes of the normalized schema.
    pub indexes: Vec<Index>,
    /// Compound indexes moved out of the schema root.
    pub compound_indexes: Vec<Index>,
    /// The primary field, if any.
    pub primary_path: Option<String>,
    /// Whether any field is encrypted.
    pub crypt: bool,
    /// Hex SHA-256 of the normalized schema.
    pub hash: String,
}

/// The immutable, enriched representation of a validated schema.
pub struct SchemaDescriptor {
    definition: SchemaDefinition,
    normalized: Value,
    indexes: Vec<Index>,
    compound_indexes: Vec<Index>,
    primary_path: Option<String>,
    crypt: bool,
    digest: ContentDigest,
    encrypted_paths: OnceCell<EncryptedPathMap>,
    #[cfg(feature = "validation")]
    validator: OnceCell<DocumentValidator>,
}

impl SchemaDescriptor {
    /// Build a descriptor from a definition that has already passed
    /// [`check_definition`](crate::check_definition).
    ///
    /// Use [`create`](crate::create) for unchecked input.
    pub(crate) fn from_checked(source: &SchemaDefinition) -> SchemaResult<Self> {
        let mut definition = source.clone();

        let compound_indexes = match std::mem::take(&mut definition.compound_indexes) {
            CompoundIndexes::Declared(indexes) => indexes,
            CompoundIndexes::Absent | CompoundIndexes::Malformed { .. } => Vec::new(),
        };

        let indexes = get_indexes(&definition);
        let mut required = definition.required.take().unwrap_or_default();
        for field in indexed_fields(&indexes) {
            if !required.iter().any(|r| r == field) {
                required.push(field.to_owned());
            }
        }

        let primary_path = get_primary(&definition).map(str::to_owned);
        if let Some(primary) = &primary_path {
            required.push(primary.clone());
        }
        definition.required = Some(required);

        definition.properties.insert(ID_FIELD, system_field_definition());
        definition.properties.insert(REV_FIELD, system_field_definition());
        definition
            .extra
            .insert("additionalProperties".into(), Value::Bool(false));

        let crypt = has_crypt(&definition);
        let normalized = definition.to_value();
        let digest = sha256_digest(&CanonicalBytes::from_value(&normalized)?);

        tracing::debug!(
            primary = primary_path.as_deref().unwrap_or("-"),
            indexes = indexes.len(),
            compound_indexes = compound_indexes.len(),
            crypt,
            hash = %digest,
            "schema descriptor built"
        );

        Ok(Self {
            definition,
            normalized,
            indexes,
            compound_indexes,
            primary_path,
            crypt,
            digest,
            encrypted_paths: OnceCell::new(),
            #[cfg(feature = "validation")]
            validator: OnceCell::new(),
        })
    }

    /// The normalized schema as JSON.
    pub fn normalized_schema(&self) -> &Value {
        &self.normalized
    }

    /// The normalized schema as a typed tree.
    pub fn definition(&self) -> &SchemaDefinition {
        &self.definition
    }

    /// Simple indexes (one per `index: true` field), deduplicated.
    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// Compound indexes as declared.
    pub fn compound_indexes(&self) -> &[Index] {
        &self.compound_indexes
    }

    /// The primary field name, if the schema has one.
    pub fn primary_path(&self) -> Option<&str> {
        self.primary_path.as_deref()
    }

    /// Whether any field is encrypted.
    pub fn crypt(&self) -> bool {
        self.crypt
    }

    /// The normalized `required` list.
    pub fn required(&self) -> &[String] {
        self.definition.required()
    }

    /// The schema's `version` keyword, if present.
    pub fn version(&self) -> Option<u64> {
        self.definition.version()
    }

    /// Definition of the field at a dotted document path, e.g.
    /// `"address.city"`. `None` if the path is malformed or not declared.
    pub fn get_schema_by_object_path(&self, path: &str) -> Option<&PropertyDefinition> {
        let path = ObjectPath::parse(path).ok()?;
        let (first, rest) = path.segments().split_first()?;
        let mut node = self.definition.properties.get(first)?;
        for segment in rest {
            node = node.properties()?.get(segment)?;
        }
        Some(node)
    }

    /// Raw JSON node of the normalized schema at a dotted document path.
    pub fn get_raw_by_object_path(&self, path: &str) -> Option<&Value> {
        let path = ObjectPath::parse(path).ok()?;
        get_by_dotted_path(&self.normalized, &path.to_schema_path())
    }

    /// Every encrypted path. Computed on first call and cached.
    pub fn get_encrypted_paths(&self) -> &EncryptedPathMap {
        self.encrypted_paths.get_or_init(|| {
            let paths = get_encrypted_paths(&self.definition);
            tracing::debug!(count = paths.len(), "encrypted paths resolved");
            paths
        })
    }

    /// Validate a document against the normalized schema, or against
    /// `schema_override` when given.
    ///
    /// The override is used exactly as passed: it is not normalized and the
    /// closed-world rule is not applied to it.
    ///
    /// # Errors
    ///
    /// [`SchemaError::ValidationFailed`](crate::SchemaError::ValidationFailed)
    /// when the document is rejected;
    /// [`SchemaError::ValidatorBuild`](crate::SchemaError::ValidatorBuild) when
    /// the schema cannot be compiled.
    #[cfg(feature = "validation")]
    pub fn validate(&self, document: &Value, schema_override: Option<&Value>) -> SchemaResult<()> {
        match schema_override {
            Some(schema) => {
                tracing::warn!("validating document against a schema override");
                DocumentValidator::compile(schema)?.validate(document)
            }
            None => self.validator()?.validate(document),
        }
    }

    #[cfg(feature = "validation")]
    fn validator(&self) -> SchemaResult<&DocumentValidator> {
        self.validator.get_or_try_init(|| {
            tracing::debug!(hash = %self.digest, "compiling document validator");
            DocumentValidator::compile(&self.normalized)
        })
    }

    /// Hex SHA-256 of the canonical normalized schema. Equal schemas hash
    /// equal regardless of key order; any change to the schema changes it.
    pub fn hash(&self) -> String {
        self.digest.to_hex()
    }

    /// The content digest behind [`hash`](Self::hash).
    pub fn digest(&self) -> &ContentDigest {
        &self.digest
    }

    /// Move `_id` onto the primary field and remove `_id`. No-op without a
    /// primary field. If `_id` is absent the primary field is removed.
    pub fn swap_id_to_primary<'a>(
        &self,
        document: &'a mut Map<String, Value>,
    ) -> &'a mut Map<String, Value> {
        if let Some(primary) = &self.primary_path {
            match document.remove(ID_FIELD) {
                Some(id) => {
                    document.insert(primary.clone(), id);
                }
                None => {
                    document.remove(primary);
                }
            }
        }
        document
    }

    /// Move the primary field onto `_id` and remove the primary field. No-op
    /// without a primary field. If the primary field is absent `_id` is
    /// removed.
    pub fn swap_primary_to_id<'a>(
        &self,
        document: &'a mut Map<String, Value>,
    ) -> &'a mut Map<String, Value> {
        if let Some(primary) = &self.primary_path {
            match document.remove(primary) {
                Some(value) => {
                    document.insert(ID_FIELD.to_owned(), value);
                }
                None => {
                    document.remove(ID_FIELD);
                }
            }
        }
        document
    }

    /// Derived metadata as a serializable value.
    pub fn summary(&self) -> DescriptorSummary {
        DescriptorSummary {
            indexes: self.indexes.clone(),
            compound_indexes: self.compound_indexes.clone(),
            primary_path: self.primary_path.clone(),
            crypt: self.crypt,
            hash: self.hash(),
        }
    }
}

impl fmt::Debug for SchemaDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDescriptor")
            .field("primary_path", &self.primary_path)
            .field("indexes", &self.indexes)
            .field("compound_indexes", &self.compound_indexes)
            .field("crypt", &self.crypt)
            .field("hash", &self.digest.to_hex())
            .finish_non_exhaustive()
    }
}
