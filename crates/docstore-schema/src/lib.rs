//! # docstore-schema: Collection Schema Normalization
//!
//! Turns a caller-supplied collection schema into a validated, normalized
//! [`SchemaDescriptor`] that the storage layer can use for indexing, primary
//! key handling, encryption, and document validation.
//!
//! ## Pipeline
//!
//! 1. **Lowering** ([`definition`]): raw JSON becomes a typed
//!    [`SchemaDefinition`] tree. Shape errors surface here as
//!    [`ConfigurationError::MalformedSchema`].
//! 2. **Checking** ([`normalize::check_schema`]): field naming rules, primary
//!    key constraints, compound index shape, and index field types. The first
//!    violation wins.
//! 3. **Normalizing** ([`normalize::create`]): indexed fields and the primary
//!    become required, `_id`/`_rev` are injected, and the schema is closed
//!    with `additionalProperties: false`.
//!
//! The descriptor is immutable after construction and `Send + Sync`; share it
//! behind an `Arc`. Derived data (encrypted paths, the compiled validator) is
//! computed at most once on first use.
//!
//! ## Features
//!
//! - `validation` (default): compile normalized schemas with `jsonschema`
//!   and expose [`SchemaDescriptor::validate`].
//!
//! ## Crate Policy
//!
//! - Depends only on `docstore-core` internally.
//! - Never mutates caller input. Every derived structure is an owned copy.

pub mod definition;
pub mod descriptor;
pub mod encryption;
pub mod error;
pub mod fields;
pub mod indexes;
pub mod normalize;
pub mod primary;
pub mod rules;
#[cfg(feature = "validation")]
pub mod validate;

pub use definition::{
    CompoundIndexes, FieldFlags, FieldType, FieldVisit, FieldVisitor, NodeShape, Properties,
    PropertyDefinition, SchemaDefinition, TypeDecl, Walk,
};
pub use descriptor::{DescriptorSummary, SchemaDescriptor};
pub use encryption::{get_encrypted_paths, has_crypt, EncryptedPathMap};
pub use error::{
    ConfigurationError, ErrorKind, SchemaError, SchemaResult, ValidationViolations, Violation,
};
pub use fields::validate_fields_deep;
pub use indexes::{get_indexes, indexed_fields, Index};
pub use normalize::{check_definition, check_schema, create, create_from_definition};
pub use primary::get_primary;
#[cfg(feature = "validation")]
pub use validate::DocumentValidator;
