//! # Document Validation
//!
//! Structural validation of documents against a normalized schema, backed by
//! the `jsonschema` crate (Draft 2020-12).
//!
//! The engine's own keywords (`primary`, `index`, `unique`, `encrypted`) are
//! unknown to JSON Schema and ignored by the validator; `required`,
//! `minLength`, nested `properties` and the closed-world
//! `additionalProperties: false` are enforced.
//!
//! References are resolved inside the schema only. A `$ref` to any external
//! URI (`file://`, `https://`, ...) fails validator compilation; nothing is
//! read from disk or fetched over the network.
//!
//! A rejected document yields [`SchemaError::ValidationFailed`] with every
//! violation, each carrying the instance path, the schema path, and a
//! message.

use jsonschema::{Draft, Retrieve, Uri, Validator};
use serde_json::Value;

use crate::error::{SchemaError, SchemaResult, ValidationViolations, Violation};

/// Retriever that refuses every external reference.
struct NoExternalRefs;

impl Retrieve for NoExternalRefs {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Err(format!("external schema reference not allowed: {}", uri.as_str()).into())
    }
}

/// A compiled validator for one schema.
///
/// `Send + Sync`; compile once and share.
pub struct DocumentValidator {
    validator: Validator,
}

impl DocumentValidator {
    /// Compile a validator for `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::ValidatorBuild`] if `schema` is not a valid
    /// JSON Schema or references an external URI.
    pub fn compile(schema: &Value) -> SchemaResult<Self> {
        let mut opts = jsonschema::options();
        opts.with_draft(Draft::Draft202012);
        opts.with_retriever(NoExternalRefs);
        let validator = opts.build(schema).map_err(|e| SchemaError::ValidatorBuild {
            reason: e.to_string(),
        })?;
        Ok(Self { validator })
    }

    /// Validate a document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::ValidationFailed`] listing every violation.
    pub fn validate(&self, document: &Value) -> SchemaResult<()> {
        let violations: Vec<Violation> = self
            .validator
            .iter_errors(document)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::ValidationFailed {
                violations: ValidationViolations::new(violations),
            })
        }
    }
}

impl std::fmt::Debug for DocumentValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentValidator").finish_non_exhaustive()
    }
}
