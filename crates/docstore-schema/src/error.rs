//! # Schema Errors
//!
//! Two semantic kinds of failure leave this crate:
//!
//! - **Configuration**: the schema definition itself is unusable. Raised by
//!   [`check_schema`](crate::check_schema) and [`create`](crate::create); fatal
//!   for the collection being defined and never retried.
//! - **Validation**: a document does not conform to a valid schema. Raised by
//!   [`SchemaDescriptor::validate`](crate::SchemaDescriptor::validate); the
//!   single write is rejected and the store carries on.
//!
//! Detection is a pure function of the input: the same invalid schema always
//! yields the same `ConfigurationError` variant.

use std::fmt;

use docstore_core::CanonicalizationError;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Coarse classification of a [`SchemaError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The schema definition is invalid. Abort collection creation.
    Configuration,
    /// A document failed validation. Reject the single operation.
    Validation,
    /// The engine could not complete an operation for a reason unrelated to
    /// the caller's input shape.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Configuration => "configuration",
            Self::Validation => "validation",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// A schema-shape violation found while checking a definition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The input is not a schema tree at all (wrong JSON types, missing
    /// `properties`, unknown type names).
    #[error("malformed schema at '{location}': {reason}")]
    MalformedSchema {
        /// Where in the schema the problem was found (`"(root)"` for the root).
        location: String,
        /// What was wrong.
        reason: String,
    },

    /// `_id` or `_rev` was declared by the caller.
    #[error("schema defines .{field}, this will be done automatically")]
    SystemFieldDeclared {
        /// The system field name.
        field: String,
    },

    /// A field name contains a dot.
    #[error("field names cannot contain dots: {path}")]
    DottedFieldName {
        /// Dotted path of the offending field's parent plus its name.
        path: String,
    },

    /// A field uses a reserved name.
    #[error("field name is not allowed: {name} (at {path})")]
    ReservedFieldName {
        /// The reserved name.
        name: String,
        /// Dotted path of the field.
        path: String,
    },

    /// A top-level field name starts with an underscore.
    #[error("first-level field names cannot start with underscore: {name}")]
    UnderscoreTopLevelField {
        /// The field name.
        name: String,
    },

    /// `primary` or `index` declared below the top level.
    #[error("{flag} can only be defined at top-level (found at {path})")]
    NestedTopLevelFlag {
        /// `"primary"` or `"index"`.
        flag: &'static str,
        /// Dotted path of the field.
        path: String,
    },

    /// More than one top-level field has `primary: true`.
    #[error("primary can only be defined once (found on '{first}' and '{second}')")]
    DuplicatePrimary {
        /// The first primary field in declaration order.
        first: String,
        /// The second primary field in declaration order.
        second: String,
    },

    /// The primary field also declares `index`.
    #[error("primary is always index, do not declare it as index: {field}")]
    PrimaryIsIndex {
        /// The primary field.
        field: String,
    },

    /// The primary field also declares `unique`.
    #[error("primary is always unique, do not declare it as unique: {field}")]
    PrimaryIsUnique {
        /// The primary field.
        field: String,
    },

    /// The primary field also declares `encrypted`.
    #[error("primary cannot be encrypted: {field}")]
    PrimaryIsEncrypted {
        /// The primary field.
        field: String,
    },

    /// The primary field is not typed `string`.
    #[error("primary must have type string: {field} has type {actual}")]
    PrimaryNotString {
        /// The primary field.
        field: String,
        /// The declared type.
        actual: String,
    },

    /// The primary field is listed in `required`.
    #[error("primary is always required, do not declare it as required: {field}")]
    PrimaryDeclaredRequired {
        /// The primary field.
        field: String,
    },

    /// `compoundIndexes` is not an array of non-empty arrays of strings.
    #[error("schema.compoundIndexes must be array<array<string>>: {reason}")]
    MalformedCompoundIndexes {
        /// What was wrong.
        reason: String,
    },

    /// An index names a field that is not declared at the top level.
    #[error("index references undeclared field '{field}'")]
    UnknownIndexField {
        /// The field name.
        field: String,
    },

    /// An indexed field is neither `string` nor `integer`.
    #[error("indexed field '{field}' must have type string or integer, not {actual}")]
    NonIndexableType {
        /// The field name.
        field: String,
        /// The declared type.
        actual: String,
    },
}

impl ConfigurationError {
    pub(crate) fn malformed(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedSchema {
            location: location.into(),
            reason: reason.into(),
        }
    }
}

/// Top-level error type for the schema engine.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema definition is invalid.
    #[error("invalid schema: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The document did not conform to the schema.
    #[error("document validation failed:\n{violations}")]
    ValidationFailed {
        /// Structured list of individual violations.
        violations: ValidationViolations,
    },

    /// The document validator could not be compiled from a schema.
    #[error("validator build error: {reason}")]
    ValidatorBuild {
        /// Reason reported by the validator.
        reason: String,
    },

    /// Canonical serialization of the schema failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

impl SchemaError {
    /// The semantic kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::ValidationFailed { .. } => ErrorKind::Validation,
            Self::ValidatorBuild { .. } | Self::Canonicalization(_) => ErrorKind::Internal,
        }
    }

    /// The configuration error, if this is one.
    pub fn as_configuration(&self) -> Option<&ConfigurationError> {
        match self {
            Self::Configuration(e) => Some(e),
            _ => None,
        }
    }

    /// The validation violations, if this is a validation failure.
    pub fn violations(&self) -> Option<&ValidationViolations> {
        match self {
            Self::ValidationFailed { violations } => Some(violations),
            _ => None,
        }
    }
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer path to the violating field in the document.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Wrap a list of violations.
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}
