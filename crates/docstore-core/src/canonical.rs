//! # Canonical Serialization: JCS Byte Production
//!
//! This module defines `CanonicalBytes`, the sole construction path for bytes
//! used in digest computation.
//!
//! ## Invariant
//!
//! The `CanonicalBytes` newtype has a private inner field. The only way to
//! construct it is through `CanonicalBytes::new()`, which serializes the value
//! with `serde_jcs` (RFC 8785 JSON Canonicalization Scheme): object keys
//! sorted by UTF-16 code units, compact separators, ECMAScript number
//! formatting.
//!
//! Declaration order in a schema is significant to the engine (primary lookup
//! and simple-index order follow it), but it is not significant to the hash:
//! a schema is the same schema whatever order its keys were written in.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
///
/// # Invariants
///
/// - The only constructor is `CanonicalBytes::new()`.
/// - Object keys are sorted; serialization is compact (RFC 8785).
/// - Equal JSON values always produce equal bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// The value is first lowered into a `serde_json::Value` tree so that
    /// structs, maps, and raw JSON all canonicalize through the same path.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::NotJson` if the value cannot be
    /// represented as JSON (e.g. a map with non-string keys), and
    /// `CanonicalizationError::SerializationFailed` if JCS serialization fails.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj).map_err(CanonicalizationError::NotJson)?;
        Self::from_value(&value)
    }

    /// Construct canonical bytes from an existing JSON value tree.
    pub fn from_value(value: &Value) -> Result<Self, CanonicalizationError> {
        let s = serde_jcs::to_string(value)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The canonical form as UTF-8 text. JCS output is always valid UTF-8.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
