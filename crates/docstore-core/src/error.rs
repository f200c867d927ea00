//! # Error Types
//!
//! Errors raised by the core primitives. All errors use `thiserror` for
//! derive-based `Display` and `Error` implementations.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// The value could not be converted into a JSON value tree.
    #[error("value is not representable as JSON: {0}")]
    NotJson(#[source] serde_json::Error),

    /// JCS serialization of the JSON value tree failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error parsing a dotted object path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path was the empty string.
    #[error("object path is empty")]
    Empty,

    /// The path contained an empty segment (`"a..b"`, `".a"`, `"a."`).
    #[error("object path '{path}' has an empty segment at position {position}")]
    EmptySegment {
        /// The offending path.
        path: String,
        /// Zero-based index of the empty segment.
        position: usize,
    },
}
