//! # docstore-core: Foundational Primitives for the Schema Engine
//!
//! Leaf crate of the workspace. It owns the collaborators the schema engine
//! relies on but does not itself define:
//!
//! 1. **`CanonicalBytes` newtype.** Every schema hash flows through
//!    `CanonicalBytes::new()`, which produces RFC 8785 (JCS) bytes. Two
//!    schemas that differ only in key order hash identically.
//!
//! 2. **`ContentDigest`.** SHA-256 over canonical bytes, rendered as lowercase
//!    hex. Used to detect schema drift between versions of a stored
//!    collection.
//!
//! 3. **`ObjectPath`.** Dotted field paths (`"address.city"`), their
//!    translation into schema addressing (`"properties.address.properties.city"`),
//!    and lookup of a path inside a JSON value.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `docstore-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod path;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, ContentDigest};
pub use error::{CanonicalizationError, PathError};
pub use path::{get_by_dotted_path, ObjectPath};
