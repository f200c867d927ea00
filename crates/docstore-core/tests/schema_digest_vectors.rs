//! # Schema Digest Test Vectors
//!
//! Fixed SHA-256 vectors for canonical schema fragments. A stored collection
//! records the hash of its schema; if these vectors move, every stored
//! collection would report schema drift after an upgrade.

use docstore_core::{get_by_dotted_path, sha256_digest, CanonicalBytes, ObjectPath};
use serde_json::json;

fn digest_hex(value: &serde_json::Value) -> String {
    let cb = CanonicalBytes::from_value(value).expect("canonicalization should succeed");
    sha256_digest(&cb).to_hex()
}

#[test]
fn test_vector_empty_object() {
    assert_eq!(
        digest_hex(&json!({})),
        "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
    );
}

#[test]
fn test_vector_primary_schema() {
    let schema = json!({"properties": {"name": {"type": "string", "primary": true}}});
    assert_eq!(
        digest_hex(&schema),
        "2ff4a3d1ae68013fa27486f9b1f6c768101937411c0ed8311000073c2d148772"
    );
}

#[test]
fn test_vector_system_field() {
    // Same digest regardless of the order the keys were written in.
    let written = json!({"type": "string", "minLength": 1});
    let reordered = json!({"minLength": 1, "type": "string"});
    let expected = "9ac136edb99a2063b3091602181c8d2022fdccb5b514991319d58544c2e57e95";
    assert_eq!(digest_hex(&written), expected);
    assert_eq!(digest_hex(&reordered), expected);
}

#[test]
fn test_schema_path_resolves_in_schema_json() {
    let schema = json!({
        "properties": {
            "address": {
                "type": "object",
                "properties": {"city": {"type": "string", "minLength": 2}}
            }
        }
    });
    let path = ObjectPath::parse("address.city").unwrap();
    let node = get_by_dotted_path(&schema, &path.to_schema_path()).unwrap();
    assert_eq!(node["minLength"], 2);
}
