// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! Content hashing for adapter cache keys
//!
//! Uses BLAKE3 for fast, secure content hashing, keyed on the serialized
//! input a compiled adapter was run against (§4.7 step 4).

use blake3::Hasher;

/// Compute a quick hash of a string (e.g. a serialized JSON input).
pub fn hash_string(s: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(s.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Compute a hash of a JSON value by serializing it first.
pub fn hash_value(value: &serde_json::Value) -> String {
    hash_string(&value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hash_string() {
        let hash1 = hash_string("hello");
        let hash2 = hash_string("hello");
        let hash3 = hash_string("world");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
    }

    #[test]
    fn hash_value_is_stable_for_equal_json() {
        let a = hash_value(&json!({"x": 1, "y": [1,2,3]}));
        let b = hash_value(&json!({"x": 1, "y": [1,2,3]}));
        assert_eq!(a, b);
    }
}
