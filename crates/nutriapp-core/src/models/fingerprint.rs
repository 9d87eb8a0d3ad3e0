//! Content fingerprints used as deduplication keys.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 (hex) of the compact JSON encoding of `key`.
///
/// Tuples and structs serialize in declaration order and maps used here are
/// `BTreeMap`s, so equal keys always hash equally.
pub fn of<T: Serialize + ?Sized>(key: &T) -> Result<String, serde_json::Error> {
    let payload = serde_json::to_string(key)?;
    Ok(hash_data(payload.as_bytes()))
}

/// Hash raw bytes with SHA-256.
pub fn hash_data(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let h1 = hash_data(b"hello world");
        let h2 = hash_data(b"hello world");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64); // SHA-256 hex
    }

    #[test]
    fn test_fingerprint_distinguishes_field_boundaries() {
        let a = of(&("ab", "c")).unwrap();
        let b = of(&("a", "bc")).unwrap();
        assert_ne!(a, b);
    }
}
