//! Payload integrity hashing.

use blake3::Hasher;

/// Computes the header hash of a payload: the first eight bytes of its
/// BLAKE3 digest, little-endian.
#[must_use]
pub fn payload_hash(payload: &[u8]) -> u64 {
    let mut hasher = Hasher::new();
    hasher.update(payload);
    let hash = hasher.finalize();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_hash_is_stable() {
        assert_eq!(payload_hash(b"osm"), payload_hash(b"osm"));
    }

    #[test]
    fn payload_hash_matches_blake3_prefix() {
        let digest = blake3::hash(b"");
        let expected = u64::from_le_bytes(digest.as_bytes()[0..8].try_into().unwrap());
        assert_eq!(payload_hash(b""), expected);
    }

    #[test]
    fn payload_hash_changes_with_content() {
        assert_ne!(payload_hash(b"node"), payload_hash(b"nodf"));
    }
}
