//! SHA3-256 content hashing

use edgestamp_types::Digest;
use sha3::{Digest as _, Sha3_256};

/// Hash a canonical byte sequence into a content digest.
pub fn digest_bytes(bytes: &[u8]) -> Digest {
    let mut hasher = Sha3_256::new();
    hasher.update(bytes);
    let output = hasher.finalize();
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&output);
    Digest::new(digest)
}
