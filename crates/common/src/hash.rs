//! Stable fingerprints for values that must not be shown.

use sha2::{Digest, Sha256};

const FINGERPRINT_LEN: usize = 12;

/// First 12 hex chars of the SHA256 of `value`. Equal inputs give equal
/// fingerprints, so redacted reports can still be compared.
pub fn short_fingerprint(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let mut hash = hex::encode(digest);
    hash.truncate(FINGERPRINT_LEN);
    hash
}
