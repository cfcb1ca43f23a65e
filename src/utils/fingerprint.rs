// src/utils/fingerprint.rs

//! Content fingerprints used as a cheap "did the page change" gate.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of the raw page markup.
pub fn fingerprint(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
