//! Identifier and content-hash derivation.
//!
//! Record IDs are `{prefix}_` + base58 of the first 16 bytes of
//! SHA-256 over the identifying fields, the creation time and a random
//! nonce, so two records created in the same microsecond still differ.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generate a fixed-size array of random bytes.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    rand::thread_rng().fill_bytes(&mut buf);
    buf
}

/// Derive a prefixed record ID from its identifying fields.
pub fn derive_id(prefix: &str, fields: &[&str], created_at: u64) -> String {
    let nonce: [u8; 8] = random_bytes();
    let input = format!("{}:{}:{}", fields.join(":"), created_at, hex::encode(nonce));
    let hash = Sha256::digest(input.as_bytes());
    let encoded = bs58::encode(&hash[..16]).into_string();
    format!("{prefix}_{encoded}")
}

/// Hex SHA-256 of a string.
pub fn content_hash(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}
