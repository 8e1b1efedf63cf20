//! # Hashing Utilities
//!
//! Two hash functions, each with a job:
//!
//! - **SHA-256** — address derivation, account discriminators, and the
//!   hash-based amount binding. These values have to be recomputable by
//!   any client, so we use the hash every client already ships.
//!
//! - **BLAKE3** — everything domain-separated. BLAKE3's `derive_key` mode
//!   uses an IV derived from the context string, so two contexts cannot
//!   collide even on identical input. Don't prepend tags by hand.

use sha2::{Digest, Sha256};

/// SHA-256 of a single buffer.
///
/// ```
/// use paylink_protocol::crypto::sha256_array;
///
/// let a = sha256_array(b"PAYLINK");
/// assert_ne!(a, sha256_array(b"paylink"));
/// ```
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    sha256_multi(&[data])
}

/// SHA-256 over several slices fed sequentially, without concatenating.
pub fn sha256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute a domain-separated hash using BLAKE3's `derive_key` mode.
///
/// `domain_separated_hash("a", data)` and `domain_separated_hash("b", data)`
/// never collide. Context strings should be hardcoded, globally unique, and
/// application-specific (see the `*_CONTEXT` constants in [`crate::config`]).
pub fn domain_separated_hash(context: &str, data: &[u8]) -> [u8; 32] {
    domain_separated_hash_multi(context, &[data])
}

/// Domain-separated BLAKE3 over several slices.
pub fn domain_separated_hash_multi(context: &str, parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}
