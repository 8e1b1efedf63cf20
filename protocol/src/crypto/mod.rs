//! # Cryptographic Primitives for PAYLINK
//!
//! Hashing, identities, and the one-time key scheme behind stealth
//! withdrawals. Everything here is a thin, type-safe wrapper around audited
//! implementations:
//!
//! - **SHA-256** for address derivation, account discriminators, and the
//!   hash-based amount binding.
//! - **BLAKE3** `derive_key` for every domain-separated value we mint
//!   ourselves (stealth addresses, proofs, program ids).
//! - **Ed25519** for user identities. Derived addresses are provably off
//!   this curve, so they can never collide with a wallet.
//! - **X25519** for ephemeral stealth keys.

pub mod hash;
pub mod keys;
pub mod stealth;

pub use hash::{domain_separated_hash, sha256_array, sha256_multi};
pub use keys::{Address, AddressParseError, Keypair};
pub use stealth::{derive_stealth_address, EphemeralKeypair};
