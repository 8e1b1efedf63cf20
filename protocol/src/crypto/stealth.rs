//! # Stealth Addresses
//!
//! A private payment request binds a one-time X25519 public key at creation.
//! The receiver keeps the matching secret and reveals it only when sweeping,
//! which proves they are the party who set the request up without ever
//! linking the request to a long-term key beforehand.
//!
//! ```text
//! ephemeral_pubkey = X25519(ephemeral_secret, basepoint)
//! stealth_address  = BLAKE3-derive_key(ctx, receiver || request_id_le || ephemeral_pubkey)
//! ```
//!
//! The stealth address is stored on the record at creation. At sweep the
//! verifier recomputes it from the revealed secret; any mismatch is a
//! rejected proof.

use rand::rngs::OsRng;
use rand::RngCore;
use x25519_dalek::{x25519, X25519_BASEPOINT_BYTES};

use super::hash::domain_separated_hash_multi;
use super::keys::Address;
use crate::config::STEALTH_ADDRESS_CONTEXT;

/// A one-time X25519 keypair for a single private request.
///
/// The secret is plain bytes because it is handed to the verifier verbatim
/// at sweep time. Treat it like any other key: generate, stash, reveal once.
#[derive(Clone)]
pub struct EphemeralKeypair {
    secret: [u8; 32],
    public: [u8; 32],
}

impl EphemeralKeypair {
    /// Generate a fresh ephemeral keypair from the OS RNG.
    pub fn generate() -> Self {
        let mut secret = [0u8; 32];
        OsRng.fill_bytes(&mut secret);
        Self::from_secret(secret)
    }

    /// Rebuild the keypair from a stashed secret.
    pub fn from_secret(secret: [u8; 32]) -> Self {
        Self {
            secret,
            public: ephemeral_public_key(&secret),
        }
    }

    /// The secret half, revealed at sweep.
    pub fn secret(&self) -> [u8; 32] {
        self.secret
    }

    /// The public half, bound into the request at creation.
    pub fn public(&self) -> [u8; 32] {
        self.public
    }
}

impl std::fmt::Debug for EphemeralKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralKeypair")
            .field("public", &hex::encode(self.public))
            .finish_non_exhaustive()
    }
}

/// Scalar-multiply the X25519 basepoint by `secret` (clamped per RFC 7748).
pub fn ephemeral_public_key(secret: &[u8; 32]) -> [u8; 32] {
    x25519(*secret, X25519_BASEPOINT_BYTES)
}

/// `true` if `secret` and `public` form an X25519 keypair.
pub fn is_matching_pair(secret: &[u8; 32], public: &[u8; 32]) -> bool {
    use subtle::ConstantTimeEq;
    ephemeral_public_key(secret)[..].ct_eq(&public[..]).into()
}

/// Derive the one-time stealth address for a request.
pub fn derive_stealth_address(
    receiver: &Address,
    request_id: u64,
    ephemeral_pubkey: &[u8; 32],
) -> Address {
    Address::new(domain_separated_hash_multi(
        STEALTH_ADDRESS_CONTEXT,
        &[
            receiver.as_bytes(),
            &request_id.to_le_bytes(),
            ephemeral_pubkey,
        ],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_pair_matches() {
        let kp = EphemeralKeypair::generate();
        assert!(is_matching_pair(&kp.secret(), &kp.public()));
        assert_eq!(EphemeralKeypair::from_secret(kp.secret()).public(), kp.public());
    }

    #[test]
    fn foreign_secret_does_not_match() {
        let a = EphemeralKeypair::generate();
        let b = EphemeralKeypair::generate();
        assert!(!is_matching_pair(&b.secret(), &a.public()));
    }

    #[test]
    fn stealth_address_depends_on_every_input() {
        let receiver = Address::new([1u8; 32]);
        let eph = EphemeralKeypair::from_secret([5u8; 32]).public();
        let base = derive_stealth_address(&receiver, 1, &eph);

        assert_eq!(base, derive_stealth_address(&receiver, 1, &eph));
        assert_ne!(base, derive_stealth_address(&Address::new([2u8; 32]), 1, &eph));
        assert_ne!(base, derive_stealth_address(&receiver, 2, &eph));
        let other = EphemeralKeypair::from_secret([6u8; 32]).public();
        assert_ne!(base, derive_stealth_address(&receiver, 1, &other));
    }

    #[test]
    fn debug_hides_secret() {
        let kp = EphemeralKeypair::from_secret([3u8; 32]);
        assert!(!format!("{:?}", kp).contains(&hex::encode([3u8; 32])));
    }
}
