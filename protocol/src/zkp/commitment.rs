//! # Amount Commitment Schemes
//!
//! A commitment binds a hidden amount to the opaque range-proof bytes that
//! accompany it. The settlement verifier recomputes the commitment from the
//! payer's claimed amount and the stored range proof; a byte-exact match is
//! the only way through. No partial credit.
//!
//! Two schemes implement [`CommitmentScheme`]:
//!
//! ```text
//! HashBinding:     c = SHA-256(amount_le || range_proof || "bulletproof_payment")
//! PedersenBinding: C = amount * G + r * H   on Ristretto255
//!                  H = hash_to_group("paylink pedersen generator H")
//!                  r = hash_to_scalar(range_proof || "paylink pedersen blinding")
//! ```
//!
//! Both produce 32 bytes, so a record never needs to know which one made
//! its commitment. Pick one per program instance and stick with it.

use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

use crate::config::{PAYMENT_BINDING_LABEL, PEDERSEN_BLINDING_LABEL, PEDERSEN_H_LABEL};
use crate::crypto::hash::sha256_multi;

/// A binding one-way function from `(amount, range_proof)` to 32 bytes.
pub trait CommitmentScheme: Send + Sync {
    /// Short name for logs and CLI output.
    fn name(&self) -> &'static str;

    /// Compute the commitment for `amount` under `range_proof`.
    fn commit(&self, amount: u64, range_proof: &[u8]) -> [u8; 32];

    /// `true` iff recomputing the commitment reproduces `commitment` exactly.
    /// Compared in constant time.
    fn verify_binding(&self, commitment: &[u8; 32], amount: u64, range_proof: &[u8]) -> bool {
        let expected = self.commit(amount, range_proof);
        expected[..].ct_eq(&commitment[..]).into()
    }
}

// ---------------------------------------------------------------------------
// HashBinding
// ---------------------------------------------------------------------------

/// SHA-256 binding with a fixed domain label. The default scheme.
#[derive(Clone, Copy, Debug, Default)]
pub struct HashBinding;

impl CommitmentScheme for HashBinding {
    fn name(&self) -> &'static str {
        "sha256-binding"
    }

    fn commit(&self, amount: u64, range_proof: &[u8]) -> [u8; 32] {
        sha256_multi(&[&amount.to_le_bytes(), range_proof, PAYMENT_BINDING_LABEL])
    }
}

// ---------------------------------------------------------------------------
// PedersenBinding
// ---------------------------------------------------------------------------

/// Pedersen commitment over Ristretto255.
///
/// `H` comes from hash-to-group, so nobody knows `log_G(H)` and the
/// commitment is computationally binding. The blinding factor is derived
/// from the range-proof bytes; once those are public the commitment is
/// binding but no longer hiding.
#[derive(Clone, Debug)]
pub struct PedersenBinding {
    h: RistrettoPoint,
}

fn wide_hash(parts: &[&[u8]]) -> [u8; 64] {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut out = [0u8; 64];
    out.copy_from_slice(&digest);
    out
}

impl PedersenBinding {
    /// Derive the generators.
    pub fn new() -> Self {
        let h = RistrettoPoint::from_uniform_bytes(&wide_hash(&[PEDERSEN_H_LABEL]));
        Self { h }
    }

    /// The blinding scalar the scheme derives from `range_proof`.
    pub fn blinding(&self, range_proof: &[u8]) -> Scalar {
        Scalar::from_bytes_mod_order_wide(&wide_hash(&[range_proof, PEDERSEN_BLINDING_LABEL]))
    }

    /// The commitment as a curve point, for callers that want to add
    /// commitments homomorphically.
    pub fn commit_point(&self, amount: u64, range_proof: &[u8]) -> RistrettoPoint {
        Scalar::from(amount) * RISTRETTO_BASEPOINT_POINT + self.blinding(range_proof) * self.h
    }
}

impl Default for PedersenBinding {
    fn default() -> Self {
        Self::new()
    }
}

impl CommitmentScheme for PedersenBinding {
    fn name(&self) -> &'static str {
        "pedersen-ristretto255"
    }

    fn commit(&self, amount: u64, range_proof: &[u8]) -> [u8; 32] {
        self.commit_point(amount, range_proof).compress().to_bytes()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
