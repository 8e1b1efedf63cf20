//! # Client-Side Proof Material
//!
//! Everything a receiver or payer computes off-ledger to get past the
//! verifier. Nothing here is trusted by the ledger: the verifier recomputes
//! every value from the record.

use rand::rngs::OsRng;
use rand::RngCore;

use super::commitment::CommitmentScheme;
use crate::config::{MIN_RANGE_PROOF_LEN, RECEIVER_PROOF_CONTEXT, SETTLEMENT_PROOF_CONTEXT};
use crate::crypto::hash::domain_separated_hash_multi;
use crate::crypto::keys::Address;
use crate::crypto::stealth::{derive_stealth_address, EphemeralKeypair};

/// The payment proof a payer presents for `amount` against `commitment`.
pub fn payment_proof(commitment: &[u8; 32], amount: u64) -> [u8; 32] {
    domain_separated_hash_multi(SETTLEMENT_PROOF_CONTEXT, &[commitment, &amount.to_le_bytes()])
}

/// The proof a receiver presents at sweep to claim `stealth_address`.
pub fn receiver_proof(receiver: &Address, stealth_address: &Address) -> [u8; 32] {
    domain_separated_hash_multi(
        RECEIVER_PROOF_CONTEXT,
        &[receiver.as_bytes(), stealth_address.as_bytes()],
    )
}

/// Fresh random range-proof bytes of the minimum accepted length.
pub fn random_range_proof() -> Vec<u8> {
    let mut bytes = vec![0u8; MIN_RANGE_PROOF_LEN];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Everything a receiver prepares before creating a private request.
///
/// `amount` and the ephemeral secret stay with the receiver. The amount goes
/// to the payer out of band; the secret is revealed only at sweep.
#[derive(Clone, Debug)]
pub struct PrivateRequestDraft {
    pub amount: u64,
    pub range_proof: Vec<u8>,
    pub commitment: [u8; 32],
    pub ephemeral: EphemeralKeypair,
}

impl PrivateRequestDraft {
    /// Commit to `amount` with fresh range-proof bytes and a fresh
    /// ephemeral key.
    pub fn prepare<S: CommitmentScheme + ?Sized>(scheme: &S, amount: u64) -> Self {
        Self::with_parts(scheme, amount, random_range_proof(), EphemeralKeypair::generate())
    }

    /// Commit to `amount` with caller-supplied material.
    pub fn with_parts<S: CommitmentScheme + ?Sized>(
        scheme: &S,
        amount: u64,
        range_proof: Vec<u8>,
        ephemeral: EphemeralKeypair,
    ) -> Self {
        let commitment = scheme.commit(amount, &range_proof);
        Self {
            amount,
            range_proof,
            commitment,
            ephemeral,
        }
    }

    /// The payment proof for the committed amount.
    pub fn payment_proof(&self) -> [u8; 32] {
        payment_proof(&self.commitment, self.amount)
    }

    /// The stealth address the request will be bound to.
    pub fn stealth_address(&self, receiver: &Address, request_id: u64) -> Address {
        derive_stealth_address(receiver, request_id, &self.ephemeral.public())
    }

    /// The receiver proof to present at sweep.
    pub fn receiver_proof(&self, receiver: &Address, request_id: u64) -> [u8; 32] {
        receiver_proof(receiver, &self.stealth_address(receiver, request_id))
    }
}
