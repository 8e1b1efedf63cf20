//! # Payment and Ownership Verification
//!
//! Two gates guard the private request lifecycle:
//!
//! 1. **Settlement** ([`verify_payment`]). The payer claims an amount and
//!    presents a payment proof. Accepted only if
//!    - the amount lies within the request's public bounds,
//!    - the commitment scheme reproduces the stored commitment from the
//!      claimed amount and the stored range proof, and
//!    - the payment proof equals the settlement digest of that commitment
//!      and amount.
//!
//! 2. **Sweep** ([`verify_ownership`]). The receiver reveals the ephemeral
//!    secret bound at creation and presents a receiver proof. Accepted only
//!    if the secret matches the stored ephemeral key, the stealth address
//!    re-derives to the stored one, and the receiver proof equals the
//!    ownership digest over receiver and stealth address.
//!
//! Checks run in the order listed and the first failure wins, so an
//! out-of-range amount is reported as such even when the rest of the proof
//! is sound.

use subtle::ConstantTimeEq;
use thiserror::Error;

use super::commitment::CommitmentScheme;
use super::prover::{payment_proof, receiver_proof};
use crate::config::{MAX_RANGE_PROOF_LEN, MIN_RANGE_PROOF_LEN, PROOF_LEN};
use crate::crypto::keys::Address;
use crate::crypto::stealth::{derive_stealth_address, is_matching_pair};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a proof was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("amount {claimed} outside [{min}, {max}]")]
    AmountOutOfRange { claimed: u64, min: u64, max: u64 },

    #[error("commitment does not open to the claimed amount")]
    CommitmentMismatch,

    #[error("{what} must be {expected} bytes, got {actual}")]
    ProofLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("payment proof does not match the commitment")]
    PaymentProofMismatch,

    #[error("range proof is {0} bytes (allowed {min}..={max})", min = MIN_RANGE_PROOF_LEN, max = MAX_RANGE_PROOF_LEN)]
    RangeProofLength(usize),

    #[error("ephemeral public key is all zero")]
    ZeroEphemeralKey,

    #[error("ephemeral secret does not match the request's public key")]
    EphemeralKeyMismatch,

    #[error("stealth address does not re-derive")]
    StealthAddressMismatch,

    #[error("receiver proof does not match")]
    ReceiverProofMismatch,
}

impl VerificationError {
    /// `true` for the bounds violation; every other variant is a bad proof.
    pub fn is_range_violation(&self) -> bool {
        matches!(self, Self::AmountOutOfRange { .. })
    }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// The public half of a private request that settlement is checked against.
#[derive(Clone, Copy, Debug)]
pub struct PaymentStatement<'a> {
    pub commitment: &'a [u8; 32],
    pub range_proof: &'a [u8],
    pub min_amount: u64,
    pub max_amount: u64,
}

/// The public half of a private request that a sweep is checked against.
#[derive(Clone, Copy, Debug)]
pub struct OwnershipClaim<'a> {
    pub receiver: &'a Address,
    pub request_id: u64,
    pub ephemeral_pubkey: &'a [u8; 32],
    pub stealth_address: &'a Address,
}

fn ct_equal(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

fn fixed_proof<'p>(what: &'static str, proof: &'p [u8]) -> Result<&'p [u8], VerificationError> {
    if proof.len() != PROOF_LEN {
        return Err(VerificationError::ProofLength {
            what,
            expected: PROOF_LEN,
            actual: proof.len(),
        });
    }
    Ok(proof)
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Structural checks on the material a private request is created with.
///
/// Runs before anything is allocated, so a malformed request never costs
/// the receiver a deposit.
pub fn check_request_material(
    range_proof: &[u8],
    ephemeral_pubkey: &[u8; 32],
) -> Result<(), VerificationError> {
    if !(MIN_RANGE_PROOF_LEN..=MAX_RANGE_PROOF_LEN).contains(&range_proof.len()) {
        return Err(VerificationError::RangeProofLength(range_proof.len()));
    }
    if ephemeral_pubkey.iter().all(|b| *b == 0) {
        return Err(VerificationError::ZeroEphemeralKey);
    }
    Ok(())
}

/// Decide whether `claimed_amount` with `proof` settles the request.
pub fn verify_payment<S: CommitmentScheme + ?Sized>(
    scheme: &S,
    statement: &PaymentStatement<'_>,
    claimed_amount: u64,
    proof: &[u8],
) -> Result<(), VerificationError> {
    if claimed_amount < statement.min_amount || claimed_amount > statement.max_amount {
        return Err(VerificationError::AmountOutOfRange {
            claimed: claimed_amount,
            min: statement.min_amount,
            max: statement.max_amount,
        });
    }

    if !scheme.verify_binding(statement.commitment, claimed_amount, statement.range_proof) {
        return Err(VerificationError::CommitmentMismatch);
    }

    let proof = fixed_proof("payment proof", proof)?;
    if !ct_equal(&payment_proof(statement.commitment, claimed_amount), proof) {
        return Err(VerificationError::PaymentProofMismatch);
    }
    Ok(())
}

/// Decide whether the revealed ephemeral secret and receiver proof show
/// ownership of the request.
pub fn verify_ownership(
    claim: &OwnershipClaim<'_>,
    proof: &[u8],
    ephemeral_secret: &[u8; 32],
) -> Result<(), VerificationError> {
    if !is_matching_pair(ephemeral_secret, claim.ephemeral_pubkey) {
        return Err(VerificationError::EphemeralKeyMismatch);
    }

    let rederived = derive_stealth_address(claim.receiver, claim.request_id, claim.ephemeral_pubkey);
    if !ct_equal(rederived.as_bytes(), claim.stealth_address.as_bytes()) {
        return Err(VerificationError::StealthAddressMismatch);
    }

    let proof = fixed_proof("receiver proof", proof)?;
    if !ct_equal(&receiver_proof(claim.receiver, claim.stealth_address), proof) {
        return Err(VerificationError::ReceiverProofMismatch);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
