//! # Amount Commitments and Proof Verification
//!
//! The private payment-request variant never stores an amount. It stores a
//! 32-byte commitment plus the public bounds the amount must fall within,
//! and settlement has to *reproduce* that commitment to be accepted.
//!
//! ## Architecture
//!
//! ```text
//! commitment.rs — CommitmentScheme trait; HashBinding and PedersenBinding
//! verifier.rs   — payment and receiver-ownership verification, creation-time shape checks
//! prover.rs     — client-side helpers producing the values the verifier expects
//! ```
//!
//! ## Contract
//!
//! Verification is a pure function of its inputs: no randomness, no clock,
//! no ledger reads. Identical inputs always give the identical verdict, so
//! any auditor can replay a decision from the record and the call arguments.
//!
//! The primitive behind the commitment is swappable. The state machine only
//! sees [`CommitmentScheme`].

pub mod commitment;
pub mod prover;
pub mod verifier;

pub use commitment::{CommitmentScheme, HashBinding, PedersenBinding};
pub use prover::{payment_proof, random_range_proof, receiver_proof, PrivateRequestDraft};
pub use verifier::{
    check_request_material, verify_ownership, verify_payment, OwnershipClaim, PaymentStatement,
    VerificationError,
};
