//! # Payment Request Errors
//!
//! One error type for both escrow programs. Every variant is terminal: the
//! transition that raised it committed nothing, and nothing is retried.
//! Callers that only care about the broad class match on [`ErrorKind`].

use paylink_protocol::crypto::Address;
use paylink_protocol::derivation::DerivationError;
use paylink_protocol::ledger::LedgerError;
use paylink_protocol::zkp::VerificationError;
use thiserror::Error;

/// Errors raised by the payment request programs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaymentRequestError {
    /// The derived record address for this `(receiver, request_id)` is taken.
    #[error("request {request_id} already exists for receiver {receiver}")]
    DuplicateRequest { receiver: Address, request_id: u64 },

    /// Bounds are zero or inverted.
    #[error("invalid amount range [{min}, {max}]")]
    InvalidRange { min: u64, max: u64 },

    #[error("request {request_id} is already settled")]
    AlreadySettled { request_id: u64 },

    /// The offered or claimed amount is outside what the request accepts.
    #[error("amount {amount} outside [{min}, {max}]")]
    AmountOutOfRange { amount: u64, min: u64, max: u64 },

    /// A commitment, payment proof, receiver proof or ephemeral key did not
    /// verify, or creation material was malformed.
    #[error("invalid proof: {0}")]
    InvalidProof(VerificationError),

    /// Someone other than the stored receiver tried to sweep.
    #[error("{caller} is not the receiver of this request ({receiver})")]
    UnauthorizedReceiver { caller: Address, receiver: Address },

    /// No record at the derived address: never created, or already swept.
    #[error("no payment request at {address}")]
    RequestNotFound { address: Address },

    /// Sweep attempted before anyone settled.
    #[error("request {request_id} has not been settled")]
    NotSettled { request_id: u64 },

    #[error("insufficient funds in {address}: need {needed}, have {available}")]
    InsufficientFunds {
        address: Address,
        needed: u64,
        available: u64,
    },

    /// The account at the derived address holds something other than a
    /// request of this program.
    #[error("account {address} is not a {expected}")]
    AccountTypeMismatch {
        address: Address,
        expected: &'static str,
    },

    #[error(transparent)]
    Ledger(LedgerError),

    #[error(transparent)]
    Derivation(#[from] DerivationError),
}

impl From<LedgerError> for PaymentRequestError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientFunds {
                address,
                needed,
                available,
            } => Self::InsufficientFunds {
                address,
                needed,
                available,
            },
            other => Self::Ledger(other),
        }
    }
}

/// Broad failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Nothing to act on: missing, already swept, or not yet settled.
    NotFound,
    /// The state already moved past what the caller expected.
    Conflict,
    /// Wrong caller.
    Unauthorized,
    /// Bad input: range, amount, proof, funds.
    Rejected,
    /// Storage, codec or derivation failure.
    Internal,
}

impl PaymentRequestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RequestNotFound { .. } | Self::NotSettled { .. } => ErrorKind::NotFound,
            Self::DuplicateRequest { .. } | Self::AlreadySettled { .. } => ErrorKind::Conflict,
            Self::UnauthorizedReceiver { .. } => ErrorKind::Unauthorized,
            Self::InvalidRange { .. }
            | Self::AmountOutOfRange { .. }
            | Self::InvalidProof(_)
            | Self::InsufficientFunds { .. } => ErrorKind::Rejected,
            Self::AccountTypeMismatch { .. } | Self::Ledger(_) | Self::Derivation(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Shorthand for `kind() == ErrorKind::NotFound`.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
