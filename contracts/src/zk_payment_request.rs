//! # Private Payment Requests
//!
//! Same lifecycle as [`crate::payment_request`], different authorization.
//! The record never holds an amount, only a commitment to it and the public
//! bounds it must fall within.
//!
//! - **Create.** The receiver publishes `(commitment, range_proof, min, max,
//!   ephemeral_pubkey)`. The program derives and stores the one-time
//!   stealth address for the ephemeral key.
//! - **Settle.** The payer claims an amount (learned from the receiver out
//!   of band) and presents a payment proof. The verifier checks bounds,
//!   commitment opening and proof, in that order. On success the program
//!   records the amount and a settlement commitment over payer, amount and
//!   ledger time.
//! - **Sweep.** The receiver reveals the ephemeral secret and a receiver
//!   proof. Caller authority is checked before any of the proof work.
//!
//! The commitment primitive is a type parameter. Each primitive gets its
//! own program id, so records made under one scheme are never judged under
//! another.

use paylink_protocol::config::{ZK_ESCROW_TAG, ZK_PAY_REQUEST_TAG};
use paylink_protocol::crypto::hash::sha256_multi;
use paylink_protocol::crypto::{derive_stealth_address, Address};
use paylink_protocol::ledger::{AccountData, AccountStore, Clock, Ledger};
use paylink_protocol::zkp::verifier::check_request_material;
use paylink_protocol::zkp::{
    verify_ownership, verify_payment, CommitmentScheme, HashBinding, OwnershipClaim,
    PaymentStatement, PrivateRequestDraft, VerificationError,
};
use serde::{Deserialize, Serialize};

use crate::error::PaymentRequestError;
use crate::lifecycle::{CreateReceipt, RequestAccount, RequestProgram, SettleReceipt, SweepReceipt};

/// Prefix of the private program's name; the scheme name is appended.
pub const PROGRAM_NAME_PREFIX: &str = "paylink.zk_payment_request";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Stored state of a private request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZkPayRequest {
    pub receiver: Address,
    pub request_id: u64,
    pub amount_commitment: [u8; 32],
    pub range_proof: Vec<u8>,
    pub min_amount: u64,
    pub max_amount: u64,
    pub ephemeral_pubkey: [u8; 32],
    pub stealth_address: Address,
    pub settled_amount: u64,
    /// `SHA-256(payer || amount_le || slot_le || unix_timestamp_le)`, zero
    /// until settled.
    pub settlement_commitment: [u8; 32],
    pub is_settled: bool,
    pub is_swept: bool,
}

impl ZkPayRequest {
    pub fn payment_statement(&self) -> PaymentStatement<'_> {
        PaymentStatement {
            commitment: &self.amount_commitment,
            range_proof: &self.range_proof,
            min_amount: self.min_amount,
            max_amount: self.max_amount,
        }
    }

    pub fn ownership_claim(&self) -> OwnershipClaim<'_> {
        OwnershipClaim {
            receiver: &self.receiver,
            request_id: self.request_id,
            ephemeral_pubkey: &self.ephemeral_pubkey,
            stealth_address: &self.stealth_address,
        }
    }
}

/// Digest binding a settlement to who paid, how much, and when.
pub fn settlement_commitment(payer: &Address, amount: u64, clock: &Clock) -> [u8; 32] {
    sha256_multi(&[
        payer.as_bytes(),
        &amount.to_le_bytes(),
        &clock.slot.to_le_bytes(),
        &clock.unix_timestamp.to_le_bytes(),
    ])
}

impl AccountData for ZkPayRequest {
    const TYPE_NAME: &'static str = "ZkPayRequest";
}

impl RequestAccount for ZkPayRequest {
    const RECORD_TAG: &'static [u8] = ZK_PAY_REQUEST_TAG;
    const VAULT_TAG: &'static [u8] = ZK_ESCROW_TAG;

    fn receiver(&self) -> &Address {
        &self.receiver
    }

    fn request_id(&self) -> u64 {
        self.request_id
    }

    fn is_settled(&self) -> bool {
        self.is_settled
    }

    fn is_swept(&self) -> bool {
        self.is_swept
    }

    fn settled_amount(&self) -> u64 {
        self.settled_amount
    }

    fn mark_settled(&mut self, amount: u64, payer: &Address, clock: &Clock) {
        self.settled_amount = amount;
        self.settlement_commitment = settlement_commitment(payer, amount, clock);
        self.is_settled = true;
    }

    fn mark_swept(&mut self) {
        self.is_swept = true;
    }
}

/// What a receiver publishes to open a private request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZkRequestParams {
    pub request_id: u64,
    pub amount_commitment: [u8; 32],
    pub range_proof: Vec<u8>,
    pub min_amount: u64,
    pub max_amount: u64,
    pub ephemeral_pubkey: [u8; 32],
}

impl ZkRequestParams {
    /// The public half of a prepared draft.
    pub fn from_draft(
        request_id: u64,
        draft: &PrivateRequestDraft,
        min_amount: u64,
        max_amount: u64,
    ) -> Self {
        Self {
            request_id,
            amount_commitment: draft.commitment,
            range_proof: draft.range_proof.clone(),
            min_amount,
            max_amount,
            ephemeral_pubkey: draft.ephemeral.public(),
        }
    }
}

// ---------------------------------------------------------------------------
// Program
// ---------------------------------------------------------------------------

/// The private program, parameterized by its commitment primitive.
#[derive(Debug, Clone)]
pub struct ZkPaymentRequests<C: CommitmentScheme = HashBinding> {
    scheme: C,
    program: RequestProgram<ZkPayRequest>,
}

impl ZkPaymentRequests<HashBinding> {
    pub fn new() -> Self {
        Self::with_scheme(HashBinding)
    }
}

impl Default for ZkPaymentRequests<HashBinding> {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid_proof(e: VerificationError) -> PaymentRequestError {
    PaymentRequestError::InvalidProof(e)
}

impl<C: CommitmentScheme> ZkPaymentRequests<C> {
    pub fn with_scheme(scheme: C) -> Self {
        let program = RequestProgram::new(format!("{}/{}", PROGRAM_NAME_PREFIX, scheme.name()));
        Self { scheme, program }
    }

    pub fn scheme(&self) -> &C {
        &self.scheme
    }

    pub fn program_id(&self) -> &Address {
        self.program.program_id()
    }

    /// Publish a private request.
    ///
    /// # Errors
    ///
    /// - [`PaymentRequestError::InvalidRange`] for a zero bound or `min > max`.
    /// - [`PaymentRequestError::InvalidProof`] for a range proof outside
    ///   64..=512 bytes or an all-zero ephemeral key.
    /// - [`PaymentRequestError::DuplicateRequest`] if the id is taken.
    pub fn create_zk_pay_request<S: AccountStore>(
        &self,
        ledger: &Ledger<S>,
        receiver: &Address,
        params: ZkRequestParams,
    ) -> Result<CreateReceipt, PaymentRequestError> {
        if params.min_amount == 0 || params.max_amount == 0 || params.min_amount > params.max_amount
        {
            return Err(PaymentRequestError::InvalidRange {
                min: params.min_amount,
                max: params.max_amount,
            });
        }
        check_request_material(&params.range_proof, &params.ephemeral_pubkey)
            .map_err(invalid_proof)?;

        let stealth_address =
            derive_stealth_address(receiver, params.request_id, &params.ephemeral_pubkey);
        self.program.create(
            ledger,
            ZkPayRequest {
                receiver: *receiver,
                request_id: params.request_id,
                amount_commitment: params.amount_commitment,
                range_proof: params.range_proof,
                min_amount: params.min_amount,
                max_amount: params.max_amount,
                ephemeral_pubkey: params.ephemeral_pubkey,
                stealth_address,
                settled_amount: 0,
                settlement_commitment: [0u8; 32],
                is_settled: false,
                is_swept: false,
            },
        )
    }

    /// Settle with a claimed amount and its payment proof.
    ///
    /// A bounds violation is reported as [`PaymentRequestError::AmountOutOfRange`]
    /// even when the proof is otherwise valid; every other verifier failure
    /// is [`PaymentRequestError::InvalidProof`].
    pub fn settle_zk_payment<S: AccountStore>(
        &self,
        ledger: &Ledger<S>,
        receiver: &Address,
        request_id: u64,
        payer: &Address,
        claimed_amount: u64,
        payment_proof: &[u8],
    ) -> Result<SettleReceipt, PaymentRequestError> {
        self.program.settle(ledger, receiver, request_id, payer, |record| {
            verify_payment(
                &self.scheme,
                &record.payment_statement(),
                claimed_amount,
                payment_proof,
            )
            .map_err(|e| match e {
                VerificationError::AmountOutOfRange { claimed, min, max } => {
                    PaymentRequestError::AmountOutOfRange {
                        amount: claimed,
                        min,
                        max,
                    }
                }
                other => invalid_proof(other),
            })?;
            Ok(claimed_amount)
        })
    }

    /// Sweep by revealing the ephemeral secret bound at creation.
    pub fn sweep_zk_funds<S: AccountStore>(
        &self,
        ledger: &Ledger<S>,
        receiver_ref: &Address,
        request_id: u64,
        caller: &Address,
        receiver_proof: &[u8],
        ephemeral_secret: &[u8; 32],
    ) -> Result<SweepReceipt, PaymentRequestError> {
        self.program
            .sweep(ledger, receiver_ref, request_id, caller, |record| {
                verify_ownership(&record.ownership_claim(), receiver_proof, ephemeral_secret)
                    .map_err(invalid_proof)
            })
    }

    pub fn fetch_request<S: AccountStore>(
        &self,
        ledger: &Ledger<S>,
        receiver: &Address,
        request_id: u64,
    ) -> Result<ZkPayRequest, PaymentRequestError> {
        self.program.fetch(ledger, receiver, request_id)
    }

    pub fn request_address(
        &self,
        receiver: &Address,
        request_id: u64,
    ) -> Result<Address, PaymentRequestError> {
        self.program.request_address(receiver, request_id)
    }

    pub fn escrow_address(
        &self,
        receiver: &Address,
        request_id: u64,
    ) -> Result<Address, PaymentRequestError> {
        self.program.escrow_address(receiver, request_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
