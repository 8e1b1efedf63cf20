//! # Plain Payment Requests
//!
//! The receiver names an exact amount. Anyone may settle by paying exactly
//! that amount into the request's escrow vault; only the receiver may sweep
//! it out.
//!
//! ```text
//! record = derive([b"pay_request", receiver, request_id_le])
//! vault  = derive([b"escrow",      receiver, request_id_le])
//! ```
//!
//! The payer needs `(receiver, request_id)` to find the vault, but never
//! sends anything to the receiver's wallet directly.

use paylink_protocol::config::{ESCROW_TAG, PAY_REQUEST_TAG};
use paylink_protocol::crypto::Address;
use paylink_protocol::ledger::{AccountData, AccountStore, Clock, Ledger};
use serde::{Deserialize, Serialize};

use crate::error::PaymentRequestError;
use crate::lifecycle::{CreateReceipt, RequestAccount, RequestProgram, SettleReceipt, SweepReceipt};

/// Name the plain program's id is derived from.
pub const PROGRAM_NAME: &str = "paylink.payment_request";

/// Stored state of a plain request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayRequest {
    pub receiver: Address,
    pub request_id: u64,
    /// Exact amount the request accepts, in photons.
    pub amount: u64,
    pub settled_amount: u64,
    pub is_settled: bool,
    pub is_swept: bool,
}

impl AccountData for PayRequest {
    const TYPE_NAME: &'static str = "PayRequest";
}

impl RequestAccount for PayRequest {
    const RECORD_TAG: &'static [u8] = PAY_REQUEST_TAG;
    const VAULT_TAG: &'static [u8] = ESCROW_TAG;

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

    fn mark_settled(&mut self, amount: u64, _payer: &Address, _clock: &Clock) {
        self.settled_amount = amount;
        self.is_settled = true;
    }

    fn mark_swept(&mut self) {
        self.is_swept = true;
    }
}

/// The plain program.
pub fn program() -> RequestProgram<PayRequest> {
    RequestProgram::new(PROGRAM_NAME)
}

/// Publish a request for exactly `amount` photons.
///
/// # Errors
///
/// - [`PaymentRequestError::InvalidRange`] if `amount` is zero.
/// - [`PaymentRequestError::DuplicateRequest`] if the id is taken.
/// - [`PaymentRequestError::InsufficientFunds`] if the receiver cannot
///   cover the deposit and fee.
pub fn create_pay_request<S: AccountStore>(
    ledger: &Ledger<S>,
    receiver: &Address,
    request_id: u64,
    amount: u64,
) -> Result<CreateReceipt, PaymentRequestError> {
    if amount == 0 {
        return Err(PaymentRequestError::InvalidRange {
            min: amount,
            max: amount,
        });
    }
    program().create(
        ledger,
        PayRequest {
            receiver: *receiver,
            request_id,
            amount,
            settled_amount: 0,
            is_settled: false,
            is_swept: false,
        },
    )
}

/// Pay `amount` into the escrow of `(receiver, request_id)`.
///
/// The amount must match the request exactly; anything else is reported
/// as out of the single-point range `[amount, amount]`.
pub fn settle_payment<S: AccountStore>(
    ledger: &Ledger<S>,
    receiver: &Address,
    request_id: u64,
    payer: &Address,
    amount: u64,
) -> Result<SettleReceipt, PaymentRequestError> {
    program().settle(ledger, receiver, request_id, payer, |record| {
        if amount != record.amount {
            return Err(PaymentRequestError::AmountOutOfRange {
                amount,
                min: record.amount,
                max: record.amount,
            });
        }
        Ok(amount)
    })
}

/// Move the escrowed funds to the receiver and close the request.
pub fn sweep_funds<S: AccountStore>(
    ledger: &Ledger<S>,
    receiver_ref: &Address,
    request_id: u64,
    caller: &Address,
) -> Result<SweepReceipt, PaymentRequestError> {
    program().sweep(ledger, receiver_ref, request_id, caller, |_| Ok(()))
}

/// The committed record for `(receiver, request_id)`.
pub fn fetch_request<S: AccountStore>(
    ledger: &Ledger<S>,
    receiver: &Address,
    request_id: u64,
) -> Result<PayRequest, PaymentRequestError> {
    program().fetch(ledger, receiver, request_id)
}

pub fn request_address(receiver: &Address, request_id: u64) -> Result<Address, PaymentRequestError> {
    program().request_address(receiver, request_id)
}

pub fn escrow_address(receiver: &Address, request_id: u64) -> Result<Address, PaymentRequestError> {
    program().escrow_address(receiver, request_id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
