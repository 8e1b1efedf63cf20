//! # Request Lifecycle
//!
//! Both escrow programs run the same three-state machine:
//!
//! ```text
//!            settle (any payer)           sweep (receiver only)
//! Created ─────────────────────▶ Settled ─────────────────────▶ Swept
//!   │                               │                             │
//!   record allocated,               vault created holding         vault drained to receiver,
//!   deposit + fee from receiver     the settled amount            record closed, deposit refunded
//! ```
//!
//! There is no cancel, refund or expiry edge. `Swept` is terminal and
//! leaves nothing behind on the ledger; a second sweep finds no record.
//!
//! [`RequestProgram`] implements the machine once over any
//! [`RequestAccount`]. Each variant plugs its own authorization into
//! `settle` and `sweep` as a closure that inspects the stored record before
//! anything is written. Every operation is a single ledger transition:
//! either all of it commits or none of it does.

use std::fmt;
use std::marker::PhantomData;

use paylink_protocol::crypto::Address;
use paylink_protocol::derivation::{program_id, request_scoped_address};
use paylink_protocol::ledger::{AccountData, AccountStore, Clock, Ledger, LedgerError, LedgerTx};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::PaymentRequestError;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Created,
    Settled,
    Swept,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestStatus::Created => write!(f, "Created"),
            RequestStatus::Settled => write!(f, "Settled"),
            RequestStatus::Swept => write!(f, "Swept"),
        }
    }
}

/// A request record the lifecycle can drive.
pub trait RequestAccount: AccountData + Clone {
    /// Seed tag of the record address.
    const RECORD_TAG: &'static [u8];
    /// Seed tag of the escrow vault address.
    const VAULT_TAG: &'static [u8];

    fn receiver(&self) -> &Address;
    fn request_id(&self) -> u64;
    fn is_settled(&self) -> bool;
    fn is_swept(&self) -> bool;
    fn settled_amount(&self) -> u64;

    /// Record a settlement of `amount` by `payer` at `clock`.
    fn mark_settled(&mut self, amount: u64, payer: &Address, clock: &Clock);

    fn mark_swept(&mut self);

    fn status(&self) -> RequestStatus {
        match (self.is_settled(), self.is_swept()) {
            (_, true) => RequestStatus::Swept,
            (true, false) => RequestStatus::Settled,
            (false, false) => RequestStatus::Created,
        }
    }
}

/// Outcome of a committed create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateReceipt {
    pub program_id: Address,
    pub request: Address,
    pub escrow: Address,
    pub receiver: Address,
    pub request_id: u64,
    /// Photons locked in the record account until sweep.
    pub deposit: u64,
    pub fee: u64,
    pub slot: u64,
}

/// Outcome of a committed settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleReceipt {
    pub request: Address,
    pub escrow: Address,
    pub payer: Address,
    pub request_id: u64,
    pub amount: u64,
    pub fee: u64,
    pub slot: u64,
}

/// Outcome of a committed sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReceipt {
    pub request: Address,
    pub escrow: Address,
    pub receiver: Address,
    pub request_id: u64,
    /// Photons moved out of the vault.
    pub amount: u64,
    /// Record deposit returned to the receiver.
    pub deposit_refund: u64,
    pub fee: u64,
    pub slot: u64,
}

// ---------------------------------------------------------------------------
// RequestProgram
// ---------------------------------------------------------------------------

/// The lifecycle of one request type under one program id.
pub struct RequestProgram<R> {
    name: String,
    program_id: Address,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for RequestProgram<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            program_id: self.program_id,
            _record: PhantomData,
        }
    }
}

impl<R> fmt::Debug for RequestProgram<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestProgram")
            .field("name", &self.name)
            .field("program_id", &self.program_id)
            .finish()
    }
}

impl<R: RequestAccount> RequestProgram<R> {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let program_id = program_id(&name);
        Self {
            name,
            program_id,
            _record: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program_id(&self) -> &Address {
        &self.program_id
    }

    pub fn request_address(
        &self,
        receiver: &Address,
        request_id: u64,
    ) -> Result<Address, PaymentRequestError> {
        let (address, _) =
            request_scoped_address(R::RECORD_TAG, receiver, request_id, &self.program_id)?;
        Ok(address)
    }

    pub fn escrow_address(
        &self,
        receiver: &Address,
        request_id: u64,
    ) -> Result<Address, PaymentRequestError> {
        let (address, _) =
            request_scoped_address(R::VAULT_TAG, receiver, request_id, &self.program_id)?;
        Ok(address)
    }

    /// Read the committed record for `(receiver, request_id)`.
    pub fn fetch<S: AccountStore>(
        &self,
        ledger: &Ledger<S>,
        receiver: &Address,
        request_id: u64,
    ) -> Result<R, PaymentRequestError> {
        let address = self.request_address(receiver, request_id)?;
        let account = ledger
            .account(&address)?
            .ok_or(PaymentRequestError::RequestNotFound { address })?;
        self.decode(&address, &account.owner, &account.data)
    }

    fn decode(
        &self,
        address: &Address,
        owner: &Address,
        data: &[u8],
    ) -> Result<R, PaymentRequestError> {
        let mismatch = PaymentRequestError::AccountTypeMismatch {
            address: *address,
            expected: R::TYPE_NAME,
        };
        if *owner != self.program_id {
            return Err(mismatch);
        }
        R::from_account_data(data).map_err(|e| match e {
            LedgerError::AccountTypeMismatch { .. } => mismatch,
            other => other.into(),
        })
    }

    fn load<S: AccountStore>(
        &self,
        tx: &LedgerTx<'_, S>,
        address: &Address,
    ) -> Result<R, PaymentRequestError> {
        let account = tx
            .account(address)?
            .ok_or(PaymentRequestError::RequestNotFound { address: *address })?;
        self.decode(address, &account.owner, &account.data)
    }

    /// Allocate `record` at its derived address, funded by its receiver.
    ///
    /// Inputs must already be validated; this only enforces uniqueness.
    pub fn create<S: AccountStore>(
        &self,
        ledger: &Ledger<S>,
        record: R,
    ) -> Result<CreateReceipt, PaymentRequestError> {
        let receiver = *record.receiver();
        let request_id = record.request_id();
        let request = self.request_address(&receiver, request_id)?;
        let escrow = self.escrow_address(&receiver, request_id)?;
        let data = record.to_account_data()?;

        let result = ledger.transact(|tx| {
            if tx.exists(&request)? {
                return Err(PaymentRequestError::DuplicateRequest {
                    receiver,
                    request_id,
                });
            }
            let deposit = tx.config().deposit_for(data.len());
            let fee = tx.charge_fee(&receiver)?;
            tx.create_account(&receiver, &request, &self.program_id, deposit, data)?;
            Ok(CreateReceipt {
                program_id: self.program_id,
                request,
                escrow,
                receiver,
                request_id,
                deposit,
                fee,
                slot: tx.clock().slot,
            })
        });

        match &result {
            Ok(receipt) => info!(
                program = %self.name,
                request = %receipt.request,
                request_id,
                deposit = receipt.deposit,
                slot = receipt.slot,
                "payment request created"
            ),
            Err(e) => warn!(program = %self.name, request_id, error = %e, "create rejected"),
        }
        result
    }

    /// Settle the request into its escrow vault.
    ///
    /// `authorize` sees the stored record and returns the amount to move,
    /// or the reason to refuse. It runs after the existence and
    /// already-settled checks and before any write.
    pub fn settle<S, F>(
        &self,
        ledger: &Ledger<S>,
        receiver: &Address,
        request_id: u64,
        payer: &Address,
        authorize: F,
    ) -> Result<SettleReceipt, PaymentRequestError>
    where
        S: AccountStore,
        F: FnOnce(&R) -> Result<u64, PaymentRequestError>,
    {
        let request = self.request_address(receiver, request_id)?;
        let escrow = self.escrow_address(receiver, request_id)?;

        let result = ledger.transact(|tx| {
            let mut record = self.load(tx, &request)?;
            if record.is_settled() {
                return Err(PaymentRequestError::AlreadySettled { request_id });
            }
            let amount = authorize(&record)?;

            let fee = tx.charge_fee(payer)?;
            tx.create_account(payer, &escrow, &self.program_id, amount, Vec::new())?;

            let clock = tx.clock();
            record.mark_settled(amount, payer, &clock);
            tx.write_data(&self.program_id, &request, record.to_account_data()?)?;

            Ok(SettleReceipt {
                request,
                escrow,
                payer: *payer,
                request_id,
                amount,
                fee,
                slot: clock.slot,
            })
        });

        match &result {
            Ok(receipt) => info!(
                program = %self.name,
                request = %request,
                request_id,
                amount = receipt.amount,
                slot = receipt.slot,
                "payment settled"
            ),
            Err(e) => warn!(program = %self.name, request_id, error = %e, "settle rejected"),
        }
        result
    }

    /// Drain the vault to the receiver and close the request.
    ///
    /// `receiver_ref` locates the record; `caller` must be the receiver it
    /// stores. `authorize` runs last, after the caller and settlement checks.
    pub fn sweep<S, F>(
        &self,
        ledger: &Ledger<S>,
        receiver_ref: &Address,
        request_id: u64,
        caller: &Address,
        authorize: F,
    ) -> Result<SweepReceipt, PaymentRequestError>
    where
        S: AccountStore,
        F: FnOnce(&R) -> Result<(), PaymentRequestError>,
    {
        let request = self.request_address(receiver_ref, request_id)?;
        let escrow = self.escrow_address(receiver_ref, request_id)?;

        let result = ledger.transact(|tx| {
            let mut record = self.load(tx, &request)?;
            let receiver = *record.receiver();
            if *caller != receiver {
                return Err(PaymentRequestError::UnauthorizedReceiver {
                    caller: *caller,
                    receiver,
                });
            }
            if !record.is_settled() {
                return Err(PaymentRequestError::NotSettled { request_id });
            }
            authorize(&record)?;

            let amount = record.settled_amount();
            tx.transfer(&self.program_id, &escrow, &receiver, amount)?;
            tx.close_empty(&self.program_id, &escrow)?;

            record.mark_swept();
            tx.write_data(&self.program_id, &request, record.to_account_data()?)?;
            let deposit_refund = tx.close_account(&self.program_id, &request, &receiver)?;
            let fee = tx.charge_fee(&receiver)?;

            Ok(SweepReceipt {
                request,
                escrow,
                receiver,
                request_id,
                amount,
                deposit_refund,
                fee,
                slot: tx.clock().slot,
            })
        });

        match &result {
            Ok(receipt) => info!(
                program = %self.name,
                request = %request,
                request_id,
                amount = receipt.amount,
                deposit_refund = receipt.deposit_refund,
                slot = receipt.slot,
                "funds swept"
            ),
            Err(e) => warn!(program = %self.name, request_id, error = %e, "sweep rejected"),
        }
        result
    }
}
