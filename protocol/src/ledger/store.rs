//! # Store Abstraction
//!
//! [`AccountStore`] is the only thing the ledger needs from a backend:
//! point reads, an all-or-nothing commit, and the clock of the last commit.
//! Backends never see partial transitions.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::account::Account;
use crate::crypto::keys::Address;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by the ledger and its stores.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient funds in {address}: need {needed}, have {available}")]
    InsufficientFunds {
        address: Address,
        needed: u64,
        available: u64,
    },

    #[error("balance arithmetic overflow")]
    Overflow,

    #[error("account {0} already exists")]
    AccountExists(Address),

    #[error("account {0} not found")]
    AccountNotFound(Address),

    /// The authority is neither the owning program nor, for wallets, the
    /// wallet itself.
    #[error("{authority} may not modify {address}")]
    Unauthorized { address: Address, authority: Address },

    #[error("account data length is fixed at {expected} bytes, got {actual}")]
    DataLength { expected: usize, actual: usize },

    #[error("account {address} still holds {balance} photons")]
    NotEmpty { address: Address, balance: u64 },

    #[error("account data is not a {expected}")]
    AccountTypeMismatch { expected: &'static str },

    #[error("codec error: {0}")]
    Codec(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<sled::Error> for LedgerError {
    fn from(e: sled::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<bincode::Error> for LedgerError {
    fn from(e: bincode::Error) -> Self {
        Self::Codec(e.to_string())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Ledger time: the sequence number of the last commit and its wall-clock
/// timestamp. Both only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    pub slot: u64,
    pub unix_timestamp: i64,
}

impl Clock {
    /// Slot zero, stamped now.
    pub fn genesis() -> Self {
        Self {
            slot: 0,
            unix_timestamp: Utc::now().timestamp(),
        }
    }

    /// The clock of the next commit. The timestamp never goes backwards,
    /// even if the wall clock does.
    pub fn next(&self, now: i64) -> Self {
        Self {
            slot: self.slot.saturating_add(1),
            unix_timestamp: now.max(self.unix_timestamp),
        }
    }
}

// ---------------------------------------------------------------------------
// ChangeSet
// ---------------------------------------------------------------------------

/// The writes of one transition. `None` removes the account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeSet {
    pub clock: Clock,
    pub changes: BTreeMap<Address, Option<Account>>,
}

impl ChangeSet {
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            changes: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// AccountStore
// ---------------------------------------------------------------------------

/// A backend that can hold ledger state.
pub trait AccountStore: Send + Sync {
    /// Read one account.
    fn load(&self, address: &Address) -> LedgerResult<Option<Account>>;

    /// Apply every change and the new clock, or none of them.
    fn commit(&self, changes: &ChangeSet) -> LedgerResult<()>;

    /// Clock of the last commit.
    fn clock(&self) -> LedgerResult<Clock>;

    /// Number of live accounts.
    fn account_count(&self) -> LedgerResult<usize>;

    /// Every live account, sorted by address.
    fn accounts(&self) -> LedgerResult<Vec<(Address, Account)>>;
}
