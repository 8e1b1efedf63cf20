//! # Accounts
//!
//! Every address holds at most one [`Account`]: a balance, an owner, and
//! opaque data. Wallets are owned by [`Address::SYSTEM`] and carry no data.
//! Program accounts are owned by the program that created them and carry a
//! typed payload:
//!
//! ```text
//! data = discriminator (8 bytes) || bincode(payload)
//! discriminator = SHA-256("account:" || TYPE_NAME)[..8]
//! ```
//!
//! Decoding checks the discriminator first, so an account of one type can
//! never be read as another.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::store::LedgerError;
use crate::config::DISCRIMINATOR_LEN;
use crate::crypto::hash::sha256_multi;
use crate::crypto::keys::Address;

/// One entry in the ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Balance in photons.
    pub balance: u64,
    /// The program allowed to debit and write this account, or
    /// [`Address::SYSTEM`] for wallets.
    pub owner: Address,
    /// Program-defined payload.
    pub data: Vec<u8>,
}

impl Account {
    /// A plain wallet holding `balance`.
    pub fn wallet(balance: u64) -> Self {
        Self {
            balance,
            owner: Address::SYSTEM,
            data: Vec::new(),
        }
    }

    /// An account owned by `owner`.
    pub fn owned_by(owner: Address, balance: u64, data: Vec<u8>) -> Self {
        Self {
            balance,
            owner,
            data,
        }
    }

    pub fn is_wallet(&self) -> bool {
        self.owner == Address::SYSTEM
    }
}

/// The 8-byte type tag for `type_name`.
pub fn discriminator(type_name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let digest = sha256_multi(&[b"account:", type_name.as_bytes()]);
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
    out
}

/// A payload stored in a program account.
pub trait AccountData: Serialize + DeserializeOwned {
    /// Name hashed into the discriminator. Changing it orphans stored data.
    const TYPE_NAME: &'static str;

    /// Discriminator followed by the bincode payload.
    fn to_account_data(&self) -> Result<Vec<u8>, LedgerError> {
        let body = bincode::serialize(self).map_err(|e| LedgerError::Codec(e.to_string()))?;
        let mut data = Vec::with_capacity(DISCRIMINATOR_LEN + body.len());
        data.extend_from_slice(&discriminator(Self::TYPE_NAME));
        data.extend_from_slice(&body);
        Ok(data)
    }

    /// Decode account data, rejecting any other type.
    fn from_account_data(data: &[u8]) -> Result<Self, LedgerError> {
        if data.len() < DISCRIMINATOR_LEN
            || data[..DISCRIMINATOR_LEN] != discriminator(Self::TYPE_NAME)
        {
            return Err(LedgerError::AccountTypeMismatch {
                expected: Self::TYPE_NAME,
            });
        }
        bincode::deserialize(&data[DISCRIMINATOR_LEN..]).map_err(|e| LedgerError::Codec(e.to_string()))
    }
}
