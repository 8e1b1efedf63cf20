//! # Persistent Store
//!
//! [`SledStore`] keeps the ledger in sled's embedded key-value store.
//!
//! ## Tree Layout
//!
//! | Tree       | Key              | Value             |
//! |------------|------------------|-------------------|
//! | `accounts` | address (32B)    | `bincode(Account)` |
//! | `metadata` | key (UTF-8)      | `bincode(Clock)`   |
//!
//! ## Atomicity
//!
//! A commit runs as one sled transaction across both trees: every account
//! write, every removal and the new clock land together or not at all.
//! The database is flushed before `commit` returns.

use std::path::Path;

use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};

use super::account::Account;
use super::store::{AccountStore, ChangeSet, Clock, LedgerError, LedgerResult};
use crate::crypto::keys::Address;

/// Key in the `metadata` tree for the clock of the last commit.
const META_CLOCK: &[u8] = b"clock";

/// Durable [`AccountStore`] on sled.
#[derive(Debug, Clone)]
pub struct SledStore {
    db: Db,
    accounts: Tree,
    metadata: Tree,
}

impl SledStore {
    /// Open or create a database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        Self::from_db(sled::open(path)?)
    }

    /// A database that is deleted when dropped.
    pub fn open_temporary() -> LedgerResult<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> LedgerResult<Self> {
        let accounts = db.open_tree("accounts")?;
        let metadata = db.open_tree("metadata")?;
        let store = Self {
            db,
            accounts,
            metadata,
        };
        if store.metadata.get(META_CLOCK)?.is_none() {
            store
                .metadata
                .insert(META_CLOCK, bincode::serialize(&Clock::genesis())?)?;
        }
        Ok(store)
    }

    pub fn flush(&self) -> LedgerResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl AccountStore for SledStore {
    fn load(&self, address: &Address) -> LedgerResult<Option<Account>> {
        match self.accounts.get(address.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn commit(&self, changes: &ChangeSet) -> LedgerResult<()> {
        // Encode outside the transaction; the closure may be retried.
        let mut writes: Vec<(Vec<u8>, Option<Vec<u8>>)> = Vec::with_capacity(changes.len());
        for (address, change) in &changes.changes {
            let value = match change {
                Some(account) => Some(bincode::serialize(account)?),
                None => None,
            };
            writes.push((address.as_bytes().to_vec(), value));
        }
        let clock = bincode::serialize(&changes.clock)?;

        (&self.accounts, &self.metadata)
            .transaction(|(accounts, metadata)| {
                for (key, value) in &writes {
                    match value {
                        Some(bytes) => {
                            accounts.insert(key.clone(), bytes.clone())?;
                        }
                        None => {
                            accounts.remove(key.clone())?;
                        }
                    }
                }
                metadata.insert(META_CLOCK, clock.clone())?;
                Ok::<(), ConflictableTransactionError<()>>(())
            })
            .map_err(|e| match e {
                TransactionError::Abort(()) => LedgerError::Storage("commit aborted".into()),
                TransactionError::Storage(e) => LedgerError::from(e),
            })?;

        self.flush()
    }

    fn clock(&self) -> LedgerResult<Clock> {
        match self.metadata.get(META_CLOCK)? {
            Some(bytes) => Ok(bincode::deserialize(&bytes)?),
            None => Ok(Clock::genesis()),
        }
    }

    fn account_count(&self) -> LedgerResult<usize> {
        Ok(self.accounts.len())
    }

    fn accounts(&self) -> LedgerResult<Vec<(Address, Account)>> {
        let mut all = Vec::new();
        for entry in self.accounts.iter() {
            let (key, value) = entry?;
            let bytes: [u8; 32] = key
                .as_ref()
                .try_into()
                .map_err(|_| LedgerError::Codec(format!("bad account key of {} bytes", key.len())))?;
            all.push((Address::new(bytes), bincode::deserialize(&value)?));
        }
        Ok(all)
    }
}
