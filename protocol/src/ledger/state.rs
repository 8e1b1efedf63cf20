//! # In-Memory Store
//!
//! A `HashMap` behind a `RwLock`. Commits take the write lock once and
//! apply every change under it, so readers never observe half a transition.
//! Used by tests and by anything that doesn't need to survive a restart.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::account::Account;
use super::store::{AccountStore, ChangeSet, Clock, LedgerResult};
use crate::crypto::keys::Address;

struct MemoryState {
    accounts: HashMap<Address, Account>,
    clock: Clock,
}

/// Volatile [`AccountStore`].
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                accounts: HashMap::new(),
                clock: Clock::genesis(),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore for MemoryStore {
    fn load(&self, address: &Address) -> LedgerResult<Option<Account>> {
        Ok(self.state.read().accounts.get(address).cloned())
    }

    fn commit(&self, changes: &ChangeSet) -> LedgerResult<()> {
        let mut state = self.state.write();
        for (address, change) in &changes.changes {
            match change {
                Some(account) => {
                    state.accounts.insert(*address, account.clone());
                }
                None => {
                    state.accounts.remove(address);
                }
            }
        }
        state.clock = changes.clock;
        Ok(())
    }

    fn clock(&self) -> LedgerResult<Clock> {
        Ok(self.state.read().clock)
    }

    fn account_count(&self) -> LedgerResult<usize> {
        Ok(self.state.read().accounts.len())
    }

    fn accounts(&self) -> LedgerResult<Vec<(Address, Account)>> {
        let state = self.state.read();
        let mut all: Vec<_> = state
            .accounts
            .iter()
            .map(|(address, account)| (*address, account.clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(all)
    }
}
