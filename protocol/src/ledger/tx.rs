//! # Ledger Transitions
//!
//! [`Ledger`] owns a store and serializes every state transition through
//! one lock. [`LedgerTx`] is the view a transition works against: reads
//! fall through to the store, writes collect in an overlay that becomes the
//! [`ChangeSet`] on success.
//!
//! ## Authority Rules
//!
//! - A wallet (owner [`Address::SYSTEM`]) is debited only by itself.
//! - A program account is debited, written and closed only by its owner.
//! - Value can flow to an address with no account only if that address is a
//!   curve point, i.e. something a key could exist for. Derived addresses
//!   are off-curve, so nobody can pre-fund an escrow before its program
//!   creates it.
//! - Program account data never changes length after creation; the storage
//!   deposit was priced on that length.

use std::collections::BTreeMap;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::debug;

use super::account::Account;
use super::store::{AccountStore, ChangeSet, Clock, LedgerError, LedgerResult};
use crate::config::ProtocolConfig;
use crate::crypto::keys::Address;

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// A store plus the lock that makes transitions linearizable.
pub struct Ledger<S: AccountStore> {
    store: S,
    config: ProtocolConfig,
    lock: Mutex<()>,
}

impl<S: AccountStore> Ledger<S> {
    pub fn new(store: S, config: ProtocolConfig) -> Self {
        Self {
            store,
            config,
            lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Clock of the last committed transition.
    pub fn clock(&self) -> LedgerResult<Clock> {
        self.store.clock()
    }

    pub fn account(&self, address: &Address) -> LedgerResult<Option<Account>> {
        self.store.load(address)
    }

    /// Balance of `address`, zero if it has no account.
    pub fn balance(&self, address: &Address) -> LedgerResult<u64> {
        Ok(self.store.load(address)?.map_or(0, |a| a.balance))
    }

    /// Sum of every balance on the ledger.
    pub fn total_supply(&self) -> LedgerResult<u128> {
        Ok(self
            .store
            .accounts()?
            .iter()
            .map(|(_, a)| u128::from(a.balance))
            .sum())
    }

    /// Run `op` as one atomic transition.
    ///
    /// `Ok` commits every write `op` made and advances the slot. `Err`
    /// discards them. Concurrent callers run one at a time.
    pub fn transact<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&mut LedgerTx<'_, S>) -> Result<T, E>,
        E: From<LedgerError>,
    {
        let _guard = self.lock.lock();
        let clock = self.store.clock()?.next(Utc::now().timestamp());
        let mut tx = LedgerTx {
            store: &self.store,
            config: &self.config,
            clock,
            overlay: BTreeMap::new(),
            fees_burned: 0,
        };

        let value = op(&mut tx)?;

        let fees = tx.fees_burned;
        let changes = ChangeSet {
            clock,
            changes: tx.overlay,
        };
        self.store.commit(&changes)?;
        debug!(
            slot = clock.slot,
            accounts = changes.len(),
            fees,
            "ledger commit"
        );
        Ok(value)
    }

    /// Mint `amount` into the wallet at `address`. Genesis and test funding
    /// only; the escrow programs never call this.
    pub fn genesis_credit(&self, address: &Address, amount: u64) -> LedgerResult<u64> {
        self.transact(|tx| tx.mint(address, amount))
    }
}

// ---------------------------------------------------------------------------
// LedgerTx
// ---------------------------------------------------------------------------

/// Pending writes of one transition.
pub struct LedgerTx<'a, S: AccountStore> {
    store: &'a S,
    config: &'a ProtocolConfig,
    clock: Clock,
    overlay: BTreeMap<Address, Option<Account>>,
    fees_burned: u64,
}

impl<'a, S: AccountStore> LedgerTx<'a, S> {
    /// Clock this transition will commit at.
    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn config(&self) -> &ProtocolConfig {
        self.config
    }

    /// Current view of `address`, pending writes included.
    pub fn account(&self, address: &Address) -> LedgerResult<Option<Account>> {
        match self.overlay.get(address) {
            Some(pending) => Ok(pending.clone()),
            None => self.store.load(address),
        }
    }

    pub fn exists(&self, address: &Address) -> LedgerResult<bool> {
        Ok(self.account(address)?.is_some())
    }

    pub fn balance(&self, address: &Address) -> LedgerResult<u64> {
        Ok(self.account(address)?.map_or(0, |a| a.balance))
    }

    fn existing(&self, address: &Address) -> LedgerResult<Account> {
        self.account(address)?
            .ok_or(LedgerError::AccountNotFound(*address))
    }

    fn check_authority(
        address: &Address,
        account: &Account,
        authority: &Address,
    ) -> LedgerResult<()> {
        let allowed = if account.is_wallet() {
            authority == address
        } else {
            *authority == account.owner
        };
        if !allowed {
            return Err(LedgerError::Unauthorized {
                address: *address,
                authority: *authority,
            });
        }
        Ok(())
    }

    fn debit(&mut self, authority: &Address, address: &Address, amount: u64) -> LedgerResult<()> {
        let mut account = self.existing(address)?;
        Self::check_authority(address, &account, authority)?;
        account.balance =
            account
                .balance
                .checked_sub(amount)
                .ok_or(LedgerError::InsufficientFunds {
                    address: *address,
                    needed: amount,
                    available: account.balance,
                })?;
        self.overlay.insert(*address, Some(account));
        Ok(())
    }

    /// Program accounts only take value on their owner's authority, so a
    /// vault holds exactly what its program put there.
    fn credit(&mut self, authority: &Address, address: &Address, amount: u64) -> LedgerResult<()> {
        let mut account = match self.account(address)? {
            Some(account) => account,
            None if address.is_on_curve() => Account::wallet(0),
            None => return Err(LedgerError::AccountNotFound(*address)),
        };
        if !account.is_wallet() && account.owner != *authority {
            return Err(LedgerError::Unauthorized {
                address: *address,
                authority: *authority,
            });
        }
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.overlay.insert(*address, Some(account));
        Ok(())
    }

    /// Move `amount` from `from` to `to` on the authority of `authority`.
    pub fn transfer(
        &mut self,
        authority: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> LedgerResult<()> {
        self.debit(authority, from, amount)?;
        self.credit(authority, to, amount)
    }

    /// Allocate a program account at `address`, funded by `funder`.
    pub fn create_account(
        &mut self,
        funder: &Address,
        address: &Address,
        owner: &Address,
        balance: u64,
        data: Vec<u8>,
    ) -> LedgerResult<()> {
        if self.exists(address)? {
            return Err(LedgerError::AccountExists(*address));
        }
        self.debit(funder, funder, balance)?;
        self.overlay
            .insert(*address, Some(Account::owned_by(*owner, balance, data)));
        Ok(())
    }

    /// Replace the data of a program account. The length must not change.
    pub fn write_data(
        &mut self,
        program: &Address,
        address: &Address,
        data: Vec<u8>,
    ) -> LedgerResult<()> {
        let mut account = self.existing(address)?;
        if account.is_wallet() || account.owner != *program {
            return Err(LedgerError::Unauthorized {
                address: *address,
                authority: *program,
            });
        }
        if account.data.len() != data.len() {
            return Err(LedgerError::DataLength {
                expected: account.data.len(),
                actual: data.len(),
            });
        }
        account.data = data;
        self.overlay.insert(*address, Some(account));
        Ok(())
    }

    /// Remove a program account, sending whatever it holds to `recipient`.
    /// Returns the amount moved.
    pub fn close_account(
        &mut self,
        program: &Address,
        address: &Address,
        recipient: &Address,
    ) -> LedgerResult<u64> {
        let account = self.existing(address)?;
        if account.is_wallet() {
            return Err(LedgerError::Unauthorized {
                address: *address,
                authority: *program,
            });
        }
        Self::check_authority(address, &account, program)?;
        let balance = account.balance;
        self.overlay.insert(*address, None);
        self.credit(program, recipient, balance)?;
        Ok(balance)
    }

    /// Remove a drained program account. Fails if anything is left in it.
    pub fn close_empty(&mut self, program: &Address, address: &Address) -> LedgerResult<()> {
        let account = self.existing(address)?;
        Self::check_authority(address, &account, program)?;
        if account.balance != 0 {
            return Err(LedgerError::NotEmpty {
                address: *address,
                balance: account.balance,
            });
        }
        self.overlay.insert(*address, None);
        Ok(())
    }

    /// Charge the flat transaction fee to `payer`. The fee is burned.
    pub fn charge_fee(&mut self, payer: &Address) -> LedgerResult<u64> {
        let fee = self.config.transaction_fee;
        if fee == 0 {
            return Ok(0);
        }
        self.debit(payer, payer, fee)?;
        self.fees_burned = self
            .fees_burned
            .checked_add(fee)
            .ok_or(LedgerError::Overflow)?;
        Ok(fee)
    }

    fn mint(&mut self, address: &Address, amount: u64) -> LedgerResult<u64> {
        let mut account = self.account(address)?.unwrap_or_else(|| Account::wallet(0));
        if !account.is_wallet() {
            return Err(LedgerError::Unauthorized {
                address: *address,
                authority: Address::SYSTEM,
            });
        }
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let balance = account.balance;
        self.overlay.insert(*address, Some(account));
        Ok(balance)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
