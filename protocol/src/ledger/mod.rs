//! # Ledger
//!
//! The account store the escrow programs run against. Think of it as the
//! smallest possible chain state: a map from [`Address`] to [`Account`],
//! a slot counter, and an atomic commit.
//!
//! ## Architecture
//!
//! ```text
//! account.rs — Account, typed account data with discriminators
//! store.rs   — AccountStore trait, ChangeSet, Clock, LedgerError
//! state.rs   — MemoryStore: HashMap behind a RwLock
//! db.rs      — SledStore: sled trees, one transaction per commit
//! tx.rs      — Ledger (serialized transitions) and LedgerTx (the overlay)
//! ```
//!
//! ## Transitions
//!
//! ```text
//! ledger.transact(|tx| {
//!     tx.charge_fee(&payer)?;
//!     tx.create_account(&payer, &vault, &program, amount, vec![])?;
//!     tx.transfer(&payer, &payer, &receiver, tip)?;   // reads see the overlay
//!     Ok(receipt)
//! })
//! ```
//!
//! Program accounts take value only from their owner program; a wallet can
//! fund one by creating it, never by paying into it afterwards.
//!
//! The closure runs against an overlay of pending writes. `Ok` commits the
//! whole overlay in one atomic store write and advances the slot; `Err`
//! drops it and the store never sees a byte. Transitions are serialized by
//! a single lock, so two racing operations on the same request always see
//! each other's effects in some order.
//!
//! [`Address`]: crate::crypto::keys::Address

pub mod account;
pub mod db;
pub mod state;
pub mod store;
pub mod tx;

pub use account::{Account, AccountData};
pub use db::SledStore;
pub use state::MemoryStore;
pub use store::{AccountStore, ChangeSet, Clock, LedgerError, LedgerResult};
pub use tx::{Ledger, LedgerTx};
