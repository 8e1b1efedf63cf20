// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # PAYLINK Protocol — Core Library
//!
//! Primitives for private payment requests. A receiver publishes a request
//! backed by a program-derived escrow account, a payer settles into that
//! escrow without ever learning the receiver's wallet, and the receiver
//! sweeps the funds out, closing every ephemeral account on the way.
//!
//! This crate holds everything the escrow programs stand on. The programs
//! themselves live in `paylink-contracts`.
//!
//! ## Architecture
//!
//! - **config** — Protocol constants, namespace tags, fee and deposit parameters.
//! - **crypto** — Hashing, identities, and the stealth-address key scheme.
//! - **derivation** — Program-derived addresses. One-way, off-curve, deterministic.
//! - **zkp** — Amount commitments and the verifiers that gate settlement and sweep.
//! - **ledger** — Accounts, atomic transitions, and the in-memory and sled stores.
//!
//! ## Design Philosophy
//!
//! 1. Every state transition is all-or-nothing. There is no half-settled request.
//! 2. Derivation is the uniqueness check. No side indexes to fall out of sync.
//! 3. Verification is a pure function of its inputs. Auditors can replay any decision.
//! 4. If it touches money, it has tests. Plural.

pub mod config;
pub mod crypto;
pub mod derivation;
pub mod ledger;
pub mod zkp;
