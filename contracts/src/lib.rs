//! # PAYLINK Escrow Programs
//!
//! Two programs over one lifecycle:
//!
//! - **Payment Request** — the receiver names an exact amount; any payer
//!   settles into a derived escrow vault; the receiver sweeps.
//! - **Private Payment Request** — the amount is hidden behind a commitment
//!   with public bounds; settlement must open the commitment, and the sweep
//!   must reveal the ephemeral key bound at creation.
//!
//! ## Design Principles
//!
//! 1. All monetary operations are checked. Wrapping arithmetic and money do
//!    not mix.
//! 2. Each operation is one ledger transition. Validation happens before the
//!    first write, and a failure commits nothing.
//! 3. The derived record address is the uniqueness key. Occupied means taken.
//! 4. Records are typed on the ledger. A plain request can never be read as
//!    a private one.

pub mod error;
pub mod lifecycle;
pub mod payment_request;
pub mod zk_payment_request;

pub use error::{ErrorKind, PaymentRequestError};
pub use lifecycle::{CreateReceipt, RequestAccount, RequestProgram, RequestStatus, SettleReceipt, SweepReceipt};
pub use payment_request::PayRequest;
pub use zk_payment_request::{ZkPayRequest, ZkPaymentRequests, ZkRequestParams};
