//! Integration tests for the plain payment request program.
//!
//! Each test drives a full ledger through create, settle and sweep, and
//! checks balances, record state and the error class of every refusal.

use paylink_contracts::payment_request::{
    create_pay_request, escrow_address, fetch_request, request_address, settle_payment,
    sweep_funds,
};
use paylink_contracts::{ErrorKind, PaymentRequestError, RequestAccount, RequestStatus};
use paylink_protocol::config::{parse_native_amount, ProtocolConfig, PHOTONS_PER_UNIT};
use paylink_protocol::crypto::{Address, Keypair};
use paylink_protocol::ledger::{Ledger, LedgerError, MemoryStore};

const START: u64 = 10 * PHOTONS_PER_UNIT;

struct World {
    ledger: Ledger<MemoryStore>,
    receiver: Address,
    payer: Address,
}

fn world() -> World {
    let ledger = Ledger::new(MemoryStore::new(), ProtocolConfig::default());
    let receiver = Keypair::generate().address();
    let payer = Keypair::generate().address();
    ledger.genesis_credit(&receiver, START).unwrap();
    ledger.genesis_credit(&payer, START).unwrap();
    World {
        ledger,
        receiver,
        payer,
    }
}

// ---------------------------------------------------------------------------
// Lifecycle Tests
// ---------------------------------------------------------------------------

#[test]
fn end_to_end_request_settle_sweep() {
    let w = world();
    let fee = w.ledger.config().transaction_fee;
    let amount = parse_native_amount("0.1").unwrap();
    let supply = w.ledger.total_supply().unwrap();

    // 1. Create
    let created = create_pay_request(&w.ledger, &w.receiver, 12345, amount).unwrap();
    assert_eq!(created.request, request_address(&w.receiver, 12345).unwrap());
    assert_eq!(created.escrow, escrow_address(&w.receiver, 12345).unwrap());
    assert_eq!(
        w.ledger.balance(&w.receiver).unwrap(),
        START - fee - created.deposit
    );
    let record = fetch_request(&w.ledger, &w.receiver, 12345).unwrap();
    assert_eq!(record.amount, amount);
    assert_eq!(record.status(), RequestStatus::Created);

    // 2. Settle
    let settled = settle_payment(&w.ledger, &w.receiver, 12345, &w.payer, amount).unwrap();
    assert_eq!(settled.amount, amount);
    assert_eq!(w.ledger.balance(&settled.escrow).unwrap(), amount);
    assert_eq!(w.ledger.balance(&w.payer).unwrap(), START - amount - fee);
    let record = fetch_request(&w.ledger, &w.receiver, 12345).unwrap();
    assert!(record.is_settled && !record.is_swept);
    assert_eq!(record.settled_amount, amount);

    // 3. Sweep
    let swept = sweep_funds(&w.ledger, &w.receiver, 12345, &w.receiver).unwrap();
    assert_eq!(swept.amount, amount);
    assert_eq!(swept.deposit_refund, created.deposit);
    assert_eq!(w.ledger.account(&created.escrow).unwrap(), None);
    assert_eq!(w.ledger.account(&created.request).unwrap(), None);
    assert_eq!(
        w.ledger.balance(&w.receiver).unwrap(),
        START + amount - 2 * fee
    );

    // Only fees left circulation.
    assert_eq!(
        w.ledger.total_supply().unwrap(),
        supply - 3 * u128::from(fee)
    );
    assert!(swept.slot > settled.slot && settled.slot > created.slot);
}

#[test]
fn payer_can_be_anyone_including_receiver() {
    let w = world();
    create_pay_request(&w.ledger, &w.receiver, 1, 1_000).unwrap();
    settle_payment(&w.ledger, &w.receiver, 1, &w.receiver, 1_000).unwrap();
    sweep_funds(&w.ledger, &w.receiver, 1, &w.receiver).unwrap();
}

#[test]
fn request_ids_are_scoped_per_receiver() {
    let w = world();
    let other = Keypair::generate().address();
    w.ledger.genesis_credit(&other, START).unwrap();
    create_pay_request(&w.ledger, &w.receiver, 1, 1_000).unwrap();
    create_pay_request(&w.ledger, &other, 1, 2_000).unwrap();
    assert_eq!(fetch_request(&w.ledger, &other, 1).unwrap().amount, 2_000);
}

// ---------------------------------------------------------------------------
// Error Cases
// ---------------------------------------------------------------------------

#[test]
fn create_succeeds_exactly_once() {
    let w = world();
    create_pay_request(&w.ledger, &w.receiver, 5, 1_000).unwrap();
    let err = create_pay_request(&w.ledger, &w.receiver, 5, 9_999).unwrap_err();
    assert_eq!(
        err,
        PaymentRequestError::DuplicateRequest {
            receiver: w.receiver,
            request_id: 5
        }
    );
    assert_eq!(err.kind(), ErrorKind::Conflict);
    // The original survives untouched.
    assert_eq!(fetch_request(&w.ledger, &w.receiver, 5).unwrap().amount, 1_000);
}

#[test]
fn duplicate_is_rejected_even_after_settlement() {
    let w = world();
    create_pay_request(&w.ledger, &w.receiver, 5, 1_000).unwrap();
    settle_payment(&w.ledger, &w.receiver, 5, &w.payer, 1_000).unwrap();
    assert!(matches!(
        create_pay_request(&w.ledger, &w.receiver, 5, 1_000),
        Err(PaymentRequestError::DuplicateRequest { .. })
    ));
}

#[test]
fn settle_succeeds_at_most_once() {
    let w = world();
    let third = Keypair::generate().address();
    w.ledger.genesis_credit(&third, START).unwrap();
    create_pay_request(&w.ledger, &w.receiver, 2, 1_000).unwrap();
    settle_payment(&w.ledger, &w.receiver, 2, &w.payer, 1_000).unwrap();

    for payer in [w.payer, third, w.receiver] {
        assert_eq!(
            settle_payment(&w.ledger, &w.receiver, 2, &payer, 1_000),
            Err(PaymentRequestError::AlreadySettled { request_id: 2 })
        );
    }
    let escrow = escrow_address(&w.receiver, 2).unwrap();
    assert_eq!(w.ledger.balance(&escrow).unwrap(), 1_000);
}

#[test]
fn settle_unknown_request_is_not_found() {
    let w = world();
    let err = settle_payment(&w.ledger, &w.receiver, 77, &w.payer, 1_000).unwrap_err();
    assert!(matches!(err, PaymentRequestError::RequestNotFound { .. }));
    assert!(err.is_not_found());
}

#[test]
fn payer_without_funds_is_refused_cleanly() {
    let w = world();
    let broke = Keypair::generate().address();
    w.ledger.genesis_credit(&broke, 500).unwrap();
    create_pay_request(&w.ledger, &w.receiver, 3, 1_000).unwrap();

    let err = settle_payment(&w.ledger, &w.receiver, 3, &broke, 1_000).unwrap_err();
    assert!(matches!(err, PaymentRequestError::InsufficientFunds { .. }));
    assert_eq!(w.ledger.balance(&broke).unwrap(), 500);
    assert!(!fetch_request(&w.ledger, &w.receiver, 3).unwrap().is_settled);
}

#[test]
fn receiver_without_deposit_cannot_create() {
    let w = world();
    let broke = Keypair::generate().address();
    w.ledger.genesis_credit(&broke, 1).unwrap();
    assert!(matches!(
        create_pay_request(&w.ledger, &broke, 1, 1_000),
        Err(PaymentRequestError::InsufficientFunds { .. })
    ));
    assert!(fetch_request(&w.ledger, &broke, 1).unwrap_err().is_not_found());
}

#[test]
fn sweep_by_stranger_is_unauthorized() {
    let w = world();
    create_pay_request(&w.ledger, &w.receiver, 4, 1_000).unwrap();
    settle_payment(&w.ledger, &w.receiver, 4, &w.payer, 1_000).unwrap();

    let err = sweep_funds(&w.ledger, &w.receiver, 4, &w.payer).unwrap_err();
    assert_eq!(
        err,
        PaymentRequestError::UnauthorizedReceiver {
            caller: w.payer,
            receiver: w.receiver
        }
    );
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(
        w.ledger
            .balance(&escrow_address(&w.receiver, 4).unwrap())
            .unwrap(),
        1_000
    );
}

#[test]
fn outside_deposit_cannot_block_the_sweep() {
    let w = world();
    let griefer = Keypair::generate().address();
    w.ledger.genesis_credit(&griefer, START).unwrap();
    create_pay_request(&w.ledger, &w.receiver, 12345, 1_000).unwrap();
    let settled = settle_payment(&w.ledger, &w.receiver, 12345, &w.payer, 1_000).unwrap();

    let donation = w
        .ledger
        .transact(|tx| tx.transfer(&griefer, &griefer, &settled.escrow, 1));
    assert_eq!(
        donation,
        Err(LedgerError::Unauthorized {
            address: settled.escrow,
            authority: griefer
        })
    );
    assert_eq!(w.ledger.balance(&settled.escrow).unwrap(), 1_000);
    assert_eq!(w.ledger.balance(&griefer).unwrap(), START);

    let swept = sweep_funds(&w.ledger, &w.receiver, 12345, &w.receiver).unwrap();
    assert_eq!(swept.amount, 1_000);
    assert_eq!(w.ledger.account(&settled.escrow).unwrap(), None);
    assert_eq!(w.ledger.account(&settled.request).unwrap(), None);
}

#[test]
fn stranger_is_unauthorized_even_before_settlement() {
    let w = world();
    create_pay_request(&w.ledger, &w.receiver, 4, 1_000).unwrap();
    assert!(matches!(
        sweep_funds(&w.ledger, &w.receiver, 4, &w.payer),
        Err(PaymentRequestError::UnauthorizedReceiver { .. })
    ));
}

#[test]
fn sweep_before_settlement_is_not_found_class() {
    let w = world();
    create_pay_request(&w.ledger, &w.receiver, 6, 1_000).unwrap();
    let err = sweep_funds(&w.ledger, &w.receiver, 6, &w.receiver).unwrap_err();
    assert_eq!(err, PaymentRequestError::NotSettled { request_id: 6 });
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn second_sweep_finds_nothing() {
    let w = world();
    create_pay_request(&w.ledger, &w.receiver, 8, 1_000).unwrap();
    settle_payment(&w.ledger, &w.receiver, 8, &w.payer, 1_000).unwrap();
    sweep_funds(&w.ledger, &w.receiver, 8, &w.receiver).unwrap();

    let err = sweep_funds(&w.ledger, &w.receiver, 8, &w.receiver).unwrap_err();
    assert_eq!(
        err,
        PaymentRequestError::RequestNotFound {
            address: request_address(&w.receiver, 8).unwrap()
        }
    );
    // Settling a swept request is just as gone.
    assert!(settle_payment(&w.ledger, &w.receiver, 8, &w.payer, 1_000)
        .unwrap_err()
        .is_not_found());
}

#[test]
fn swept_id_can_be_reused() {
    let w = world();
    create_pay_request(&w.ledger, &w.receiver, 9, 1_000).unwrap();
    settle_payment(&w.ledger, &w.receiver, 9, &w.payer, 1_000).unwrap();
    sweep_funds(&w.ledger, &w.receiver, 9, &w.receiver).unwrap();
    create_pay_request(&w.ledger, &w.receiver, 9, 3_000).unwrap();
    assert_eq!(fetch_request(&w.ledger, &w.receiver, 9).unwrap().amount, 3_000);
}

#[test]
fn failed_operations_commit_nothing() {
    let w = world();
    create_pay_request(&w.ledger, &w.receiver, 10, 1_000).unwrap();
    let slot = w.ledger.clock().unwrap().slot;
    let receiver_balance = w.ledger.balance(&w.receiver).unwrap();
    let payer_balance = w.ledger.balance(&w.payer).unwrap();

    let _ = settle_payment(&w.ledger, &w.receiver, 10, &w.payer, 999);
    let _ = sweep_funds(&w.ledger, &w.receiver, 10, &w.receiver);
    let _ = sweep_funds(&w.ledger, &w.receiver, 10, &w.payer);
    let _ = create_pay_request(&w.ledger, &w.receiver, 10, 1_000);

    assert_eq!(w.ledger.clock().unwrap().slot, slot);
    assert_eq!(w.ledger.balance(&w.receiver).unwrap(), receiver_balance);
    assert_eq!(w.ledger.balance(&w.payer).unwrap(), payer_balance);
}
