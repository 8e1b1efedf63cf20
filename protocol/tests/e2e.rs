//! End-to-end tests for the protocol primitives composed by hand.
//!
//! No escrow program here: each test plays the program itself, deriving the
//! escrow, checking proofs, and moving funds through [`Ledger::transact`].
//! If these compose, the contracts crate only has to add bookkeeping.

use paylink_protocol::config::{ProtocolConfig, ESCROW_TAG, ZK_ESCROW_TAG};
use paylink_protocol::crypto::{Address, Keypair};
use paylink_protocol::derivation::{program_id, request_scoped_address};
use paylink_protocol::ledger::{Ledger, LedgerError, MemoryStore, SledStore};
use paylink_protocol::zkp::{
    verify_ownership, verify_payment, HashBinding, OwnershipClaim, PaymentStatement,
    PedersenBinding, PrivateRequestDraft, VerificationError,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn funded<S: paylink_protocol::ledger::AccountStore>(ledger: &Ledger<S>, amount: u64) -> Address {
    let address = Keypair::generate().address();
    ledger.genesis_credit(&address, amount).unwrap();
    address
}

/// Payer moves `amount` into a fresh escrow owned by `program`.
fn pay_into<S: paylink_protocol::ledger::AccountStore>(
    ledger: &Ledger<S>,
    payer: &Address,
    escrow: &Address,
    program: &Address,
    amount: u64,
) -> Result<(), LedgerError> {
    ledger.transact(|tx| {
        tx.create_account(payer, escrow, program, amount, Vec::new())?;
        tx.charge_fee(payer)?;
        Ok(())
    })
}

/// Reopen the sled database at `path`.
///
/// sled releases its file lock from a background thread after the last
/// handle drops, so an immediate reopen in the same process can briefly
/// see `WouldBlock`. Wait for the lock instead of failing.
fn reopen_store(path: &std::path::Path) -> SledStore {
    let mut attempts = 0;
    loop {
        match SledStore::open(path) {
            Ok(store) => return store,
            Err(_) if attempts < 200 => {
                attempts += 1;
                std::thread::sleep(std::time::Duration::from_millis(25));
            }
            Err(e) => panic!("ledger at {} stayed locked: {e}", path.display()),
        }
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn escrow_round_trip_conserves_supply_minus_fees() {
    let ledger = Ledger::new(SledStore::open_temporary().unwrap(), ProtocolConfig::default());
    let fee = ledger.config().transaction_fee;
    let program = program_id("e2e.escrow");
    let payer = funded(&ledger, 1_000_000_000);
    let receiver = funded(&ledger, 1_000_000_000);
    let supply = ledger.total_supply().unwrap();

    let (escrow, _) = request_scoped_address(ESCROW_TAG, &receiver, 12345, &program).unwrap();
    pay_into(&ledger, &payer, &escrow, &program, 100_000_000).unwrap();
    assert_eq!(ledger.balance(&escrow).unwrap(), 100_000_000);

    let moved = ledger
        .transact(|tx| {
            let moved = tx.close_account(&program, &escrow, &receiver)?;
            tx.charge_fee(&receiver)?;
            Ok::<_, LedgerError>(moved)
        })
        .unwrap();

    assert_eq!(moved, 100_000_000);
    assert_eq!(ledger.account(&escrow).unwrap(), None);
    assert_eq!(
        ledger.balance(&receiver).unwrap(),
        1_000_000_000 + 100_000_000 - fee
    );
    assert_eq!(
        ledger.balance(&payer).unwrap(),
        1_000_000_000 - 100_000_000 - fee
    );
    assert_eq!(ledger.total_supply().unwrap(), supply - 2 * u128::from(fee));
}

#[test]
fn second_payment_into_same_escrow_is_refused() {
    let ledger = Ledger::new(MemoryStore::new(), ProtocolConfig::feeless());
    let program = program_id("e2e.escrow");
    let payer = funded(&ledger, 500);
    let receiver = Keypair::generate().address();
    let (escrow, _) = request_scoped_address(ESCROW_TAG, &receiver, 1, &program).unwrap();

    pay_into(&ledger, &payer, &escrow, &program, 200).unwrap();
    assert_eq!(
        pay_into(&ledger, &payer, &escrow, &program, 200),
        Err(LedgerError::AccountExists(escrow))
    );
    assert_eq!(ledger.balance(&payer).unwrap(), 300);
}

#[test]
fn private_flow_gates_money_on_both_verifiers() {
    let ledger = Ledger::new(MemoryStore::new(), ProtocolConfig::default());
    let program = program_id("e2e.private");
    let scheme = PedersenBinding::new();
    let payer = funded(&ledger, 1_000_000_000);
    let receiver = funded(&ledger, 1_000_000_000);

    // Receiver side: commit to 0.1 with bounds [0.05, 0.2].
    let draft = PrivateRequestDraft::prepare(&scheme, 100_000_000);
    let stealth = draft.stealth_address(&receiver, 54321);
    let statement = PaymentStatement {
        commitment: &draft.commitment,
        range_proof: &draft.range_proof,
        min_amount: 50_000_000,
        max_amount: 200_000_000,
    };

    // Payer side: 0.5 is out of bounds no matter what proof accompanies it.
    let err = verify_payment(&scheme, &statement, 500_000_000, &draft.payment_proof()).unwrap_err();
    assert!(err.is_range_violation());
    // An in-bounds amount that is not the committed one fails the binding.
    assert_eq!(
        verify_payment(&scheme, &statement, 150_000_000, &draft.payment_proof()),
        Err(VerificationError::CommitmentMismatch)
    );
    verify_payment(&scheme, &statement, 100_000_000, &draft.payment_proof()).unwrap();

    let (escrow, _) = request_scoped_address(ZK_ESCROW_TAG, &receiver, 54321, &program).unwrap();
    pay_into(&ledger, &payer, &escrow, &program, 100_000_000).unwrap();

    // Sweep: a stranger's ephemeral secret does not open the claim.
    let ephemeral_pubkey = draft.ephemeral.public();
    let claim = OwnershipClaim {
        receiver: &receiver,
        request_id: 54321,
        ephemeral_pubkey: &ephemeral_pubkey,
        stealth_address: &stealth,
    };
    let proof = draft.receiver_proof(&receiver, 54321);
    assert_eq!(
        verify_ownership(&claim, &proof, &[9u8; 32]),
        Err(VerificationError::EphemeralKeyMismatch)
    );
    verify_ownership(&claim, &proof, &draft.ephemeral.secret()).unwrap();

    let moved = ledger
        .transact(|tx| tx.close_account(&program, &escrow, &receiver))
        .unwrap();
    assert_eq!(moved, 100_000_000);
    assert_eq!(ledger.account(&escrow).unwrap(), None);
}

#[test]
fn hash_binding_commitments_do_not_verify_under_pedersen() {
    let draft = PrivateRequestDraft::prepare(&HashBinding, 42);
    let statement = PaymentStatement {
        commitment: &draft.commitment,
        range_proof: &draft.range_proof,
        min_amount: 1,
        max_amount: 100,
    };
    verify_payment(&HashBinding, &statement, 42, &draft.payment_proof()).unwrap();
    assert_eq!(
        verify_payment(&PedersenBinding::new(), &statement, 42, &draft.payment_proof()),
        Err(VerificationError::CommitmentMismatch)
    );
}

#[test]
fn ledger_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let program = program_id("e2e.escrow");
    let receiver = Keypair::generate().address();
    let (escrow, _) = request_scoped_address(ESCROW_TAG, &receiver, 7, &program).unwrap();
    let (payer, slot) = {
        let ledger = Ledger::new(SledStore::open(dir.path()).unwrap(), ProtocolConfig::feeless());
        let payer = funded(&ledger, 1_000);
        pay_into(&ledger, &payer, &escrow, &program, 250).unwrap();
        ledger.store().flush().unwrap();
        (payer, ledger.clock().unwrap().slot)
    };

    let ledger = Ledger::new(reopen_store(dir.path()), ProtocolConfig::feeless());
    assert_eq!(ledger.balance(&payer).unwrap(), 750);
    assert_eq!(ledger.balance(&escrow).unwrap(), 250);
    assert_eq!(ledger.account(&escrow).unwrap().unwrap().owner, program);
    assert_eq!(ledger.clock().unwrap().slot, slot);
}
