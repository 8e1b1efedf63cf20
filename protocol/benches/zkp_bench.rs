// Benchmarks for the primitives on the settlement and sweep hot paths.
//
// Covers both commitment schemes, the payment and ownership verifiers, and
// program address derivation, which runs twice per request operation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use paylink_protocol::config::{ESCROW_TAG, PAY_REQUEST_TAG};
use paylink_protocol::crypto::Keypair;
use paylink_protocol::derivation::{program_id, request_scoped_address};
use paylink_protocol::zkp::{
    verify_ownership, verify_payment, CommitmentScheme, HashBinding, OwnershipClaim,
    PaymentStatement, PedersenBinding, PrivateRequestDraft,
};

const AMOUNT: u64 = 100_000_000;

fn bench_commit(c: &mut Criterion) {
    let range_proof = vec![7u8; 64];
    let pedersen = PedersenBinding::new();

    c.bench_function("zkp/hash_binding_commit", |b| {
        b.iter(|| HashBinding.commit(black_box(AMOUNT), &range_proof));
    });
    c.bench_function("zkp/pedersen_commit", |b| {
        b.iter(|| pedersen.commit(black_box(AMOUNT), &range_proof));
    });
}

fn bench_verify_payment<S: CommitmentScheme>(c: &mut Criterion, name: &str, scheme: &S) {
    let draft = PrivateRequestDraft::prepare(scheme, AMOUNT);
    let proof = draft.payment_proof();
    let statement = PaymentStatement {
        commitment: &draft.commitment,
        range_proof: &draft.range_proof,
        min_amount: AMOUNT / 2,
        max_amount: AMOUNT * 2,
    };

    c.bench_function(name, |b| {
        b.iter(|| verify_payment(scheme, &statement, black_box(AMOUNT), &proof))
    });
}

fn bench_verify(c: &mut Criterion) {
    bench_verify_payment(c, "zkp/verify_payment_hash", &HashBinding);
    bench_verify_payment(c, "zkp/verify_payment_pedersen", &PedersenBinding::new());

    let receiver = Keypair::generate().address();
    let draft = PrivateRequestDraft::prepare(&HashBinding, AMOUNT);
    let ephemeral_pubkey = draft.ephemeral.public();
    let stealth_address = draft.stealth_address(&receiver, 54321);
    let proof = draft.receiver_proof(&receiver, 54321);
    let secret = draft.ephemeral.secret();
    let claim = OwnershipClaim {
        receiver: &receiver,
        request_id: 54321,
        ephemeral_pubkey: &ephemeral_pubkey,
        stealth_address: &stealth_address,
    };

    c.bench_function("zkp/verify_ownership", |b| {
        b.iter(|| verify_ownership(&claim, &proof, black_box(&secret)))
    });
}

fn bench_derivation(c: &mut Criterion) {
    let program = program_id("paylink.payment_request");
    let receiver = Keypair::generate().address();
    let mut id = 0u64;

    c.bench_function("derivation/request_address", |b| {
        b.iter(|| {
            id = id.wrapping_add(1);
            request_scoped_address(PAY_REQUEST_TAG, &receiver, id, &program)
        })
    });
    c.bench_function("derivation/escrow_address", |b| {
        b.iter(|| request_scoped_address(ESCROW_TAG, &receiver, black_box(12345), &program))
    });
}

criterion_group!(benches, bench_commit, bench_verify, bench_derivation);
criterion_main!(benches);
