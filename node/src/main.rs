// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # PAYLINK Operator
//!
//! Entry point for the `paylink` binary. Parses CLI arguments, initializes
//! logging, opens the sled ledger in the data directory and runs one
//! escrow operation per invocation.
//!
//! - `init`, `keygen`, `balance`                 — ledger and identity housekeeping
//! - `create`, `settle`, `sweep`                 — plain payment requests
//! - `zk-create`, `zk-settle`, `zk-sweep`        — private payment requests
//! - `derive`, `show`                            — lookups
//! - `demo`                                      — both scenarios on a throwaway ledger
//! - `version`                                   — build information

mod cli;
mod logging;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use paylink_contracts::payment_request;
use paylink_contracts::{
    PayRequest, RequestAccount, ZkPayRequest, ZkPaymentRequests, ZkRequestParams,
};
use paylink_protocol::config::{format_native_amount, parse_native_amount, ProtocolConfig};
use paylink_protocol::crypto::{Address, Keypair};
use paylink_protocol::ledger::{AccountStore, Ledger, MemoryStore, SledStore};
use paylink_protocol::zkp::{CommitmentScheme, PedersenBinding, PrivateRequestDraft};
use serde::Serialize;
use serde_json::{json, Value};

use cli::{Commands, LookupArgs, PaylinkCli, SchemeKind};

const CONFIG_FILE: &str = "config.json";
const LEDGER_DIR: &str = "ledger";

fn main() -> Result<()> {
    let cli = PaylinkCli::parse();
    logging::init_logging(&cli.log_level, cli.log_format)?;
    let data_dir = cli.data_dir;

    match cli.command {
        Commands::Init(args) => init(&data_dir, &open_store(&data_dir)?, args),
        Commands::Keygen => keygen(),
        Commands::Derive(args) => derive(args),
        Commands::Balance(args) => {
            let ledger = open_ledger(&data_dir)?;
            let balance = ledger.balance(&args.address)?;
            emit(&json!({
                "address": args.address,
                "photons": balance,
                "native": format_native_amount(balance),
            }))
        }
        Commands::Create(args) => {
            let ledger = open_ledger(&data_dir)?;
            let r = &args.request;
            emit(&payment_request::create_pay_request(
                &ledger,
                &r.receiver,
                r.request_id,
                args.amount,
            )?)
        }
        Commands::Settle(args) => {
            let ledger = open_ledger(&data_dir)?;
            let r = &args.request;
            emit(&payment_request::settle_payment(
                &ledger,
                &r.receiver,
                r.request_id,
                &args.payer,
                args.amount,
            )?)
        }
        Commands::Sweep(args) => {
            let ledger = open_ledger(&data_dir)?;
            let r = &args.request;
            let caller = args.caller.unwrap_or(r.receiver);
            emit(&payment_request::sweep_funds(
                &ledger,
                &r.receiver,
                r.request_id,
                &caller,
            )?)
        }
        Commands::ZkCreate(args) => {
            let ledger = open_ledger(&data_dir)?;
            match args.scheme {
                SchemeKind::Hash => zk_create(&ZkPaymentRequests::new(), &ledger, args),
                SchemeKind::Pedersen => zk_create(
                    &ZkPaymentRequests::with_scheme(PedersenBinding::new()),
                    &ledger,
                    args,
                ),
            }
        }
        Commands::ZkSettle(args) => {
            let ledger = open_ledger(&data_dir)?;
            let r = &args.request;
            let receipt = match args.scheme {
                SchemeKind::Hash => ZkPaymentRequests::new().settle_zk_payment(
                    &ledger,
                    &r.receiver,
                    r.request_id,
                    &args.payer,
                    args.amount,
                    &args.proof,
                )?,
                SchemeKind::Pedersen => ZkPaymentRequests::with_scheme(PedersenBinding::new())
                    .settle_zk_payment(
                        &ledger,
                        &r.receiver,
                        r.request_id,
                        &args.payer,
                        args.amount,
                        &args.proof,
                    )?,
            };
            emit(&receipt)
        }
        Commands::ZkSweep(args) => {
            let ledger = open_ledger(&data_dir)?;
            let r = &args.request;
            let caller = args.caller.unwrap_or(r.receiver);
            let receipt = match args.scheme {
                SchemeKind::Hash => ZkPaymentRequests::new().sweep_zk_funds(
                    &ledger,
                    &r.receiver,
                    r.request_id,
                    &caller,
                    &args.receiver_proof,
                    &args.ephemeral_secret,
                )?,
                SchemeKind::Pedersen => ZkPaymentRequests::with_scheme(PedersenBinding::new())
                    .sweep_zk_funds(
                        &ledger,
                        &r.receiver,
                        r.request_id,
                        &caller,
                        &args.receiver_proof,
                        &args.ephemeral_secret,
                    )?,
            };
            emit(&receipt)
        }
        Commands::Show(args) => show(&open_ledger(&data_dir)?, args),
        Commands::Demo => demo(),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger access
// ---------------------------------------------------------------------------

fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

fn load_config(data_dir: &Path) -> Result<ProtocolConfig> {
    let path = config_path(data_dir);
    ProtocolConfig::load(&path).with_context(|| {
        format!(
            "failed to load {} (run `paylink init` first)",
            path.display()
        )
    })
}

fn open_store(data_dir: &Path) -> Result<SledStore> {
    let db_path = data_dir.join(LEDGER_DIR);
    let store = SledStore::open(&db_path)
        .with_context(|| format!("failed to open ledger at {}", db_path.display()))?;
    tracing::debug!(path = %db_path.display(), "ledger opened");
    Ok(store)
}

/// Open the sled ledger under `data_dir` with the config stored next to it.
fn open_ledger(data_dir: &Path) -> Result<Ledger<SledStore>> {
    let config = load_config(data_dir)?;
    Ok(Ledger::new(open_store(data_dir)?, config))
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn init(data_dir: &Path, store: &SledStore, args: cli::InitArgs) -> Result<()> {
    let path = config_path(data_dir);
    if path.exists() && !args.force {
        bail!(
            "{} already initialized (pass --force to rewrite the config)",
            data_dir.display()
        );
    }
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let mut config = ProtocolConfig::default();
    if let Some(fee) = args.transaction_fee {
        config.transaction_fee = fee;
    }
    if let Some(price) = args.photons_per_byte {
        config.photons_per_byte = price;
    }
    config.validate()?;
    config
        .save(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;

    let ledger = Ledger::new(store.clone(), config.clone());
    let mut allocations = Vec::with_capacity(args.genesis.len());
    for alloc in &args.genesis {
        let balance = ledger.genesis_credit(&alloc.address, alloc.photons)?;
        allocations.push(json!({ "address": alloc.address, "balance": balance }));
    }
    tracing::info!(
        data_dir = %data_dir.display(),
        allocations = allocations.len(),
        "data directory initialized"
    );

    emit(&json!({
        "data_dir": data_dir.display().to_string(),
        "config": config,
        "genesis": allocations,
    }))
}

fn keygen() -> Result<()> {
    let keypair = Keypair::generate();
    emit(&json!({
        "address": keypair.address(),
        "secret_key": hex::encode(keypair.secret_key_bytes()),
    }))
}

fn derive(args: LookupArgs) -> Result<()> {
    let r = &args.request;
    let (program_id, request, escrow) = if args.private {
        match args.scheme {
            SchemeKind::Hash => zk_addresses(&ZkPaymentRequests::new(), r)?,
            SchemeKind::Pedersen => {
                zk_addresses(&ZkPaymentRequests::with_scheme(PedersenBinding::new()), r)?
            }
        }
    } else {
        let program = payment_request::program();
        (
            *program.program_id(),
            program.request_address(&r.receiver, r.request_id)?,
            program.escrow_address(&r.receiver, r.request_id)?,
        )
    };
    emit(&json!({
        "program_id": program_id,
        "request": request,
        "escrow": escrow,
    }))
}

fn zk_addresses<C: CommitmentScheme>(
    programs: &ZkPaymentRequests<C>,
    r: &cli::RequestRef,
) -> Result<(Address, Address, Address)> {
    Ok((
        *programs.program_id(),
        programs.request_address(&r.receiver, r.request_id)?,
        programs.escrow_address(&r.receiver, r.request_id)?,
    ))
}

fn zk_create<C: CommitmentScheme, S: AccountStore>(
    programs: &ZkPaymentRequests<C>,
    ledger: &Ledger<S>,
    args: cli::ZkCreateArgs,
) -> Result<()> {
    let r = &args.request;
    if args.amount < args.min || args.amount > args.max {
        bail!(
            "amount {} is outside [{}, {}]; no payment could ever settle it",
            args.amount,
            args.min,
            args.max
        );
    }
    let draft = PrivateRequestDraft::prepare(programs.scheme(), args.amount);
    let receipt = programs.create_zk_pay_request(
        ledger,
        &r.receiver,
        ZkRequestParams::from_draft(r.request_id, &draft, args.min, args.max),
    )?;
    emit(&json!({
        "receipt": receipt,
        "scheme": programs.scheme().name(),
        "for_payer": {
            "amount": format_native_amount(draft.amount),
            "payment_proof": hex::encode(draft.payment_proof()),
        },
        "keep_secret": {
            "ephemeral_secret": hex::encode(draft.ephemeral.secret()),
            "receiver_proof": hex::encode(draft.receiver_proof(&r.receiver, r.request_id)),
        },
    }))
}

fn plain_view(record: &PayRequest) -> Value {
    json!({
        "variant": "plain",
        "status": record.status().to_string(),
        "receiver": record.receiver,
        "request_id": record.request_id,
        "amount": record.amount,
        "settled_amount": record.settled_amount,
        "is_settled": record.is_settled,
        "is_swept": record.is_swept,
    })
}

fn private_view(record: &ZkPayRequest) -> Value {
    json!({
        "variant": "private",
        "status": record.status().to_string(),
        "receiver": record.receiver,
        "request_id": record.request_id,
        "amount_commitment": hex::encode(record.amount_commitment),
        "range_proof_len": record.range_proof.len(),
        "min_amount": record.min_amount,
        "max_amount": record.max_amount,
        "ephemeral_pubkey": hex::encode(record.ephemeral_pubkey),
        "stealth_address": record.stealth_address,
        "settled_amount": record.settled_amount,
        "settlement_commitment": hex::encode(record.settlement_commitment),
        "is_settled": record.is_settled,
        "is_swept": record.is_swept,
    })
}

fn show<S: AccountStore>(ledger: &Ledger<S>, args: LookupArgs) -> Result<()> {
    let r = &args.request;
    let view = if args.private {
        let record = match args.scheme {
            SchemeKind::Hash => {
                ZkPaymentRequests::new().fetch_request(ledger, &r.receiver, r.request_id)?
            }
            SchemeKind::Pedersen => ZkPaymentRequests::with_scheme(PedersenBinding::new())
                .fetch_request(ledger, &r.receiver, r.request_id)?,
        };
        private_view(&record)
    } else {
        plain_view(&payment_request::fetch_request(
            ledger,
            &r.receiver,
            r.request_id,
        )?)
    };
    emit(&view)
}

/// Both reference scenarios, end to end, on an in-memory ledger.
fn demo() -> Result<()> {
    let ledger = Ledger::new(MemoryStore::new(), ProtocolConfig::default());
    let receiver = Keypair::generate().address();
    let payer = Keypair::generate().address();
    let start = parse_native_amount("10").context("bad demo constant")?;
    ledger.genesis_credit(&receiver, start)?;
    ledger.genesis_credit(&payer, start)?;
    let mut steps = Vec::new();

    // Plain: exact amount 0.1 under request 12345.
    let amount = parse_native_amount("0.1").context("bad demo constant")?;
    let created = payment_request::create_pay_request(&ledger, &receiver, 12345, amount)?;
    let settled = payment_request::settle_payment(&ledger, &receiver, 12345, &payer, amount)?;
    let vault_after_settle = ledger.balance(&settled.escrow)?;
    let swept = payment_request::sweep_funds(&ledger, &receiver, 12345, &receiver)?;
    steps.push(json!({
        "scenario": "plain",
        "create": created,
        "settle": settled,
        "vault_after_settle": format_native_amount(vault_after_settle),
        "sweep": swept,
        "vault_exists_after_sweep": ledger.account(&swept.escrow)?.is_some(),
    }));

    // Private: bounds [0.05, 0.2], committed amount 0.1 under request 54321.
    let programs = ZkPaymentRequests::new();
    let min = parse_native_amount("0.05").context("bad demo constant")?;
    let max = parse_native_amount("0.2").context("bad demo constant")?;
    let too_much = parse_native_amount("0.5").context("bad demo constant")?;
    let draft = PrivateRequestDraft::prepare(programs.scheme(), amount);
    let created = programs.create_zk_pay_request(
        &ledger,
        &receiver,
        ZkRequestParams::from_draft(54321, &draft, min, max),
    )?;
    let rejected = programs
        .settle_zk_payment(&ledger, &receiver, 54321, &payer, too_much, &draft.payment_proof())
        .err()
        .map(|e| e.to_string());
    let settled = programs.settle_zk_payment(
        &ledger,
        &receiver,
        54321,
        &payer,
        amount,
        &draft.payment_proof(),
    )?;
    let settled_amount = programs
        .fetch_request(&ledger, &receiver, 54321)?
        .settled_amount;
    let swept = programs.sweep_zk_funds(
        &ledger,
        &receiver,
        54321,
        &receiver,
        &draft.receiver_proof(&receiver, 54321),
        &draft.ephemeral.secret(),
    )?;
    steps.push(json!({
        "scenario": "private",
        "create": created,
        "settle_0.5_rejected": rejected,
        "settle": settled,
        "settled_amount": format_native_amount(settled_amount),
        "sweep": swept,
    }));

    emit(&json!({
        "receiver": receiver,
        "payer": payer,
        "receiver_final": format_native_amount(ledger.balance(&receiver)?),
        "payer_final": format_native_amount(ledger.balance(&payer)?),
        "steps": steps,
    }))
}

/// Prints version information to stdout.
fn print_version() {
    println!("paylink {}", env!("CARGO_PKG_VERSION"));
    println!("rustc   {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
