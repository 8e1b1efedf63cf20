//! # CLI Interface
//!
//! Command-line structure for the `paylink` binary, via `clap` derive.
//! Every command reads and writes the sled ledger under `--data-dir`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use paylink_protocol::config::parse_native_amount;
use paylink_protocol::crypto::Address;

use crate::logging::LogFormat;

/// PAYLINK local operator.
///
/// Drives plain and private payment requests against a persistent local
/// ledger. Results are printed to stdout as JSON; logs go to stderr.
#[derive(Parser, Debug)]
#[command(
    name = "paylink",
    about = "PAYLINK payment-request escrow, local operator",
    version,
    propagate_version = true
)]
pub struct PaylinkCli {
    /// Directory holding `config.json` and the ledger database.
    #[arg(long, short = 'd', env = "PAYLINK_DATA_DIR", default_value = ".paylink", global = true)]
    pub data_dir: PathBuf,

    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, env = "PAYLINK_LOG", default_value = "info", global = true)]
    pub log_level: String,

    /// Log output format.
    #[arg(long, value_enum, env = "PAYLINK_LOG_FORMAT", default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory, write the config and mint genesis balances.
    Init(InitArgs),
    /// Generate a fresh Ed25519 identity.
    Keygen,
    /// Print the record and escrow addresses for a request.
    Derive(LookupArgs),
    /// Print the balance of an address.
    Balance(BalanceArgs),
    /// Publish a plain payment request for an exact amount.
    Create(CreateArgs),
    /// Settle a plain payment request.
    Settle(SettleArgs),
    /// Sweep a settled plain request to its receiver.
    Sweep(SweepArgs),
    /// Publish a private payment request; prints the secrets to hand out.
    ZkCreate(ZkCreateArgs),
    /// Settle a private payment request with a payment proof.
    ZkSettle(ZkSettleArgs),
    /// Sweep a private request by revealing the ephemeral secret.
    ZkSweep(ZkSweepArgs),
    /// Print a stored request record.
    Show(LookupArgs),
    /// Run both end-to-end scenarios on a throwaway in-memory ledger.
    Demo,
    /// Print version information and exit.
    Version,
}

/// Commitment primitive of the private program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemeKind {
    /// SHA-256 binding.
    Hash,
    /// Pedersen commitment on Ristretto255.
    Pedersen,
}

/// A genesis allocation, `ADDRESS=PHOTONS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisAlloc {
    pub address: Address,
    pub photons: u64,
}

fn parse_genesis(s: &str) -> Result<GenesisAlloc, String> {
    let (address, photons) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ADDRESS=PHOTONS, got {s:?}"))?;
    Ok(GenesisAlloc {
        address: address.parse().map_err(|e| format!("{e}"))?,
        photons: photons
            .parse()
            .map_err(|e| format!("bad photon amount {photons:?}: {e}"))?,
    })
}

fn parse_amount(s: &str) -> Result<u64, String> {
    parse_native_amount(s).ok_or_else(|| format!("not a native amount with at most 9 decimals: {s:?}"))
}

fn parse_hex32(s: &str) -> Result<[u8; 32], String> {
    let bytes = hex::decode(s.trim_start_matches("0x")).map_err(|e| e.to_string())?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| format!("expected 32 bytes, got {}", b.len()))
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Genesis allocation, repeatable: `--genesis ADDRESS=PHOTONS`.
    #[arg(long = "genesis", value_parser = parse_genesis)]
    pub genesis: Vec<GenesisAlloc>,

    /// Override the flat per-transition fee (photons).
    #[arg(long)]
    pub transaction_fee: Option<u64>,

    /// Override the storage price per byte (photons).
    #[arg(long)]
    pub photons_per_byte: Option<u64>,

    /// Rewrite `config.json` if the directory is already initialized.
    #[arg(long)]
    pub force: bool,
}

/// Identifies one request.
#[derive(Args, Debug, Clone)]
pub struct RequestRef {
    /// Receiver identity the request was derived from.
    #[arg(long)]
    pub receiver: Address,

    #[arg(long)]
    pub request_id: u64,
}

#[derive(Args, Debug)]
pub struct LookupArgs {
    #[command(flatten)]
    pub request: RequestRef,

    /// Look up the private variant instead of the plain one.
    #[arg(long)]
    pub private: bool,

    #[arg(long, value_enum, default_value_t = SchemeKind::Hash)]
    pub scheme: SchemeKind,
}

#[derive(Args, Debug)]
pub struct BalanceArgs {
    pub address: Address,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[command(flatten)]
    pub request: RequestRef,

    /// Exact amount, in native units (e.g. `0.1`).
    #[arg(long, value_parser = parse_amount)]
    pub amount: u64,
}

#[derive(Args, Debug)]
pub struct SettleArgs {
    #[command(flatten)]
    pub request: RequestRef,

    #[arg(long)]
    pub payer: Address,

    #[arg(long, value_parser = parse_amount)]
    pub amount: u64,
}

#[derive(Args, Debug)]
pub struct SweepArgs {
    #[command(flatten)]
    pub request: RequestRef,

    /// Identity invoking the sweep. Defaults to the receiver.
    #[arg(long)]
    pub caller: Option<Address>,
}

#[derive(Args, Debug)]
pub struct ZkCreateArgs {
    #[command(flatten)]
    pub request: RequestRef,

    /// Amount committed to, in native units. Never stored on the ledger.
    #[arg(long, value_parser = parse_amount)]
    pub amount: u64,

    #[arg(long, value_parser = parse_amount)]
    pub min: u64,

    #[arg(long, value_parser = parse_amount)]
    pub max: u64,

    #[arg(long, value_enum, default_value_t = SchemeKind::Hash)]
    pub scheme: SchemeKind,
}

#[derive(Args, Debug)]
pub struct ZkSettleArgs {
    #[command(flatten)]
    pub request: RequestRef,

    #[arg(long)]
    pub payer: Address,

    /// Claimed amount, in native units.
    #[arg(long, value_parser = parse_amount)]
    pub amount: u64,

    /// Hex payment proof handed out by the receiver.
    #[arg(long, value_parser = parse_hex32)]
    pub proof: [u8; 32],

    #[arg(long, value_enum, default_value_t = SchemeKind::Hash)]
    pub scheme: SchemeKind,
}

#[derive(Args, Debug)]
pub struct ZkSweepArgs {
    #[command(flatten)]
    pub request: RequestRef,

    /// Identity invoking the sweep. Defaults to the receiver.
    #[arg(long)]
    pub caller: Option<Address>,

    /// Hex receiver proof printed by `zk-create`.
    #[arg(long, value_parser = parse_hex32)]
    pub receiver_proof: [u8; 32],

    /// Hex ephemeral secret printed by `zk-create`.
    #[arg(long, value_parser = parse_hex32)]
    pub ephemeral_secret: [u8; 32],

    #[arg(long, value_enum, default_value_t = SchemeKind::Hash)]
    pub scheme: SchemeKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        PaylinkCli::command().debug_assert();
    }

    #[test]
    fn parses_amounts_and_genesis() {
        let addr = Address::new([0xab; 32]);
        let cli = PaylinkCli::try_parse_from([
            "paylink",
            "init",
            "--genesis",
            &format!("{}=5000", addr),
            "--genesis",
            &format!("{}=7", addr.to_hex()),
        ])
        .unwrap();
        match cli.command {
            Commands::Init(args) => {
                assert_eq!(args.genesis.len(), 2);
                assert_eq!(args.genesis[0].address, addr);
                assert_eq!(args.genesis[1].photons, 7);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = PaylinkCli::try_parse_from([
            "paylink",
            "create",
            "--receiver",
            &addr.to_string(),
            "--request-id",
            "12345",
            "--amount",
            "0.1",
        ])
        .unwrap();
        match cli.command {
            Commands::Create(args) => assert_eq!(args.amount, 100_000_000),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_genesis("nope").is_err());
        assert!(parse_amount("0.0000000001").is_err());
        assert!(parse_hex32("abcd").is_err());
        assert_eq!(parse_hex32(&"11".repeat(32)).unwrap(), [0x11u8; 32]);
    }
}
