//! # Protocol Configuration & Constants
//!
//! Every magic number in PAYLINK lives here. Namespace tags, proof size
//! limits, deposit parameters, the default network fee. If you're
//! hardcoding one of these somewhere else, move it here.
//!
//! Constants are consensus-critical: changing a namespace tag moves every
//! derived address, and changing the deposit formula strands refunds.
//! [`ProtocolConfig`] carries the few knobs an operator may tune.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Denomination
// ---------------------------------------------------------------------------

/// Photons per whole native unit. Nine decimals, so `0.1` of the native
/// unit is `100_000_000` photons.
pub const PHOTONS_PER_UNIT: u64 = 1_000_000_000;

/// Display precision for native amounts.
pub const NATIVE_DECIMALS: u8 = 9;

// ---------------------------------------------------------------------------
// Derivation namespace tags
// ---------------------------------------------------------------------------

/// Seed tag for plain request records.
pub const PAY_REQUEST_TAG: &[u8] = b"pay_request";

/// Seed tag for plain escrow vaults.
pub const ESCROW_TAG: &[u8] = b"escrow";

/// Seed tag for private request records. Distinct from the plain tag so the
/// two variants can never derive the same address.
pub const ZK_PAY_REQUEST_TAG: &[u8] = b"zk_pay_request";

/// Seed tag for private escrow vaults.
pub const ZK_ESCROW_TAG: &[u8] = b"zk_escrow";

/// Marker appended to every derivation preimage.
pub const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Maximum number of seeds accepted by address derivation.
pub const MAX_SEEDS: usize = 16;

/// Maximum length of a single seed in bytes.
pub const MAX_SEED_LEN: usize = 32;

// ---------------------------------------------------------------------------
// Proof material
// ---------------------------------------------------------------------------

/// Smallest range proof accepted at request creation.
pub const MIN_RANGE_PROOF_LEN: usize = 64;

/// Largest range proof accepted at request creation. Records reserve this
/// much so they never need reallocation.
pub const MAX_RANGE_PROOF_LEN: usize = 512;

/// Length of a payment proof and of a receiver-ownership proof.
pub const PROOF_LEN: usize = 32;

/// Domain label mixed into every hash-based amount commitment.
pub const PAYMENT_BINDING_LABEL: &[u8] = b"bulletproof_payment";

/// BLAKE3 context for payment proofs.
pub const SETTLEMENT_PROOF_CONTEXT: &str = "paylink 2026-01 settlement proof";

/// BLAKE3 context for receiver-ownership proofs.
pub const RECEIVER_PROOF_CONTEXT: &str = "paylink 2026-01 receiver ownership";

/// BLAKE3 context for stealth-address derivation.
pub const STEALTH_ADDRESS_CONTEXT: &str = "paylink 2026-01 stealth address";

/// BLAKE3 context for program identifiers.
pub const PROGRAM_ID_CONTEXT: &str = "paylink 2026-01 program id";

/// Label the Pedersen generator `H` is hashed from.
pub const PEDERSEN_H_LABEL: &[u8] = b"paylink pedersen generator H";

/// Label the Pedersen blinding factor is hashed with.
pub const PEDERSEN_BLINDING_LABEL: &[u8] = b"paylink pedersen blinding";

// ---------------------------------------------------------------------------
// Storage deposits and fees
// ---------------------------------------------------------------------------

/// Bytes of bookkeeping charged on top of every account's data.
pub const ACCOUNT_STORAGE_OVERHEAD: u64 = 128;

/// Default storage price per byte.
pub const DEFAULT_PHOTONS_PER_BYTE: u64 = 3_480;

/// Deposits cover this many storage periods up front.
pub const DEPOSIT_EXEMPTION_FACTOR: u64 = 2;

/// Default flat fee charged to the invoking identity for every transition.
pub const DEFAULT_TRANSACTION_FEE: u64 = 5_000;

/// Size of the type discriminator prefixed to every program account.
pub const DISCRIMINATOR_LEN: usize = 8;

// ---------------------------------------------------------------------------
// ProtocolConfig
// ---------------------------------------------------------------------------

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Operator-tunable protocol parameters.
///
/// Serialized as JSON in the node's data directory. Missing fields fall
/// back to the defaults above.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Flat fee charged to the signer of every committed transition.
    pub transaction_fee: u64,
    /// Storage price per byte, used to compute account deposits.
    pub photons_per_byte: u64,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            transaction_fee: DEFAULT_TRANSACTION_FEE,
            photons_per_byte: DEFAULT_PHOTONS_PER_BYTE,
        }
    }
}

impl ProtocolConfig {
    /// A zero-fee configuration. Handy in tests where fee arithmetic would
    /// only obscure the balance under test.
    pub fn feeless() -> Self {
        Self {
            transaction_fee: 0,
            ..Default::default()
        }
    }

    /// Deposit required to keep an account with `data_len` bytes of data.
    ///
    /// ```text
    /// deposit = (ACCOUNT_STORAGE_OVERHEAD + data_len) * photons_per_byte * DEPOSIT_EXEMPTION_FACTOR
    /// ```
    ///
    /// Saturates rather than wrapping; an absurd deposit simply fails the
    /// payer's balance check.
    pub fn deposit_for(&self, data_len: usize) -> u64 {
        (ACCOUNT_STORAGE_OVERHEAD.saturating_add(data_len as u64))
            .saturating_mul(self.photons_per_byte)
            .saturating_mul(DEPOSIT_EXEMPTION_FACTOR)
    }

    /// Reject configurations that would make the protocol unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.photons_per_byte == 0 {
            return Err(ConfigError::Invalid(
                "photons_per_byte must be non-zero".into(),
            ));
        }
        if self.transaction_fee >= PHOTONS_PER_UNIT {
            return Err(ConfigError::Invalid(format!(
                "transaction_fee {} exceeds one native unit",
                self.transaction_fee
            )));
        }
        Ok(())
    }

    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Convert a decimal native amount ("0.1", "12", "0.000000001") into photons.
///
/// Returns `None` for malformed input, more than nine decimals, or overflow.
/// No floating point anywhere near money.
pub fn parse_native_amount(s: &str) -> Option<u64> {
    let s = s.trim();
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if frac.len() > NATIVE_DECIMALS as usize {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut frac_padded = frac.to_string();
    while frac_padded.len() < NATIVE_DECIMALS as usize {
        frac_padded.push('0');
    }
    let frac: u64 = frac_padded.parse().ok()?;

    whole.checked_mul(PHOTONS_PER_UNIT)?.checked_add(frac)
}

/// Format photons as a decimal native amount, trimming trailing zeros.
pub fn format_native_amount(photons: u64) -> String {
    let whole = photons / PHOTONS_PER_UNIT;
    let frac = photons % PHOTONS_PER_UNIT;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:09}", frac);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}
