//! # Identities and Addresses
//!
//! Every account in PAYLINK is keyed by a 32-byte [`Address`]. Two kinds of
//! address exist and they never overlap:
//!
//! - **Identity addresses** are Ed25519 verifying keys. Someone holds the
//!   matching secret key, so they are points on the curve.
//! - **Derived addresses** come out of [`crate::derivation`] and are
//!   guaranteed *off* the curve. Nobody holds a key for them; only the
//!   owning program can move their funds.
//!
//! Transaction signing is outside this crate. Callers hand the ledger an
//! identity that the surrounding runtime has already authenticated.
//!
//! Key bytes are never logged. If you add logging to this module, log
//! addresses, not keys.

use std::fmt;
use std::str::FromStr;

use curve25519_dalek::edwards::CompressedEdwardsY;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors from parsing an address string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("address is neither 64-char hex nor base58: {0}")]
    Encoding(String),

    #[error("address must decode to 32 bytes, got {0}")]
    Length(usize),
}

/// A 32-byte account key.
///
/// Displayed as base58. Parses from base58 or from 64 hex characters.
/// Serializes as a base58 string in human-readable formats (JSON) and as
/// raw bytes otherwise (bincode).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 32]);

impl Address {
    /// The system owner. Every user wallet is owned by this address.
    pub const SYSTEM: Address = Address([0u8; 32]);

    /// Wrap raw bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Copy out the raw bytes.
    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }

    /// `true` if these bytes decompress to an Ed25519 point, i.e. a secret
    /// key could exist for this address.
    pub fn is_on_curve(&self) -> bool {
        CompressedEdwardsY(self.0).decompress().is_some()
    }

    /// Hex encoding, for logs and JSON.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = if s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit()) {
            hex::decode(s).map_err(|_| AddressParseError::Encoding(s.to_string()))?
        } else {
            bs58::decode(s)
                .into_vec()
                .map_err(|_| AddressParseError::Encoding(s.to_string()))?
        };
        if bytes.len() != 32 {
            return Err(AddressParseError::Length(bytes.len()));
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(de::Error::custom)
        } else {
            <[u8; 32]>::deserialize(deserializer).map(Self)
        }
    }
}

/// An Ed25519 identity.
///
/// Only the public half is ever used by the protocol. The secret half stays
/// here so tools can mint real, on-curve identities.
///
/// `Keypair` intentionally does NOT implement `Serialize`. Exporting key
/// material should be a deliberate act: use [`Keypair::secret_key_bytes`].
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair using the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Rebuild a keypair from its 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// The identity address: the Ed25519 verifying key bytes.
    pub fn address(&self) -> Address {
        Address(self.signing_key.verifying_key().to_bytes())
    }

    /// Exports the raw 32-byte secret seed. Handle with care.
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl Clone for Keypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret key material.
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
