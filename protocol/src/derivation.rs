//! # Program-Derived Addresses
//!
//! Request records and escrow vaults live at addresses computed from public
//! data alone: a namespace tag, the receiver, and the request id. A payer
//! who knows `(receiver, request_id)` can find the escrow without ever
//! talking to the receiver.
//!
//! ## Construction
//!
//! ```text
//! for bump in 255..=0:
//!     candidate = SHA-256(seed_0 || ... || seed_n || [bump] || program_id || "ProgramDerivedAddress")
//!     if candidate is not a valid Ed25519 point: return (candidate, bump)
//! ```
//!
//! Rejecting on-curve candidates means no secret key can exist for a
//! derived address. Only the program that owns it can move its funds.
//!
//! ## Uniqueness
//!
//! Identical inputs give identical addresses, and SHA-256 makes any change
//! to tag, receiver, or id land somewhere independent. The escrow programs
//! lean on this: if the derived record address is already occupied, the
//! `(receiver, request_id)` pair is taken. There is no separate index.

use thiserror::Error;

use crate::config::{MAX_SEEDS, MAX_SEED_LEN, PDA_MARKER, PROGRAM_ID_CONTEXT};
use crate::crypto::hash::{domain_separated_hash, sha256_multi};
use crate::crypto::keys::Address;

/// Errors from address derivation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DerivationError {
    #[error("too many seeds: {0} (max {max})", max = MAX_SEEDS)]
    TooManySeeds(usize),

    #[error("seed {index} is {len} bytes (max {max})", max = MAX_SEED_LEN)]
    SeedTooLong { index: usize, len: usize },

    /// The candidate for this bump is a curve point and cannot be used.
    #[error("derived address for bump {0} lies on the curve")]
    OnCurve(u8),

    /// Every bump produced an on-curve candidate. Odds are about 2^-256.
    #[error("no viable bump seed")]
    NoViableBump,
}

/// Identifier of a program, derived from its name.
///
/// Program ids namespace derived addresses: the same seeds under two
/// programs give unrelated addresses.
pub fn program_id(name: &str) -> Address {
    Address::new(domain_separated_hash(PROGRAM_ID_CONTEXT, name.as_bytes()))
}

fn check_seeds(seeds: &[&[u8]]) -> Result<(), DerivationError> {
    if seeds.len() > MAX_SEEDS {
        return Err(DerivationError::TooManySeeds(seeds.len()));
    }
    for (index, seed) in seeds.iter().enumerate() {
        if seed.len() > MAX_SEED_LEN {
            return Err(DerivationError::SeedTooLong {
                index,
                len: seed.len(),
            });
        }
    }
    Ok(())
}

/// Compute the address for one specific bump.
///
/// # Errors
///
/// [`DerivationError::OnCurve`] if the candidate is a curve point, plus the
/// seed-shape errors.
pub fn create_program_address(
    seeds: &[&[u8]],
    bump: u8,
    program_id: &Address,
) -> Result<Address, DerivationError> {
    check_seeds(seeds)?;

    let bump_seed = [bump];
    let mut parts: Vec<&[u8]> = Vec::with_capacity(seeds.len() + 3);
    parts.extend_from_slice(seeds);
    parts.push(&bump_seed);
    parts.push(program_id.as_bytes());
    parts.push(PDA_MARKER);

    let candidate = Address::new(sha256_multi(&parts));
    if candidate.is_on_curve() {
        return Err(DerivationError::OnCurve(bump));
    }
    Ok(candidate)
}

/// Find the canonical (highest viable bump) address for `seeds`.
pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &Address,
) -> Result<(Address, u8), DerivationError> {
    check_seeds(seeds)?;
    for bump in (0..=u8::MAX).rev() {
        match create_program_address(seeds, bump, program_id) {
            Ok(address) => return Ok((address, bump)),
            Err(DerivationError::OnCurve(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(DerivationError::NoViableBump)
}

/// Derive a per-request address: seeds are `[tag, receiver, request_id_le]`.
pub fn request_scoped_address(
    tag: &[u8],
    receiver: &Address,
    request_id: u64,
    program_id: &Address,
) -> Result<(Address, u8), DerivationError> {
    find_program_address(
        &[tag, receiver.as_bytes(), &request_id.to_le_bytes()],
        program_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ESCROW_TAG, PAY_REQUEST_TAG, ZK_PAY_REQUEST_TAG};
    use crate::crypto::keys::Keypair;

    #[test]
    fn derivation_is_deterministic() {
        let program = program_id("test-program");
        let receiver = Keypair::generate().address();
        let a = request_scoped_address(PAY_REQUEST_TAG, &receiver, 12345, &program).unwrap();
        let b = request_scoped_address(PAY_REQUEST_TAG, &receiver, 12345, &program).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn every_input_changes_the_address() {
        let program = program_id("test-program");
        let receiver = Keypair::generate().address();
        let (base, _) = request_scoped_address(PAY_REQUEST_TAG, &receiver, 1, &program).unwrap();

        let (other_tag, _) = request_scoped_address(ESCROW_TAG, &receiver, 1, &program).unwrap();
        let (other_variant, _) =
            request_scoped_address(ZK_PAY_REQUEST_TAG, &receiver, 1, &program).unwrap();
        let (other_receiver, _) =
            request_scoped_address(PAY_REQUEST_TAG, &Keypair::generate().address(), 1, &program)
                .unwrap();
        let (other_id, _) = request_scoped_address(PAY_REQUEST_TAG, &receiver, 2, &program).unwrap();
        let (other_program, _) =
            request_scoped_address(PAY_REQUEST_TAG, &receiver, 1, &program_id("other")).unwrap();

        for other in [other_tag, other_variant, other_receiver, other_id, other_program] {
            assert_ne!(base, other);
        }
    }

    #[test]
    fn derived_addresses_are_off_curve() {
        let program = program_id("test-program");
        for id in 0..64u64 {
            let (address, bump) =
                request_scoped_address(ESCROW_TAG, &Address::new([3u8; 32]), id, &program).unwrap();
            assert!(!address.is_on_curve());
            assert_eq!(
                create_program_address(
                    &[ESCROW_TAG, &[3u8; 32], &id.to_le_bytes()],
                    bump,
                    &program
                )
                .unwrap(),
                address
            );
        }
    }

    #[test]
    fn find_skips_on_curve_bumps() {
        // Walk enough seeds that some canonical bump is below 255; every
        // higher bump must then have been rejected as on-curve.
        let program = program_id("test-program");
        let mut saw_skip = false;
        for i in 0..256u32 {
            let seed = i.to_le_bytes();
            let (_, bump) = find_program_address(&[&seed[..]], &program).unwrap();
            if bump < u8::MAX {
                saw_skip = true;
                for higher in bump + 1..=u8::MAX {
                    assert_eq!(
                        create_program_address(&[&seed[..]], higher, &program),
                        Err(DerivationError::OnCurve(higher))
                    );
                }
            }
        }
        assert!(saw_skip, "half of all candidates are on-curve; 256 tries must skip one");
    }

    #[test]
    fn rejects_oversized_seeds() {
        let program = program_id("test-program");
        let long = [0u8; MAX_SEED_LEN + 1];
        assert_eq!(
            find_program_address(&[&b"ok"[..], &long[..]], &program),
            Err(DerivationError::SeedTooLong {
                index: 1,
                len: MAX_SEED_LEN + 1
            })
        );
        let many: Vec<&[u8]> = vec![&b"x"[..]; MAX_SEEDS + 1];
        assert_eq!(
            find_program_address(&many, &program),
            Err(DerivationError::TooManySeeds(MAX_SEEDS + 1))
        );
    }

    #[test]
    fn program_ids_are_stable_and_distinct() {
        assert_eq!(program_id("a"), program_id("a"));
        assert_ne!(program_id("a"), program_id("b"));
    }
}
