//! Program-derived address helpers.
//!
//! The counter is a single global account: its address depends only on a
//! constant seed and the program id, never on the caller's wallet.

use solana_sdk::pubkey::Pubkey;

use crate::errors::{CounterError, TallyResult};

/// A derived address plus the bump seed that took it off the curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedAddress {
    pub address: Pubkey,
    pub bump: u8,
}

/// Derive the counter PDA for `seed` under `program_id`.
///
/// Pure and deterministic. Fails only when no bump yields a valid address.
pub fn derive(seed: &[u8], program_id: &Pubkey) -> TallyResult<DerivedAddress> {
    Pubkey::try_find_program_address(&[seed], program_id)
        .map(|(address, bump)| DerivedAddress { address, bump })
        .ok_or_else(|| CounterError::DerivationExhausted {
            seed: String::from_utf8_lossy(seed).into_owned(),
        })
}

/// Derive a PDA from several seeds under an arbitrary owner program.
///
/// Used for auxiliary accounts that are keyed by the counter address.
pub fn derive_with_seeds(seeds: &[&[u8]], program_id: &Pubkey) -> TallyResult<DerivedAddress> {
    Pubkey::try_find_program_address(seeds, program_id)
        .map(|(address, bump)| DerivedAddress { address, bump })
        .ok_or_else(|| CounterError::DerivationExhausted {
            seed: seeds
                .iter()
                .map(|s| String::from_utf8_lossy(s).into_owned())
                .collect::<Vec<_>>()
                .join("/"),
        })
}
