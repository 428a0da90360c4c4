//! Constants shared with the on-chain counter program.
//!
//! Keep these stable: they feed discriminators and PDA derivation.

use solana_sdk::pubkey::Pubkey;

/// Anchor-style discriminator length for instructions and accounts.
pub const DISCRIMINATOR_LEN: usize = 8;

/// Account type name hashed into the counter account discriminator.
pub const COUNTER_ACCOUNT: &str = "Counter";

/// Serialized size of the counter account: discriminator + u64.
pub const COUNTER_ACCOUNT_LEN: usize = DISCRIMINATOR_LEN + 8;

/// Program that takes ownership of delegated accounts.
pub const DELEGATION_PROGRAM_ID: &str = "DELeGGvXpWV2fqJUhqcF5ZSYMS4JTLjteaAMARRSaeSh";

pub fn delegation_program_id() -> Pubkey {
    DELEGATION_PROGRAM_ID.parse().unwrap_or_else(|_| Pubkey::default())
}

/// Buffer PDA seed, derived under the owner program.
pub const SEED_BUFFER: &str = "buffer";

/// Delegation record PDA seed, derived under the delegation program.
pub const SEED_DELEGATION: &str = "delegation";

/// Delegation metadata PDA seed, derived under the delegation program.
pub const SEED_DELEGATION_METADATA: &str = "delegation-metadata";
