//! tally-core
//!
//! Client-side synchronization between a UI and the single on-chain counter
//! account of the counter program:
//! - PDA derivation for the global counter account
//! - the `ChainClient` seam over submission and account fetches
//! - the local state mirror and its transitions
//! - `CounterController`, which sequences operations and reconciles state
//!
//! This crate does no network I/O on its own. A concrete `ChainClient` is
//! provided by `tally-solana-client`.

pub mod chain;
pub mod config;
pub mod controller;
pub mod errors;
pub mod pda;
pub mod state;

pub use crate::errors::{ChainError, CounterError, ErrorKind, Step, TallyResult};

/// Convenience re-exports.
pub mod prelude {
    pub use crate::chain::{
        ix, role, ChainClient, CounterAccount, InstructionCall, TransactionResult, WalletSigner,
    };
    pub use crate::config::{validate_config, Commitment, SessionConfig};
    pub use crate::controller::{
        decrement_increments, CounterController, DecrementProgress, Outcome, Phase, SkipReason,
        WRAP_CEILING,
    };
    pub use crate::pda::{derive, DerivedAddress};
    pub use crate::state::{CounterStateStore, LocalCounterState, Observation, Transition};
    pub use crate::{ChainError, CounterError, ErrorKind, Step, TallyResult};
}
