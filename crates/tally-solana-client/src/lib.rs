//! tally-solana-client
//!
//! Solana wiring for the tally counter program.
//!
//! It includes:
//! - program constants (delegation program id, auxiliary PDA seeds)
//! - the static instruction/account schema and counter account decoding
//! - `RpcChainClient`, the `ChainClient` used against a real cluster
//!
//! The counter program id comes from `SessionConfig`; nothing here hardcodes
//! which deployment is targeted.

pub mod constants;
pub mod rpc_client;
pub mod schema;

pub use constants::*;
pub use rpc_client::*;
pub use schema::{decode_counter, encode_counter, ProgramInterface, INSTRUCTIONS};
